use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use service::auth::SessionContext;
use service::task::{NewTask, Task, TaskStatus, TaskUpdate};

use super::auth::ServerState;
use crate::errors::JsonApiError;

/// Wire shape of a task. `title` is null when the task is untitled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: String,
    pub status: TaskStatus,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskView {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            status: t.status,
            revision: t.revision,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[utoipa::path(get, path = "/api/tasks", tag = "tasks", responses((status = 200, description = "Tasks of the caller, oldest first", body = [crate::openapi::TaskDoc]), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorDoc)))]
pub async fn list(State(state): State<ServerState>, Extension(ctx): Extension<SessionContext>) -> Result<Json<Vec<TaskView>>, JsonApiError> {
    let tasks = state.tasks.list(&ctx).await?;
    info!(count = tasks.len(), "list tasks");
    Ok(Json(tasks.into_iter().map(TaskView::from).collect()))
}

#[utoipa::path(post, path = "/api/tasks", tag = "tasks", request_body = crate::openapi::CreateTaskDoc, responses((status = 200, description = "Created", body = crate::openapi::TaskDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorDoc)))]
pub async fn create(State(state): State<ServerState>, Extension(ctx): Extension<SessionContext>, WithRejection(Json(input), _): WithRejection<Json<NewTask>, JsonApiError>) -> Result<Json<TaskView>, JsonApiError> {
    let task = state.tasks.create(&ctx, input).await?;
    Ok(Json(task.into()))
}

#[utoipa::path(get, path = "/api/tasks/{id}", tag = "tasks", params(("id" = Uuid, Path, description = "Task id")), responses((status = 200, description = "Task", body = crate::openapi::TaskDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc), (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)))]
pub async fn get(State(state): State<ServerState>, Extension(ctx): Extension<SessionContext>, WithRejection(Path(id), _): WithRejection<Path<Uuid>, JsonApiError>) -> Result<Json<TaskView>, JsonApiError> {
    let task = state.tasks.get(&ctx, id).await?;
    Ok(Json(task.into()))
}

#[utoipa::path(put, path = "/api/tasks/{id}", tag = "tasks", params(("id" = Uuid, Path, description = "Task id")), request_body = crate::openapi::UpdateTaskDoc, responses((status = 200, description = "Updated", body = crate::openapi::TaskDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc), (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc), (status = 409, description = "Revision conflict", body = crate::openapi::ErrorDoc)))]
pub async fn update(State(state): State<ServerState>, Extension(ctx): Extension<SessionContext>, WithRejection(Path(id), _): WithRejection<Path<Uuid>, JsonApiError>, WithRejection(Json(input), _): WithRejection<Json<TaskUpdate>, JsonApiError>) -> Result<Json<TaskView>, JsonApiError> {
    let task = state.tasks.update(&ctx, id, input).await?;
    Ok(Json(task.into()))
}

#[utoipa::path(delete, path = "/api/tasks/{id}", tag = "tasks", params(("id" = Uuid, Path, description = "Task id")), responses((status = 204, description = "Deleted"), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc), (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)))]
pub async fn delete(State(state): State<ServerState>, Extension(ctx): Extension<SessionContext>, WithRejection(Path(id), _): WithRejection<Path<Uuid>, JsonApiError>) -> Result<StatusCode, JsonApiError> {
    state.tasks.delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
