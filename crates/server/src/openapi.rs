use chrono::{DateTime, Utc};
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ErrorDoc { pub error: String, pub message: String }

#[derive(utoipa::ToSchema)]
pub struct RegisterRequest { pub name: String, pub email: String, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct UserDoc { pub id: Uuid, pub email: String, pub name: String, pub created_at: DateTime<Utc> }

#[derive(utoipa::ToSchema)]
pub struct SessionDoc { pub id: Uuid, pub token: String, pub expires_at: DateTime<Utc> }

#[derive(utoipa::ToSchema)]
pub struct LoginDoc { pub user: UserDoc, pub session: SessionDoc }

#[derive(utoipa::ToSchema)]
pub struct TaskDoc {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: String,
    /// `Pending` or `Approved`
    pub status: String,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(utoipa::ToSchema)]
pub struct CreateTaskDoc {
    pub title: Option<String>,
    pub description: String,
    pub status: Option<String>,
}

#[derive(utoipa::ToSchema)]
pub struct UpdateTaskDoc {
    pub title: Option<String>,
    pub description: String,
    pub status: Option<String>,
    /// Rejects the update with 409 when the stored revision differs
    pub expected_revision: Option<i32>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::tasks::list,
        crate::routes::tasks::create,
        crate::routes::tasks::get,
        crate::routes::tasks::update,
        crate::routes::tasks::delete,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorDoc,
            RegisterRequest,
            LoginRequest,
            UserDoc,
            SessionDoc,
            LoginDoc,
            TaskDoc,
            CreateTaskDoc,
            UpdateTaskDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "tasks")
    )
)]
pub struct ApiDoc;
