use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::task::domain::{Task, TaskFields};
use crate::task::repository::TaskRepository;

pub struct SeaOrmTaskRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmTaskRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait::async_trait]
impl TaskRepository for SeaOrmTaskRepository {
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Task>, ServiceError> {
        let rows = models::task::list_by_owner(&self.db, owner_id).await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn insert(&self, owner_id: Uuid, fields: TaskFields) -> Result<Task, ServiceError> {
        let m = models::task::create(&self.db, owner_id, fields.title, &fields.description, fields.status).await?;
        Ok(m.into())
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Task>, ServiceError> {
        Ok(models::task::find_owned(&self.db, owner_id, id).await?.map(Task::from))
    }

    async fn replace(&self, owner_id: Uuid, id: Uuid, expected_revision: i32, fields: TaskFields) -> Result<Option<Task>, ServiceError> {
        let changed = models::task::replace_if_revision(
            &self.db,
            owner_id,
            id,
            expected_revision,
            fields.title,
            &fields.description,
            fields.status,
        )
        .await?;
        if changed == 0 {
            return Ok(None);
        }
        self.find(owner_id, id).await
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        Ok(models::task::delete_owned(&self.db, owner_id, id).await?)
    }
}
