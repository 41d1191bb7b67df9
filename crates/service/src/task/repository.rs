use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{Task, TaskFields};
use crate::errors::ServiceError;

/// Owner-scoped task persistence. Rows of other owners are invisible.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insertion order.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Task>, ServiceError>;
    async fn insert(&self, owner_id: Uuid, fields: TaskFields) -> Result<Task, ServiceError>;
    async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Task>, ServiceError>;
    /// Overwrites the task if its stored revision equals `expected_revision`.
    /// `None` means nothing matched (missing row or stale revision).
    async fn replace(&self, owner_id: Uuid, id: Uuid, expected_revision: i32, fields: TaskFields) -> Result<Option<Task>, ServiceError>;
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, ServiceError>;
}

/// In-memory repository for tests and DB-less runs.
pub mod mock {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockTaskRepository {
        tasks: Mutex<Vec<Task>>,
    }

    impl MockTaskRepository {
        pub fn len(&self) -> usize {
            self.tasks.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl TaskRepository for MockTaskRepository {
        async fn list(&self, owner_id: Uuid) -> Result<Vec<Task>, ServiceError> {
            let tasks = self.tasks.lock().unwrap();
            Ok(tasks.iter().filter(|t| t.owner_id == owner_id).cloned().collect())
        }

        async fn insert(&self, owner_id: Uuid, fields: TaskFields) -> Result<Task, ServiceError> {
            let mut tasks = self.tasks.lock().unwrap();
            // keep created_at strictly increasing so ordering matches the vec
            let mut now = Utc::now();
            if let Some(last) = tasks.last() {
                if now <= last.created_at {
                    now = last.created_at + Duration::microseconds(1);
                }
            }
            let task = Task {
                id: Uuid::new_v4(),
                owner_id,
                title: fields.title,
                description: fields.description,
                status: fields.status,
                revision: 1,
                created_at: now,
                updated_at: now,
            };
            tasks.push(task.clone());
            Ok(task)
        }

        async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Task>, ServiceError> {
            let tasks = self.tasks.lock().unwrap();
            Ok(tasks.iter().find(|t| t.id == id && t.owner_id == owner_id).cloned())
        }

        async fn replace(&self, owner_id: Uuid, id: Uuid, expected_revision: i32, fields: TaskFields) -> Result<Option<Task>, ServiceError> {
            let mut tasks = self.tasks.lock().unwrap();
            let Some(t) = tasks
                .iter_mut()
                .find(|t| t.id == id && t.owner_id == owner_id && t.revision == expected_revision)
            else {
                return Ok(None);
            };
            t.title = fields.title;
            t.description = fields.description;
            t.status = fields.status;
            t.revision += 1;
            t.updated_at = Utc::now();
            Ok(Some(t.clone()))
        }

        async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
            let mut tasks = self.tasks.lock().unwrap();
            let before = tasks.len();
            tasks.retain(|t| !(t.id == id && t.owner_id == owner_id));
            Ok(tasks.len() != before)
        }
    }
}
