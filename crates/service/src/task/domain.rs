use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use models::task::TaskStatus;

use crate::errors::ServiceError;

/// Task as seen by the business layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub description: String,
    pub status: TaskStatus,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(models::task::UNTITLED)
    }
}

impl From<models::task::Model> for Task {
    fn from(m: models::task::Model) -> Self {
        Self {
            id: m.id,
            owner_id: m.owner_id,
            title: m.title,
            description: m.description,
            status: m.status,
            revision: m.revision,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

/// Create input. `status` is the raw wire string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Full-replacement update input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub expected_revision: Option<i32>,
}

/// Validated mutable fields, ready for the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFields {
    pub title: Option<String>,
    pub description: String,
    pub status: TaskStatus,
}

impl TaskFields {
    pub fn parse(title: Option<&str>, description: Option<&str>, status: Option<&str>) -> Result<Self, ServiceError> {
        let title = models::task::normalize_title(title)?;
        let description = models::task::validate_description(description)?.to_string();
        let status = match status {
            Some(s) => s.parse::<TaskStatus>()?,
            None => TaskStatus::default(),
        };
        Ok(Self { title, description, status })
    }
}

impl TryFrom<&NewTask> for TaskFields {
    type Error = ServiceError;

    fn try_from(t: &NewTask) -> Result<Self, Self::Error> {
        TaskFields::parse(t.title.as_deref(), t.description.as_deref(), t.status.as_deref())
    }
}

impl TryFrom<&TaskUpdate> for TaskFields {
    type Error = ServiceError;

    fn try_from(t: &TaskUpdate) -> Result<Self, Self::Error> {
        TaskFields::parse(t.title.as_deref(), t.description.as_deref(), t.status.as_deref())
    }
}
