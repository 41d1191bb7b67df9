use std::fmt;
use std::str::FromStr;

use tracing::debug;
use uuid::Uuid;

use crate::api::TaskClient;
use crate::error::{ClientError, ClientResult};
use crate::types::{NewTask, Task, TaskStatus, TaskUpdate};

/// Which tasks the board shows. Applied locally; the server never filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
}

impl StatusFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => task.status == TaskStatus::Pending,
            StatusFilter::Approved => task.status == TaskStatus::Approved,
        }
    }

    /// Keeps snapshot order.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusFilter::All => "All",
            StatusFilter::Pending => "Pending",
            StatusFilter::Approved => "Approved",
        })
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "approved" => Ok(StatusFilter::Approved),
            other => Err(format!("unknown filter '{other}'")),
        }
    }
}

/// The task view of a logged-in user.
///
/// Holds the last fetched list. Every successful mutation is followed by a
/// full reload, so the snapshot always reflects the server; a failed
/// mutation leaves the snapshot as it was.
pub struct TaskBoard {
    client: TaskClient,
    snapshot: Vec<Task>,
    filter: StatusFilter,
}

impl TaskBoard {
    pub fn new(client: TaskClient) -> Self {
        Self { client, snapshot: Vec::new(), filter: StatusFilter::All }
    }

    /// Builds a board and loads the first snapshot.
    pub async fn open(client: TaskClient) -> ClientResult<Self> {
        let mut board = Self::new(client);
        board.reload().await?;
        Ok(board)
    }

    pub fn client(&self) -> &TaskClient {
        &self.client
    }

    pub async fn reload(&mut self) -> ClientResult<()> {
        self.snapshot = self.client.list_tasks().await?;
        debug!(count = self.snapshot.len(), "board reloaded");
        Ok(())
    }

    pub async fn add(&mut self, input: NewTask) -> ClientResult<()> {
        self.client.create_task(&input).await?;
        self.reload().await
    }

    pub async fn edit(&mut self, id: Uuid, input: TaskUpdate) -> ClientResult<()> {
        self.client.update_task(id, &input).await?;
        self.reload().await
    }

    /// Flips a task between Pending and Approved, guarded by its revision.
    /// An id missing from the snapshot fails with `ClientError::UnknownTask`.
    pub async fn toggle(&mut self, id: Uuid) -> ClientResult<()> {
        let Some(task) = self.find(id) else {
            return Err(ClientError::UnknownTask(id));
        };
        let mut update = TaskUpdate::from_task(task);
        update.status = Some(match task.status {
            TaskStatus::Pending => TaskStatus::Approved,
            TaskStatus::Approved => TaskStatus::Pending,
        });
        self.edit(id, update).await
    }

    pub async fn remove(&mut self, id: Uuid) -> ClientResult<()> {
        self.client.delete_task(id).await?;
        self.reload().await
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    /// Whole snapshot, unfiltered.
    pub fn tasks(&self) -> &[Task] {
        &self.snapshot
    }

    pub fn visible(&self) -> Vec<&Task> {
        self.filter.apply(&self.snapshot)
    }

    pub fn find(&self, id: Uuid) -> Option<&Task> {
        self.snapshot.iter().find(|t| t.id == id)
    }
}
