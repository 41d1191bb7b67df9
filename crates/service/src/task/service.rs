use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{NewTask, Task, TaskFields, TaskUpdate};
use super::repository::TaskRepository;
use crate::auth::SessionContext;
use crate::errors::ServiceError;

/// Attempts for an unconditional update racing other writers.
const MAX_REPLACE_ATTEMPTS: usize = 3;

/// Task business service. Every call is scoped to the caller's session.
pub struct TaskService<R: TaskRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: TaskRepository + ?Sized> TaskService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// All tasks of the caller, oldest first.
    ///
    /// # Examples
    /// ```
    /// use service::task::{TaskService, NewTask, repository::mock::MockTaskRepository};
    /// use service::auth::SessionContext;
    /// use std::sync::Arc;
    /// let svc = TaskService::new(Arc::new(MockTaskRepository::default()));
    /// let ctx = SessionContext { user_id: uuid::Uuid::new_v4(), session_id: uuid::Uuid::new_v4() };
    /// let input = NewTask { title: None, description: Some("Buy milk".into()), status: None };
    /// tokio_test::block_on(svc.create(&ctx, input)).unwrap();
    /// let tasks = tokio_test::block_on(svc.list(&ctx)).unwrap();
    /// assert_eq!(tasks[0].display_title(), "Untitled");
    /// ```
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn list(&self, ctx: &SessionContext) -> Result<Vec<Task>, ServiceError> {
        self.repo.list(ctx.user_id).await
    }

    #[instrument(skip(self, ctx, input), fields(user_id = %ctx.user_id))]
    pub async fn create(&self, ctx: &SessionContext, input: NewTask) -> Result<Task, ServiceError> {
        let fields = TaskFields::try_from(&input)?;
        let task = self.repo.insert(ctx.user_id, fields).await?;
        info!(task_id = %task.id, status = %task.status, "task_created");
        Ok(task)
    }

    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id, task_id = %id))]
    pub async fn get(&self, ctx: &SessionContext, id: Uuid) -> Result<Task, ServiceError> {
        self.repo
            .find(ctx.user_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("task"))
    }

    /// Replace title, description and status of a task.
    ///
    /// With `expected_revision` set, a stale revision fails with `Conflict`
    /// and the stored task is left untouched. Without it the last writer wins.
    #[instrument(skip(self, ctx, input), fields(user_id = %ctx.user_id, task_id = %id))]
    pub async fn update(&self, ctx: &SessionContext, id: Uuid, input: TaskUpdate) -> Result<Task, ServiceError> {
        let current = self.get(ctx, id).await?;
        let fields = TaskFields::try_from(&input)?;

        if let Some(expected) = input.expected_revision {
            if expected != current.revision {
                return Err(stale(expected, current.revision));
            }
            return match self.repo.replace(ctx.user_id, id, expected, fields).await? {
                Some(task) => Ok(logged_update(task)),
                None => Err(self.explain_miss(ctx, id, expected).await),
            };
        }

        let mut revision = current.revision;
        let mut attempts = 0;
        loop {
            if let Some(task) = self.repo.replace(ctx.user_id, id, revision, fields.clone()).await? {
                return Ok(logged_update(task));
            }
            attempts += 1;
            let latest = self
                .repo
                .find(ctx.user_id, id)
                .await?
                .ok_or_else(|| ServiceError::not_found("task"))?;
            if attempts >= MAX_REPLACE_ATTEMPTS {
                return Err(stale(revision, latest.revision));
            }
            debug!(from = revision, to = latest.revision, attempt = attempts, "task_update_retry");
            revision = latest.revision;
        }
    }

    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id, task_id = %id))]
    pub async fn delete(&self, ctx: &SessionContext, id: Uuid) -> Result<(), ServiceError> {
        if !self.repo.delete(ctx.user_id, id).await? {
            return Err(ServiceError::not_found("task"));
        }
        info!("task_deleted");
        Ok(())
    }

    async fn explain_miss(&self, ctx: &SessionContext, id: Uuid, expected: i32) -> ServiceError {
        match self.repo.find(ctx.user_id, id).await {
            Ok(Some(t)) => stale(expected, t.revision),
            Ok(None) => ServiceError::not_found("task"),
            Err(e) => e,
        }
    }
}

fn stale(expected: i32, actual: i32) -> ServiceError {
    ServiceError::Conflict(format!("task was modified (expected revision {expected}, found {actual})"))
}

fn logged_update(task: Task) -> Task {
    info!(task_id = %task.id, revision = task.revision, status = %task.status, "task_updated");
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::task::domain::TaskStatus;
    use crate::task::repository::mock::MockTaskRepository;

    fn ctx() -> SessionContext {
        SessionContext { user_id: Uuid::new_v4(), session_id: Uuid::new_v4() }
    }

    fn svc() -> (Arc<MockTaskRepository>, TaskService<MockTaskRepository>) {
        let repo = Arc::new(MockTaskRepository::default());
        (repo.clone(), TaskService::new(repo))
    }

    fn new_task(title: Option<&str>, description: &str) -> NewTask {
        NewTask { title: title.map(Into::into), description: Some(description.into()), status: None }
    }

    #[tokio::test]
    async fn buy_milk_lifecycle() {
        let (_, svc) = svc();
        let me = ctx();

        let created = svc.create(&me, new_task(None, "Buy milk")).await.unwrap();
        let tasks = svc.list(&me).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].display_title(), "Untitled");
        assert_eq!(tasks[0].description, "Buy milk");
        assert_eq!(tasks[0].status, TaskStatus::Pending);

        let update = TaskUpdate {
            title: None,
            description: Some("Buy milk".into()),
            status: Some("Approved".into()),
            expected_revision: None,
        };
        svc.update(&me, created.id, update).await.unwrap();
        let tasks = svc.list(&me).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Approved);
        assert_eq!(tasks[0].revision, 2);

        svc.delete(&me, created.id).await.unwrap();
        assert!(svc.list(&me).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let (_, svc) = svc();
        let me = ctx();
        for d in ["one", "two", "three"] {
            svc.create(&me, new_task(Some(d), d)).await.unwrap();
        }
        let names: Vec<_> = svc.list(&me).await.unwrap().into_iter().map(|t| t.description).collect();
        assert_eq!(names, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn create_without_description_is_rejected() {
        let (repo, svc) = svc();
        let err = svc.create(&ctx(), NewTask { title: Some("t".into()), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn invalid_status_is_rejected() {
        let (repo, svc) = svc();
        let input = NewTask { status: Some("Archived".into()), ..new_task(None, "d") };
        assert!(matches!(svc.create(&ctx(), input).await, Err(ServiceError::Validation(_))));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id_are_not_found() {
        let (_, svc) = svc();
        let me = ctx();
        let id = Uuid::new_v4();
        let update = TaskUpdate { description: Some("d".into()), ..Default::default() };
        assert!(matches!(svc.update(&me, id, update).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(&me, id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_is_full_replacement() {
        let (_, svc) = svc();
        let me = ctx();
        let input = NewTask { title: Some("Groceries".into()), description: Some("milk".into()), status: Some("approved".into()) };
        let t = svc.create(&me, input).await.unwrap();
        assert_eq!(t.status, TaskStatus::Approved);

        let updated = svc
            .update(&me, t.id, TaskUpdate { description: Some("bread".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.title, None);
        assert_eq!(updated.status, TaskStatus::Pending);
        assert_eq!(updated.description, "bread");
        assert_eq!(updated.created_at, t.created_at);
    }

    #[tokio::test]
    async fn update_without_description_leaves_task_unchanged() {
        let (_, svc) = svc();
        let me = ctx();
        let t = svc.create(&me, new_task(Some("keep"), "keep")).await.unwrap();
        let err = svc.update(&me, t.id, TaskUpdate::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.get(&me, t.id).await.unwrap(), t);
    }

    #[tokio::test]
    async fn stale_revision_conflicts() {
        let (_, svc) = svc();
        let me = ctx();
        let t = svc.create(&me, new_task(None, "v1")).await.unwrap();

        let ok = TaskUpdate { description: Some("v2".into()), expected_revision: Some(1), ..Default::default() };
        assert_eq!(svc.update(&me, t.id, ok).await.unwrap().revision, 2);

        let stale = TaskUpdate { description: Some("v3".into()), expected_revision: Some(1), ..Default::default() };
        assert!(matches!(svc.update(&me, t.id, stale).await, Err(ServiceError::Conflict(_))));
        assert_eq!(svc.get(&me, t.id).await.unwrap().description, "v2");
    }

    /// Lets another writer bump the task right before each of our next `n` replaces.
    struct RacingRepository {
        inner: MockTaskRepository,
        interleaved_writes: AtomicUsize,
    }

    impl RacingRepository {
        fn new(interleaved_writes: usize) -> Self {
            Self { inner: MockTaskRepository::default(), interleaved_writes: AtomicUsize::new(interleaved_writes) }
        }
    }

    #[async_trait]
    impl TaskRepository for RacingRepository {
        async fn list(&self, owner_id: Uuid) -> Result<Vec<Task>, ServiceError> {
            self.inner.list(owner_id).await
        }

        async fn insert(&self, owner_id: Uuid, fields: TaskFields) -> Result<Task, ServiceError> {
            self.inner.insert(owner_id, fields).await
        }

        async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Task>, ServiceError> {
            self.inner.find(owner_id, id).await
        }

        async fn replace(&self, owner_id: Uuid, id: Uuid, expected_revision: i32, fields: TaskFields) -> Result<Option<Task>, ServiceError> {
            let pending = self.interleaved_writes.load(Ordering::SeqCst);
            if pending > 0 {
                self.interleaved_writes.store(pending - 1, Ordering::SeqCst);
                let theirs = TaskFields { title: Some("theirs".into()), description: "theirs".into(), status: TaskStatus::Approved };
                self.inner.replace(owner_id, id, expected_revision, theirs).await?;
            }
            self.inner.replace(owner_id, id, expected_revision, fields).await
        }

        async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
            self.inner.delete(owner_id, id).await
        }
    }

    #[tokio::test]
    async fn update_retries_after_concurrent_write() {
        let svc = TaskService::new(Arc::new(RacingRepository::new(1)));
        let me = ctx();
        let t = svc.create(&me, new_task(None, "v1")).await.unwrap();

        let update = TaskUpdate { description: Some("mine".into()), ..Default::default() };
        let updated = svc.update(&me, t.id, update).await.unwrap();
        assert_eq!(updated.revision, 3);
        assert_eq!(updated.description, "mine");
        assert_eq!(updated.title, None);
        assert_eq!(updated.status, TaskStatus::Pending);
        assert_eq!(svc.get(&me, t.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_gives_up_reporting_revision_read() {
        let svc = TaskService::new(Arc::new(RacingRepository::new(usize::MAX)));
        let me = ctx();
        let t = svc.create(&me, new_task(None, "v1")).await.unwrap();

        let update = TaskUpdate { description: Some("mine".into()), ..Default::default() };
        let err = svc.update(&me, t.id, update).await.unwrap_err();
        // three interleaved writes: 1 -> 2 -> 3 -> 4; last attempt expected 3
        match err {
            ServiceError::Conflict(msg) => {
                assert!(msg.contains("expected revision 3"), "{msg}");
                assert!(msg.contains("found 4"), "{msg}");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        let stored = svc.get(&me, t.id).await.unwrap();
        assert_eq!(stored.revision, 4);
        assert_eq!(stored.description, "theirs");
    }

    #[tokio::test]
    async fn other_owners_cannot_see_or_touch_tasks() {
        let (repo, svc) = svc();
        let alice = ctx();
        let bob = ctx();
        let t = svc.create(&alice, new_task(None, "private")).await.unwrap();

        assert!(svc.list(&bob).await.unwrap().is_empty());
        assert!(matches!(svc.get(&bob, t.id).await, Err(ServiceError::NotFound(_))));
        let update = TaskUpdate { description: Some("hijack".into()), ..Default::default() };
        assert!(matches!(svc.update(&bob, t.id, update).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(&bob, t.id).await, Err(ServiceError::NotFound(_))));
        assert_eq!(repo.len(), 1);
        assert_eq!(svc.get(&alice, t.id).await.unwrap().description, "private");
    }
}
