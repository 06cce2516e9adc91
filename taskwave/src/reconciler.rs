//! Optimistic task state reconciler.
//!
//! The reconciler owns the ordered in-memory task list that views render.
//! Local mutations apply synchronously; the matching remote writes are
//! dispatched to the store in the background and never awaited, so the
//! caller observes every change before any network round trip completes.
//! A failed background write is logged and reported on the sync broadcast
//! but never rolled back, so the list and the store may diverge until the
//! next full [`load`](TaskReconciler::load), which is the only
//! reconciliation step. The detail-edit path ([`update`](TaskReconciler::update))
//! is the exception: it awaits the store and surfaces failure to the caller.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::auth::Session;
use crate::store::{StoreError, TaskPatch, TaskStore};
use crate::task::{Task, TaskDraft, TaskFilter, TaskId};

#[derive(Error, Debug)]
pub enum TaskError {
    /// No active session. Nothing was mutated and no network call was made.
    #[error("no active session")]
    NoSession,

    /// Title was empty after trimming. Rejected before any network call.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// No record with the given id in the in-memory list.
    #[error("no task with id {0}")]
    UnknownTask(TaskId),

    #[error("failed to load tasks: {0}")]
    Load(#[source] StoreError),

    #[error("failed to save task: {0}")]
    Update(#[source] StoreError),
}

/// Which remote write a [`SyncReport`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
    Delete,
}

/// Terminal outcome of one background write leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Committed,
    Failed,
}

/// Emitted on the sync broadcast when a background write finishes.
///
/// Reports carry the locally-known task id. They exist for observability
/// only: a `Failed` report drives no retry and no rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub kind: WriteKind,
    pub id: TaskId,
    pub outcome: SyncOutcome,
}

/// Single source of truth for what the current view renders.
///
/// The list is only ever mutated through `&mut self`, so all mutation
/// happens on one logical thread; background writes get their own clones
/// and never touch it. Overlapping background writes to the same task can
/// commit to the store in either order: last network write wins.
pub struct TaskReconciler {
    store: Arc<dyn TaskStore>,
    session: Option<Session>,
    tasks: Vec<Task>,
    sync_tx: broadcast::Sender<SyncReport>,
}

impl TaskReconciler {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self::with_sync_capacity(store, 256)
    }

    pub fn with_sync_capacity(store: Arc<dyn TaskStore>, capacity: usize) -> Self {
        let (sync_tx, _) = broadcast::channel(capacity);
        TaskReconciler {
            store,
            session: None,
            tasks: Vec::new(),
            sync_tx,
        }
    }

    /// Install the session all store calls will be scoped by.
    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Drop the session and the in-memory list. Tasks belong to exactly one
    /// user's private collection; nothing may survive a sign-out.
    pub fn clear_session(&mut self) {
        self.session = None;
        self.tasks.clear();
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The current in-memory list, newest first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Subscribe to background write outcomes.
    pub fn sync_rx(&self) -> broadcast::Receiver<SyncReport> {
        self.sync_tx.subscribe()
    }

    /// Fetch the full collection and replace the in-memory list with it,
    /// sorted by creation time descending (ties keep store-returned order;
    /// records without a creation time sort last). On failure the prior
    /// list is left untouched.
    pub async fn load(&mut self) -> Result<&[Task], TaskError> {
        let session = self.session.clone().ok_or(TaskError::NoSession)?;
        let mut fetched = self
            .store
            .list_tasks(&session)
            .await
            .map_err(TaskError::Load)?;
        fetched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.tasks = fetched;
        Ok(&self.tasks)
    }

    /// Create a task optimistically.
    ///
    /// The record materializes at the head of the list with a temporary id
    /// and current-time stamps, and is returned immediately; the remote
    /// create runs in the background carrying server-assigned stamps. The
    /// temporary id is never rewritten to the server-assigned one; the
    /// two stay distinct until the next [`load`](TaskReconciler::load).
    pub fn create(&mut self, draft: TaskDraft) -> Result<Task, TaskError> {
        let session = self.session.clone().ok_or(TaskError::NoSession)?;
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }

        let draft = TaskDraft {
            title: title.to_string(),
            description: draft.description,
            due_date: draft.due_date,
        };
        let now = Utc::now();
        let task = Task {
            id: TaskId::temporary(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            due_date: draft.due_date,
            completed: false,
            created_at: Some(now),
            updated_at: Some(now),
            completed_at: None,
        };
        self.tasks.insert(0, task.clone());

        let store = Arc::clone(&self.store);
        let local_id = task.id.clone();
        self.dispatch(WriteKind::Create, task.id.clone(), async move {
            let created = store.create_task(&session, &draft).await?;
            log::debug!("task {local_id} committed to the store under id {}", created.id);
            Ok(())
        });

        Ok(task)
    }

    /// Flip the completion flag on the matching record and return the new
    /// value. `completed_at` is set to now iff the task is now completed.
    /// The remote update runs in the background.
    pub fn toggle(&mut self, id: &TaskId) -> Result<bool, TaskError> {
        let session = self.session.clone().ok_or(TaskError::NoSession)?;
        let task = self
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| TaskError::UnknownTask(id.clone()))?;

        task.completed = !task.completed;
        let completed = task.completed;
        task.completed_at = completed.then(Utc::now);

        let store = Arc::clone(&self.store);
        let id = id.clone();
        let write_id = id.clone();
        self.dispatch(WriteKind::Update, id, async move {
            store
                .update_task(&session, &write_id, &TaskPatch::completion(completed))
                .await
        });

        Ok(completed)
    }

    /// Save a full edit of a task, awaiting the store.
    ///
    /// Unlike the fire-and-forget paths this propagates failure: on
    /// [`TaskError::Update`] nothing local has changed and the caller
    /// should stay on the edit screen. On success the local record (if
    /// present) is refreshed to match what was written.
    pub async fn update(&mut self, mut task: Task) -> Result<(), TaskError> {
        let session = self.session.clone().ok_or(TaskError::NoSession)?;
        let title = task.title.trim();
        if title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        task.title = title.to_string();

        let patch = TaskPatch::full(&task);
        self.store
            .update_task(&session, &task.id, &patch)
            .await
            .map_err(TaskError::Update)?;

        if let Some(local) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            let now = Utc::now();
            local.title = task.title;
            local.description = task.description;
            local.due_date = task.due_date;
            local.completed = task.completed;
            local.completed_at = task.completed.then_some(now);
            local.updated_at = Some(now);
        }
        Ok(())
    }

    /// Remove the record from the in-memory list and issue the remote
    /// delete in the background. The remote delete is issued whether or not
    /// a local record matched, so a task known only to the store still gets
    /// deleted.
    pub fn delete(&mut self, id: &TaskId) -> Result<(), TaskError> {
        let session = self.session.clone().ok_or(TaskError::NoSession)?;
        self.tasks.retain(|t| &t.id != id);

        let store = Arc::clone(&self.store);
        let id = id.clone();
        let write_id = id.clone();
        self.dispatch(WriteKind::Delete, id, async move {
            store.delete_task(&session, &write_id).await
        });

        Ok(())
    }

    /// Read-through lookup of a single task, for the detail view. Does not
    /// touch the in-memory list.
    pub async fn fetch(&self, id: &TaskId) -> Result<Option<Task>, TaskError> {
        let session = self.session.clone().ok_or(TaskError::NoSession)?;
        self.store
            .get_task(&session, id)
            .await
            .map_err(TaskError::Load)
    }

    /// Pure partition of the current list. No network involvement.
    pub fn filter(&self, filter: TaskFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Run a remote write in the background and report its outcome.
    ///
    /// Failures are terminal: logged, broadcast, and otherwise swallowed.
    fn dispatch<F>(&self, kind: WriteKind, id: TaskId, write: F)
    where
        F: Future<Output = Result<(), StoreError>> + Send + 'static,
    {
        let sync_tx = self.sync_tx.clone();
        tokio::spawn(async move {
            let outcome = match write.await {
                Ok(()) => SyncOutcome::Committed,
                Err(e) => {
                    log::error!("background {kind:?} write for task {id} failed: {e}");
                    SyncOutcome::Failed
                }
            };
            let _ = sync_tx.send(SyncReport { kind, id, outcome });
        });
    }
}
