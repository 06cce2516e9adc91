//! Remote document-store gateway: the consumed interface and its wire forms.
//!
//! Implementations front one task collection per authenticated user. The
//! read path deserializes [`TaskRecord`] documents and normalizes them into
//! [`Task`] values before anything else sees them. The write path carries
//! domain fields only: document ids and the `createdAt`/`updatedAt`/
//! `completedAt` stamps are assigned by the store itself.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::Session;
use crate::task::{Task, TaskDraft, TaskId};
use crate::timestamp::{self, RemoteTimestamp};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied by remote store")]
    PermissionDenied,

    #[error("no document with id {0}")]
    NotFound(String),
}

/// A task document as stored in the remote collection.
///
/// The document id is not part of the document body; the store keys
/// documents externally, so the read path pairs a `TaskRecord` with the id
/// it was stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: Option<RemoteTimestamp>,
    #[serde(default)]
    pub updated_at: Option<RemoteTimestamp>,
    #[serde(default)]
    pub completed_at: Option<RemoteTimestamp>,
}

impl TaskRecord {
    /// Normalize a wire document into the canonical in-memory form.
    ///
    /// Timestamps in either wire shape collapse to UTC instants; absent or
    /// unparseable values (including malformed due dates) become `None`.
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            due_date: self
                .due_date
                .as_deref()
                .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()),
            completed: self.completed,
            created_at: timestamp::normalize(self.created_at.as_ref()),
            updated_at: timestamp::normalize(self.updated_at.as_ref()),
            completed_at: timestamp::normalize(self.completed_at.as_ref()),
        }
    }
}

/// The two write shapes an update can take on the wire.
///
/// In both shapes the store stamps `updatedAt` itself and sets `completedAt`
/// to server-now iff `completed`, clearing it otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskPatch {
    /// Completion-flag flip, as issued by the toggle path. Other fields are
    /// left untouched.
    Completion { completed: bool },
    /// Full rewrite of the editable fields, as issued by the detail-edit
    /// path.
    Full {
        title: String,
        description: String,
        due_date: Option<NaiveDate>,
        completed: bool,
    },
}

impl TaskPatch {
    pub fn completion(completed: bool) -> Self {
        TaskPatch::Completion { completed }
    }

    pub fn full(task: &Task) -> Self {
        TaskPatch::Full {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            completed: task.completed,
        }
    }
}

/// CRUD against one user's task collection.
///
/// Every call is scoped by the session's user id; there is no cross-user
/// visibility. Connectivity and permission failures surface as
/// [`StoreError`]; callers decide whether that is fatal.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch the full collection, in store-returned order.
    async fn list_tasks(&self, session: &Session) -> Result<Vec<Task>, StoreError>;

    /// Fetch a single task by id; `None` if no such document.
    async fn get_task(&self, session: &Session, id: &TaskId)
    -> Result<Option<Task>, StoreError>;

    /// Create a document from the draft. The store assigns the id and the
    /// `createdAt`/`updatedAt` stamps; the returned task carries them.
    async fn create_task(&self, session: &Session, draft: &TaskDraft)
    -> Result<Task, StoreError>;

    /// Apply a patch to the document with the given id.
    async fn update_task(
        &self,
        session: &Session,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<(), StoreError>;

    /// Delete the document with the given id. Deleting an id that does not
    /// exist is not an error.
    async fn delete_task(&self, session: &Session, id: &TaskId) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_record_decodes_mixed_timestamp_forms() {
        let doc = r#"{
            "title": "Water the plants",
            "description": "",
            "dueDate": "2024-05-10",
            "completed": true,
            "createdAt": {"seconds": 1700000000, "nanos": 0},
            "updatedAt": "2024-03-01T09:00:00Z",
            "completedAt": null
        }"#;
        let record: TaskRecord = serde_json::from_str(doc).unwrap();
        let task = record.into_task(TaskId::from("abc123"));

        assert_eq!(task.title, "Water the plants");
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 5, 10));
        assert!(task.completed);
        assert_eq!(
            task.created_at,
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
        assert_eq!(
            task.updated_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
        );
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn test_record_tolerates_missing_fields() {
        let record: TaskRecord = serde_json::from_str(r#"{"title": "Bare"}"#).unwrap();
        let task = record.into_task(TaskId::from("x"));

        assert_eq!(task.description, "");
        assert_eq!(task.due_date, None);
        assert!(!task.completed);
        assert_eq!(task.created_at, None);
    }

    #[test]
    fn test_malformed_due_date_is_none() {
        let record: TaskRecord =
            serde_json::from_str(r#"{"title": "Bad date", "dueDate": "next tuesday"}"#).unwrap();
        assert_eq!(record.into_task(TaskId::from("x")).due_date, None);
    }
}
