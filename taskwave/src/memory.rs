//! In-memory gateway implementations.
//!
//! [`MemoryStore`] and [`MemoryAuth`] stand in for the remote providers in
//! tests and the demo binary. The store keeps real JSON documents per user
//! so the wire layer ([`TaskRecord`] round trips, timestamp forms) is
//! exercised, stamps server timestamps in the native form, and can simulate
//! connectivity loss via [`MemoryStore::set_online`].

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AuthError, AuthGateway, Session, UserId};
use crate::store::{StoreError, TaskPatch, TaskRecord, TaskStore};
use crate::task::{Task, TaskDraft, TaskId};
use crate::timestamp::RemoteTimestamp;

#[derive(Default)]
pub struct MemoryStore {
    // Vec keeps insertion order, which is the store-returned order the load
    // path falls back to for equal creation times.
    collections: RwLock<HashMap<UserId, Vec<(TaskId, serde_json::Value)>>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate connectivity. While offline every call fails with
    /// [`StoreError::Unavailable`].
    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    /// Snapshot of a user's documents, decoded. Test inspection helper.
    pub fn documents(&self, user: &UserId) -> Vec<(TaskId, TaskRecord)> {
        self.collections
            .read()
            .unwrap()
            .get(user)
            .map(|docs| {
                docs.iter()
                    .filter_map(|(id, doc)| {
                        serde_json::from_value(doc.clone())
                            .ok()
                            .map(|record| (id.clone(), record))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Insert a document directly, bypassing the gateway write path. Lets
    /// tests seed ISO-form timestamps and other legacy shapes.
    pub fn seed_document(&self, user: &UserId, record: TaskRecord) -> TaskId {
        let id = TaskId::from(Uuid::new_v4().simple().to_string());
        let doc = serde_json::to_value(&record).expect("task record serializes");
        self.collections
            .write()
            .unwrap()
            .entry(user.clone())
            .or_default()
            .push((id.clone(), doc));
        id
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "simulated connectivity loss".to_string(),
            ));
        }
        Ok(())
    }

    fn decode(doc: &serde_json::Value) -> Result<TaskRecord, StoreError> {
        serde_json::from_value(doc.clone())
            .map_err(|e| StoreError::Unavailable(format!("document decode failed: {e}")))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self, session: &Session) -> Result<Vec<Task>, StoreError> {
        self.check_online()?;
        let collections = self.collections.read().unwrap();
        let docs = collections.get(&session.user).map(Vec::as_slice).unwrap_or(&[]);
        docs.iter()
            .map(|(id, doc)| Self::decode(doc).map(|record| record.into_task(id.clone())))
            .collect()
    }

    async fn get_task(
        &self,
        session: &Session,
        id: &TaskId,
    ) -> Result<Option<Task>, StoreError> {
        self.check_online()?;
        let collections = self.collections.read().unwrap();
        let Some(docs) = collections.get(&session.user) else {
            return Ok(None);
        };
        docs.iter()
            .find(|(doc_id, _)| doc_id == id)
            .map(|(doc_id, doc)| Self::decode(doc).map(|record| record.into_task(doc_id.clone())))
            .transpose()
    }

    async fn create_task(
        &self,
        session: &Session,
        draft: &TaskDraft,
    ) -> Result<Task, StoreError> {
        self.check_online()?;
        let now = RemoteTimestamp::from_utc(Utc::now());
        let record = TaskRecord {
            title: draft.title.clone(),
            description: draft.description.clone(),
            due_date: draft.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
            completed: false,
            created_at: Some(now.clone()),
            updated_at: Some(now),
            completed_at: None,
        };
        // Server ids use the simple UUID form, so they never collide with
        // the hyphenated temporary ids clients mint.
        let id = TaskId::from(Uuid::new_v4().simple().to_string());
        let doc = serde_json::to_value(&record).expect("task record serializes");
        self.collections
            .write()
            .unwrap()
            .entry(session.user.clone())
            .or_default()
            .push((id.clone(), doc));
        Ok(record.into_task(id))
    }

    async fn update_task(
        &self,
        session: &Session,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<(), StoreError> {
        self.check_online()?;
        let mut collections = self.collections.write().unwrap();
        let docs = collections
            .get_mut(&session.user)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let (_, doc) = docs
            .iter_mut()
            .find(|(doc_id, _)| doc_id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut record = Self::decode(doc)?;
        let now = RemoteTimestamp::from_utc(Utc::now());
        match patch {
            TaskPatch::Completion { completed } => {
                record.completed = *completed;
            }
            TaskPatch::Full {
                title,
                description,
                due_date,
                completed,
            } => {
                record.title = title.clone();
                record.description = description.clone();
                record.due_date = due_date.map(|d| d.format("%Y-%m-%d").to_string());
                record.completed = *completed;
            }
        }
        record.completed_at = record.completed.then(|| now.clone());
        record.updated_at = Some(now);
        *doc = serde_json::to_value(&record).expect("task record serializes");
        Ok(())
    }

    async fn delete_task(&self, session: &Session, id: &TaskId) -> Result<(), StoreError> {
        self.check_online()?;
        let mut collections = self.collections.write().unwrap();
        if let Some(docs) = collections.get_mut(&session.user) {
            docs.retain(|(doc_id, _)| doc_id != id);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    Verification,
    PasswordReset,
}

/// A mail the identity provider "sent". Recorded instead of delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub kind: MailKind,
}

struct UserEntry {
    uid: UserId,
    password: String,
    verified: bool,
}

#[derive(Default)]
pub struct MemoryAuth {
    users: RwLock<HashMap<String, UserEntry>>,
    outbox: RwLock<Vec<MailMessage>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user clicking the verification link.
    pub fn mark_verified(&self, email: &str) {
        if let Some(entry) = self.users.write().unwrap().get_mut(email) {
            entry.verified = true;
        }
    }

    /// Everything the provider has "sent" so far.
    pub fn sent_mail(&self) -> Vec<MailMessage> {
        self.outbox.read().unwrap().clone()
    }

    fn send_mail(&self, to: &str, kind: MailKind) {
        self.outbox.write().unwrap().push(MailMessage {
            to: to.to_string(),
            kind,
        });
    }
}

#[async_trait]
impl AuthGateway for MemoryAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut users = self.users.write().unwrap();
        if users.contains_key(email) {
            return Err(AuthError::EmailTaken);
        }
        let uid = UserId::from(Uuid::new_v4().to_string());
        users.insert(
            email.to_string(),
            UserEntry {
                uid: uid.clone(),
                password: password.to_string(),
                verified: false,
            },
        );
        drop(users);
        self.send_mail(email, MailKind::Verification);
        Ok(Session {
            user: uid,
            email: email.to_string(),
            email_verified: false,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let users = self.users.read().unwrap();
        let entry = users.get(email).ok_or(AuthError::InvalidCredentials)?;
        if entry.password != password {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(Session {
            user: entry.uid.clone(),
            email: email.to_string(),
            email_verified: entry.verified,
        })
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), AuthError> {
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        if !self.users.read().unwrap().contains_key(email) {
            return Err(AuthError::UnknownEmail);
        }
        self.send_mail(email, MailKind::PasswordReset);
        Ok(())
    }
}
