//! # TaskWave
//!
//! Optimistic task-list engine for apps backed by a remote document store.
//!
//! TaskWave keeps the ordered, in-memory task list a view renders and
//! bridges it to a per-user collection in a remote store. Local mutations
//! (create, toggle, delete) apply synchronously and the matching remote
//! writes run in the background without being awaited; a full
//! [`load`](TaskReconciler::load) is the reconciliation step that makes the
//! store authoritative again. Sessions come from a remote identity provider
//! behind [`AuthGateway`], with the unverified-email login block enforced in
//! [`TaskWave::sign_in`].
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use taskwave::{TaskDraft, TaskWave};
//!
//! let mut app = TaskWave::builder(auth_gateway, task_store).build();
//!
//! app.sign_in("you@example.com", "hunter2").await?;
//!
//! // Applies locally right away; the remote write happens in the background.
//! let task = app.tasks().create(TaskDraft::new("Buy milk"))?;
//! let done = app.tasks().toggle(&task.id)?;
//!
//! // Authoritative re-read, newest first.
//! app.tasks().load().await?;
//! ```
//!
//! ## Key types
//!
//! - [`TaskWave`] / [`TaskWaveBuilder`] — gateway wiring, session lifecycle,
//!   auth-flow policy
//! - [`TaskReconciler`] — the optimistic in-memory list and its operations
//! - [`TaskStore`] / [`AuthGateway`] — the consumed remote interfaces
//! - [`SyncReport`] — background write outcome, emitted per remote leg
//! - [`RemoteTimestamp`] — heterogeneous wire timestamp, normalized at the
//!   gateway boundary

pub mod auth;
pub mod client;
pub mod memory;
pub mod reconciler;
pub mod routes;
pub mod store;
pub mod task;
pub mod timestamp;

pub use auth::{
    AuthError, AuthGateway, ResetReceipt, Session, SignupReceipt, SignupRequest, UserId,
    RESET_EMAIL_SENT, VERIFICATION_EMAIL_SENT,
};
pub use client::{TaskWave, TaskWaveBuilder};
pub use reconciler::{SyncOutcome, SyncReport, TaskError, TaskReconciler, WriteKind};
pub use routes::Route;
pub use store::{StoreError, TaskPatch, TaskRecord, TaskStore};
pub use task::{Task, TaskDraft, TaskFilter, TaskId};
pub use timestamp::RemoteTimestamp;
