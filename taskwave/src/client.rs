//! The app backbone: gateway wiring, session lifecycle, auth-flow policy.

use std::sync::Arc;

use crate::auth::{
    AuthError, AuthGateway, ResetReceipt, Session, SignupReceipt, SignupRequest,
    RESET_EMAIL_SENT, VERIFICATION_EMAIL_SENT,
};
use crate::reconciler::TaskReconciler;
use crate::routes::Route;
use crate::store::TaskStore;

/// Wires the two remote gateways into a [`TaskWave`] client.
pub struct TaskWaveBuilder {
    auth: Arc<dyn AuthGateway>,
    store: Arc<dyn TaskStore>,
    sync_capacity: usize,
}

impl TaskWaveBuilder {
    pub fn new(auth: Arc<dyn AuthGateway>, store: Arc<dyn TaskStore>) -> Self {
        TaskWaveBuilder {
            auth,
            store,
            sync_capacity: 256,
        }
    }

    /// Capacity of the background-write report channel.
    pub fn with_sync_capacity(mut self, capacity: usize) -> Self {
        self.sync_capacity = capacity;
        self
    }

    pub fn build(self) -> TaskWave {
        TaskWave {
            auth: self.auth,
            tasks: TaskReconciler::with_sync_capacity(self.store, self.sync_capacity),
        }
    }
}

/// One user-facing client: an auth gateway handle plus the task reconciler
/// it feeds sessions into.
pub struct TaskWave {
    auth: Arc<dyn AuthGateway>,
    tasks: TaskReconciler,
}

impl TaskWave {
    pub fn builder(auth: Arc<dyn AuthGateway>, store: Arc<dyn TaskStore>) -> TaskWaveBuilder {
        TaskWaveBuilder::new(auth, store)
    }

    /// Register a new account.
    ///
    /// Validates the confirmation password, then calls the provider, which
    /// always sends a verification email. No session is established; the
    /// user goes back to the login screen with the receipt's notice.
    pub async fn sign_up(&self, request: SignupRequest) -> Result<SignupReceipt, AuthError> {
        request.validate()?;
        self.auth.sign_up(&request.email, &request.password).await?;
        Ok(SignupReceipt {
            email: request.email,
            notice: VERIFICATION_EMAIL_SENT,
        })
    }

    /// Sign in and install the session on the reconciler.
    ///
    /// A session whose email is unverified never survives: it is signed out
    /// again immediately and the attempt fails with
    /// [`AuthError::EmailNotVerified`], whose message is shown on the login
    /// form.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.auth.sign_in(email, password).await?;
        if !session.email_verified {
            if let Err(e) = self.auth.sign_out(&session).await {
                log::error!("failed to terminate unverified session for {email}: {e}");
            }
            return Err(AuthError::EmailNotVerified);
        }
        self.tasks.set_session(session.clone());
        Ok(session)
    }

    /// Sign out on the provider and clear the local session and task list.
    pub async fn sign_out(&mut self) -> Result<(), AuthError> {
        if let Some(session) = self.tasks.session() {
            self.auth.sign_out(session).await?;
        }
        self.tasks.clear_session();
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<ResetReceipt, AuthError> {
        self.auth.request_password_reset(email).await?;
        Ok(ResetReceipt {
            email: email.to_string(),
            notice: RESET_EMAIL_SENT,
        })
    }

    pub fn session(&self) -> Option<&Session> {
        self.tasks.session()
    }

    /// The reconciler behind this client.
    pub fn tasks(&mut self) -> &mut TaskReconciler {
        &mut self.tasks
    }

    pub fn tasks_ref(&self) -> &TaskReconciler {
        &self.tasks
    }

    /// Apply the session guard to a parsed route.
    pub fn resolve(&self, route: Route) -> Route {
        route.resolve(self.session().is_some())
    }
}
