//! Remote identity-provider gateway and session types.
//!
//! The gateway itself is credential plumbing only. Policy, in particular
//! the rule that an unverified-email session must never survive a sign-in,
//! lives with the caller, in [`TaskWave::sign_in`](crate::TaskWave::sign_in).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Notice shown after a successful sign-up.
pub const VERIFICATION_EMAIL_SENT: &str =
    "Verification email sent. Please check your inbox (and spam folder).";

/// Notice shown after a password-reset request is accepted.
pub const RESET_EMAIL_SENT: &str = "Password reset email sent. Please check your inbox.";

/// Identity-provider user id. Keys the user's task collection in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authenticated session as returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: UserId,
    pub email: String,
    /// Whether the provider has seen the account's verification link
    /// clicked. Checked by the sign-in policy, not by the gateway.
    pub email_verified: bool,
}

/// Error Display strings double as the inline form messages the views show.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Login failed. Please check your credentials.")]
    InvalidCredentials,

    #[error("Please verify your email before logging in.")]
    EmailNotVerified,

    #[error("An account with this email already exists.")]
    EmailTaken,

    #[error("No account found for this email address.")]
    UnknownEmail,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("auth service unreachable: {0}")]
    Unavailable(String),
}

/// Credential-based session operations against the remote identity provider.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Register a new account. Always triggers a verification email as a
    /// side effect. The returned session starts unverified.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Exchange credentials for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Terminate a session on the provider side.
    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;

    /// Send a password-reset email to the account, if it exists.
    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError>;
}

/// Sign-up form input.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        SignupRequest {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Form-level validation, checked before the gateway is involved.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        Ok(())
    }
}

/// Outcome of a successful sign-up: the user is back on the login screen
/// with the verification notice; no session is established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupReceipt {
    pub email: String,
    pub notice: &'static str,
}

/// Outcome of an accepted password-reset request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetReceipt {
    pub email: String,
    pub notice: &'static str,
}
