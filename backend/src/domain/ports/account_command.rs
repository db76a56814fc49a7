//! Driving port for sign-up, sign-in and administrator bootstrap.
//!
//! Inbound adapters call this port with validated input; the backing service
//! owns credential hashing and issuance.

use async_trait::async_trait;

use crate::domain::{AuthSession, Error, LoginCredentials, Registration, User};

/// How the bootstrap administrator came to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A new account was created.
    Created(AuthSession),
    /// An existing account with the bootstrap email was promoted.
    Promoted(AuthSession),
}

impl BootstrapOutcome {
    pub fn session(&self) -> &AuthSession {
        match self {
            Self::Created(session) | Self::Promoted(session) => session,
        }
    }

    pub fn into_session(self) -> AuthSession {
        match self {
            Self::Created(session) | Self::Promoted(session) => session,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account and sign it in.
    async fn register(&self, registration: Registration) -> Result<AuthSession, Error>;

    /// Check credentials and issue a fresh credential.
    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error>;

    /// Ensure an administrator exists; refused once one does.
    async fn bootstrap_admin(&self) -> Result<BootstrapOutcome, Error>;
}

/// Resolves a presented bearer credential to the current user record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<User, Error>;
}
