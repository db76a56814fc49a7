//! Port for issuing and verifying bearer credentials.

use chrono::{DateTime, Utc};

use crate::domain::{AuthToken, UserId};

use super::define_port_error;

define_port_error! {
    /// Failures raised by credential issuers.
    pub enum CredentialError {
        /// The credential was valid once but its lifetime has passed.
        Expired => "credential expired",
        /// The credential is malformed, forged or names no user.
        Invalid { message: String } => "credential rejected: {message}",
        /// A credential could not be produced.
        Issue { message: String } => "credential could not be issued: {message}",
    }
}

/// Signs and checks time-limited credentials carrying a user id.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialIssuer: Send + Sync {
    fn issue(&self, user: &UserId, issued_at: DateTime<Utc>) -> Result<AuthToken, CredentialError>;

    /// Resolve a presented credential to the user it was issued for.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, CredentialError>;
}
