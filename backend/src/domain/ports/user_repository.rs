//! Port abstraction for the identity store and its errors.

use async_trait::async_trait;

use crate::domain::{Email, Role, User, UserAccount, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => "email already registered: {email}",
    }
}

/// Identity store.
///
/// Emails are stored normalised (see [`Email`]) and are unique.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user together with its credential hash.
    async fn find_account_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserAccount>, UserPersistenceError>;

    /// Fetch the users among `ids` that exist, in no particular order.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError>;

    /// All users ordered by name.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Insert a new account; fails with `DuplicateEmail` on a clash.
    async fn insert(&self, account: &UserAccount) -> Result<(), UserPersistenceError>;

    /// Overwrite profile fields. Returns `false` when the user does not exist.
    async fn update(&self, user: &User) -> Result<bool, UserPersistenceError>;

    /// Remove a user. Returns `false` when the user does not exist.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;

    async fn count_by_role(&self, role: Role) -> Result<u64, UserPersistenceError>;
}
