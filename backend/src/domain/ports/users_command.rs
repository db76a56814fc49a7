//! Driving ports for administrator user management.

use async_trait::async_trait;

use crate::domain::{Error, Requester, User, UserChanges, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersCommand: Send + Sync {
    /// Apply a partial edit; absent fields keep their values.
    async fn update_user(
        &self,
        requester: &Requester,
        id: &UserId,
        changes: UserChanges,
    ) -> Result<User, Error>;

    async fn delete_user(&self, requester: &Requester, id: &UserId) -> Result<(), Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    async fn list_users(&self, requester: &Requester) -> Result<Vec<User>, Error>;
}
