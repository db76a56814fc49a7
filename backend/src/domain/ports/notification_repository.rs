//! Port for notification persistence, including read receipts.

use async_trait::async_trait;

use crate::domain::{Notification, NotificationId, NotificationVisibility, ReadReceipt, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "notification repository query failed: {message}",
    }
}

/// Notification store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: &Notification)
    -> Result<(), NotificationPersistenceError>;

    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationPersistenceError>;

    /// Notifications admitted by `visibility`, newest first, with receipts.
    async fn list(
        &self,
        visibility: &NotificationVisibility,
    ) -> Result<Vec<Notification>, NotificationPersistenceError>;

    /// Store a receipt unless the user already has one for this notification.
    ///
    /// Returns `true` when the receipt was written. Concurrent duplicates
    /// must collapse to a single receipt.
    async fn append_read_receipt(
        &self,
        id: &NotificationId,
        receipt: &ReadReceipt,
    ) -> Result<bool, NotificationPersistenceError>;

    /// Number of notifications admitted by `visibility` that `user` has not read.
    async fn count_unread(
        &self,
        visibility: &NotificationVisibility,
        user: &UserId,
    ) -> Result<u64, NotificationPersistenceError>;

    /// Returns `false` when the notification does not exist.
    async fn delete(&self, id: &NotificationId) -> Result<bool, NotificationPersistenceError>;
}
