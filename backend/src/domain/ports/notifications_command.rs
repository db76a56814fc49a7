//! Driving ports for notification use-cases.

use async_trait::async_trait;

use crate::domain::{
    Error, Notification, NotificationDraft, NotificationId, NotificationView, ReadReceipt,
    Requester,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationsCommand: Send + Sync {
    async fn create_notification(
        &self,
        requester: &Requester,
        draft: NotificationDraft,
    ) -> Result<Notification, Error>;

    /// Idempotent: returns the requester's receipt, existing or new.
    async fn mark_read(
        &self,
        requester: &Requester,
        id: &NotificationId,
    ) -> Result<ReadReceipt, Error>;

    async fn delete_notification(
        &self,
        requester: &Requester,
        id: &NotificationId,
    ) -> Result<(), Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationsQuery: Send + Sync {
    /// Visible notifications, newest first, annotated for the requester.
    async fn list_notifications(
        &self,
        requester: &Requester,
    ) -> Result<Vec<NotificationView>, Error>;

    async fn unread_count(&self, requester: &Requester) -> Result<u64, Error>;
}
