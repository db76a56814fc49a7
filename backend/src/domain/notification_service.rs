//! Notification services.
//!
//! [`NotificationService`] implements [`NotificationsCommand`] and
//! [`NotificationsQuery`]. Visibility is role-independent, so admins read
//! through the same department filter as everyone else.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    NotificationPersistenceError, NotificationRepository, NotificationsCommand,
    NotificationsQuery,
};
use crate::domain::{
    Error, Notification, NotificationDraft, NotificationId, NotificationView,
    NotificationVisibility, ReadReceipt, Requester, ensure_admin, ensure_can_read_notification,
};

#[derive(Clone)]
pub struct NotificationService<N> {
    notifications: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<N> NotificationService<N> {
    pub fn new(notifications: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            notifications,
            clock,
        }
    }
}

impl<N> NotificationService<N>
where
    N: NotificationRepository,
{
    fn map_notification_error(error: NotificationPersistenceError) -> Error {
        match error {
            NotificationPersistenceError::Connection { message } => Error::service_unavailable(
                format!("notification repository unavailable: {message}"),
            ),
            NotificationPersistenceError::Query { message } => {
                Error::internal(format!("notification repository error: {message}"))
            }
        }
    }

    async fn find(&self, id: &NotificationId) -> Result<Option<Notification>, Error> {
        self.notifications
            .find_by_id(id)
            .await
            .map_err(Self::map_notification_error)
    }

    /// Load a notification the requester may see; hidden ones read as missing.
    async fn load_visible(
        &self,
        requester: &Requester,
        id: &NotificationId,
    ) -> Result<Notification, Error> {
        let notification = self
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found("notification not found"))?;
        ensure_can_read_notification(requester, &notification)?;
        Ok(notification)
    }
}

#[async_trait]
impl<N> NotificationsCommand for NotificationService<N>
where
    N: NotificationRepository,
{
    async fn create_notification(
        &self,
        requester: &Requester,
        draft: NotificationDraft,
    ) -> Result<Notification, Error> {
        ensure_admin(requester)?;
        let notification = Notification::from_draft(
            NotificationId::random(),
            draft,
            requester.id,
            self.clock.utc(),
        );
        self.notifications
            .insert(&notification)
            .await
            .map_err(Self::map_notification_error)?;
        info!(
            notification_id = %notification.id,
            global = notification.scope.is_global(),
            by = %requester.id,
            "notification created"
        );
        Ok(notification)
    }

    async fn mark_read(
        &self,
        requester: &Requester,
        id: &NotificationId,
    ) -> Result<ReadReceipt, Error> {
        let mut notification = self.load_visible(requester, id).await?;
        let (receipt, added) = notification.mark_read(requester.id, self.clock.utc());
        if !added {
            return Ok(receipt);
        }
        let written = self
            .notifications
            .append_read_receipt(id, &receipt)
            .await
            .map_err(Self::map_notification_error)?;
        if written {
            debug!(notification_id = %id, user_id = %requester.id, "notification read");
            return Ok(receipt);
        }
        // Lost a race with a concurrent mark; report the receipt that won.
        let stored = self
            .find(id)
            .await?
            .and_then(|current| current.receipt_for(&requester.id).copied());
        Ok(stored.unwrap_or(receipt))
    }

    async fn delete_notification(
        &self,
        requester: &Requester,
        id: &NotificationId,
    ) -> Result<(), Error> {
        ensure_admin(requester)?;
        if !self
            .notifications
            .delete(id)
            .await
            .map_err(Self::map_notification_error)?
        {
            return Err(Error::not_found("notification not found"));
        }
        info!(notification_id = %id, by = %requester.id, "notification deleted");
        Ok(())
    }
}

#[async_trait]
impl<N> NotificationsQuery for NotificationService<N>
where
    N: NotificationRepository,
{
    async fn list_notifications(
        &self,
        requester: &Requester,
    ) -> Result<Vec<NotificationView>, Error> {
        let visibility = NotificationVisibility::for_requester(requester);
        let notifications = self
            .notifications
            .list(&visibility)
            .await
            .map_err(Self::map_notification_error)?;
        Ok(notifications
            .iter()
            .map(|notification| notification.view_for(&requester.id))
            .collect())
    }

    async fn unread_count(&self, requester: &Requester) -> Result<u64, Error> {
        let visibility = NotificationVisibility::for_requester(requester);
        self.notifications
            .count_unread(&visibility, &requester.id)
            .await
            .map_err(Self::map_notification_error)
    }
}

#[cfg(test)]
#[path = "notification_service_tests.rs"]
mod tests;
