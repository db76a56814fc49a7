//! In-memory notification store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{NotificationPersistenceError, NotificationRepository};
use crate::domain::{Notification, NotificationId, NotificationVisibility, ReadReceipt, UserId};

use super::lock;

#[derive(Debug, Default)]
pub struct MemoryNotificationRepository {
    notifications: Mutex<HashMap<NotificationId, Notification>>,
}

impl MemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn insert(
        &self,
        notification: &Notification,
    ) -> Result<(), NotificationPersistenceError> {
        lock(&self.notifications).insert(notification.id, notification.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationPersistenceError> {
        Ok(lock(&self.notifications).get(id).cloned())
    }

    async fn list(
        &self,
        visibility: &NotificationVisibility,
    ) -> Result<Vec<Notification>, NotificationPersistenceError> {
        let mut visible: Vec<Notification> = lock(&self.notifications)
            .values()
            .filter(|notification| visibility.admits(notification))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(visible)
    }

    async fn append_read_receipt(
        &self,
        id: &NotificationId,
        receipt: &ReadReceipt,
    ) -> Result<bool, NotificationPersistenceError> {
        let mut notifications = lock(&self.notifications);
        let Some(notification) = notifications.get_mut(id) else {
            return Err(NotificationPersistenceError::query("notification not found"));
        };
        let (_, added) = notification.mark_read(receipt.user, receipt.read_at);
        Ok(added)
    }

    async fn count_unread(
        &self,
        visibility: &NotificationVisibility,
        user: &UserId,
    ) -> Result<u64, NotificationPersistenceError> {
        let count = lock(&self.notifications)
            .values()
            .filter(|notification| visibility.admits(notification))
            .filter(|notification| notification.receipt_for(user).is_none())
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn delete(&self, id: &NotificationId) -> Result<bool, NotificationPersistenceError> {
        Ok(lock(&self.notifications).remove(id).is_some())
    }
}
