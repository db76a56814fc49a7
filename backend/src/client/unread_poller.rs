//! Periodic unread-notification count refresh.
//!
//! The poller owns one background task. Each tick asks the source for the
//! current count and publishes it on a watch channel, so subscribers only
//! ever see the latest value. Failed polls are logged and skipped; the
//! previous value stays published.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use super::api::{ApiClient, ClientError};

/// Anything that can report the signed-in user's unread count.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnreadCountSource: Send + Sync {
    async fn unread_count(&self) -> Result<u64, ClientError>;
}

#[async_trait]
impl UnreadCountSource for ApiClient {
    async fn unread_count(&self) -> Result<u64, ClientError> {
        ApiClient::unread_count(self).await
    }
}

/// Handle to a running poll loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct UnreadCountPoller {
    latest: watch::Receiver<Option<u64>>,
    task: JoinHandle<()>,
}

impl UnreadCountPoller {
    /// Poll `client` every `period`, starting immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(client: ApiClient, period: Duration) -> Self {
        Self::spawn_with(Arc::new(client), period)
    }

    pub fn spawn_with<S>(source: Arc<S>, period: Duration) -> Self
    where
        S: UnreadCountSource + ?Sized + 'static,
    {
        let (sender, latest) = watch::channel(None);
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match source.unread_count().await {
                    Ok(count) => {
                        sender.send_replace(Some(count));
                    }
                    Err(ClientError::NotSignedIn) => {
                        debug!("unread count poll skipped: not signed in");
                    }
                    Err(err) => warn!(error = %err, "unread count poll failed"),
                }
            }
        });
        Self { latest, task }
    }

    /// Most recent count, or `None` before the first successful poll.
    pub fn latest(&self) -> Option<u64> {
        *self.latest.borrow()
    }

    /// Receiver that is notified whenever a new count is published.
    pub fn subscribe(&self) -> watch::Receiver<Option<u64>> {
        self.latest.clone()
    }

    /// Stop polling. Subscribers keep the last published value.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for UnreadCountPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
