//! Fire-and-forget notifications.
//!
//! Engine operations enqueue a [`Notification`] after their transaction
//! commits. A dispatcher task owns the [`NotificationPort`] and delivers each
//! message in its own task: a failing or panicking delivery is logged and
//! never reaches the request that produced it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub user_ids: Vec<String>,
    pub title: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn send_to_user(
        &self,
        user_ids: &[String],
        title: &str,
        body: &str,
    ) -> Result<(), NotifyError>;
}

/// Writes every delivery to the log. Used when no push gateway is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotificationPort;

#[async_trait]
impl NotificationPort for LogNotificationPort {
    async fn send_to_user(
        &self,
        user_ids: &[String],
        title: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(recipients = ?user_ids, %title, %body, "notification");
        Ok(())
    }
}

/// Cloneable sending side of the dispatcher.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Start the dispatcher on the current tokio runtime. It stops once every
    /// `Notifier` clone is dropped.
    pub fn spawn(port: Arc<dyn NotificationPort>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(dispatch(port, rx));
        (Self { tx }, handle)
    }

    /// Queue a notification. Empty recipient lists are dropped.
    pub fn send(&self, notification: Notification) {
        if notification.user_ids.is_empty() {
            return;
        }
        if self.tx.send(notification).is_err() {
            tracing::warn!("notification dispatcher stopped, dropping notification");
        }
    }
}

async fn dispatch(
    port: Arc<dyn NotificationPort>,
    mut rx: mpsc::UnboundedReceiver<Notification>,
) {
    while let Some(notification) = rx.recv().await {
        let port = Arc::clone(&port);
        let delivery = tokio::spawn(async move {
            port.send_to_user(
                &notification.user_ids,
                &notification.title,
                &notification.body,
            )
            .await
        });
        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!(%err, "notification failed"),
                Err(err) if err.is_panic() => tracing::warn!("notification task panicked"),
                Err(err) => tracing::warn!(%err, "notification task cancelled"),
            }
        });
    }
    tracing::debug!("notification dispatcher finished");
}
