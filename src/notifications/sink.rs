//! Notification sinks: the delivery side of the dispatcher queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::PgPool;
use tokio::sync::Notify;
use tracing::info;

use super::intent::NotificationIntent;
use crate::models::Notification;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
    #[error("Inbox write failed: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Consumer of notification intents. Errors are logged by the dispatcher and
/// never reach the engine.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn deliver(&self, intent: &NotificationIntent) -> Result<(), NotificationError>;

    fn name(&self) -> &'static str;
}

/// Logs the e-mail that would be sent
#[derive(Debug, Clone, Default)]
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn deliver(&self, intent: &NotificationIntent) -> Result<(), NotificationError> {
        info!(
            to = %intent.recipient_email,
            event_id = intent.event_id,
            kind = %intent.kind,
            subject = intent.subject(),
            body = %intent.body(),
            "Email sent"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Writes an in-app notification row per intent
#[derive(Debug, Clone)]
pub struct InboxNotificationSink {
    pool: PgPool,
}

impl InboxNotificationSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for InboxNotificationSink {
    async fn deliver(&self, intent: &NotificationIntent) -> Result<(), NotificationError> {
        let message = format!("{} {}", intent.subject(), intent.body());
        Notification::create(&self.pool, intent.user_id, &message).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "inbox"
    }
}

/// Keeps every delivered intent in memory
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
    delivered: Mutex<Vec<NotificationIntent>>,
    notify: Notify,
    fail: AtomicBool,
}

impl RecordingNotificationSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A sink whose every delivery fails
    pub fn failing() -> Arc<Self> {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        Arc::new(sink)
    }

    pub fn delivered(&self) -> Vec<NotificationIntent> {
        self.delivered.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.delivered.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `count` intents have been delivered. Returns
    /// false if `timeout` elapses first.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                if self.len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn deliver(&self, intent: &NotificationIntent) -> Result<(), NotificationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery(format!(
                "refusing delivery to {}",
                intent.recipient_email
            )));
        }

        self.delivered.lock().push(intent.clone());
        self.notify.notify_waiters();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
