//! Bounded hand-off between the registration engine and a notification sink.
//!
//! The engine calls [`NotificationDispatcher::dispatch`], which never waits:
//! when the queue is full the intent is dropped and counted. A single worker
//! task drains the queue in order, so a burst of promotions cannot fan out
//! into unbounded concurrent deliveries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::intent::NotificationIntent;
use super::sink::NotificationSink;

#[derive(Debug, Default)]
pub struct DispatcherStats {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Counter values at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DispatcherSnapshot {
    pub enqueued: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherSnapshot {
        DispatcherSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<NotificationIntent>,
    stats: Arc<DispatcherStats>,
}

impl NotificationDispatcher {
    /// Start the delivery worker. The worker exits once every clone of the
    /// returned dispatcher has been dropped and the queue is drained.
    pub fn spawn(sink: Arc<dyn NotificationSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let stats = Arc::new(DispatcherStats::default());

        let handle = tokio::spawn(Self::run(sink, receiver, Arc::clone(&stats)));

        (Self { sender, stats }, handle)
    }

    /// Queue an intent without blocking. Returns false if it was dropped.
    pub fn dispatch(&self, intent: NotificationIntent) -> bool {
        match self.sender.try_send(intent) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(intent)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    to = %intent.recipient_email,
                    event_id = intent.event_id,
                    kind = %intent.kind,
                    "Notification queue full, dropping intent"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(intent)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    to = %intent.recipient_email,
                    event_id = intent.event_id,
                    kind = %intent.kind,
                    "Notification worker stopped, dropping intent"
                );
                false
            }
        }
    }

    pub fn stats(&self) -> DispatcherSnapshot {
        self.stats.snapshot()
    }

    /// Counters that outlive the dispatcher, for reading after the worker
    /// has drained
    pub fn stats_handle(&self) -> Arc<DispatcherStats> {
        Arc::clone(&self.stats)
    }

    async fn run(
        sink: Arc<dyn NotificationSink>,
        mut receiver: mpsc::Receiver<NotificationIntent>,
        stats: Arc<DispatcherStats>,
    ) {
        info!(sink = sink.name(), "Notification worker started");

        while let Some(intent) = receiver.recv().await {
            match sink.deliver(&intent).await {
                Ok(()) => {
                    stats.delivered.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        event_id = intent.event_id,
                        user_id = intent.user_id,
                        kind = %intent.kind,
                        "Notification delivered"
                    );
                }
                Err(e) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        sink = sink.name(),
                        event_id = intent.event_id,
                        user_id = intent.user_id,
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        }

        info!(sink = sink.name(), "Notification worker stopped");
    }
}
