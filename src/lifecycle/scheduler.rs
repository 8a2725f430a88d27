//! # Lifecycle Scheduler
//!
//! Background task that advances event status from wall-clock time.
//!
//! ## Tick
//!
//! One ledger transaction per tick, both updates evaluated against the same
//! `now`:
//!
//! 1. `UPCOMING` events with `start_time <= now < end_time` become `IN_PROGRESS`
//! 2. `UPCOMING`/`IN_PROGRESS` events with `end_time <= now` become `COMPLETED`
//!
//! Both are conditional writes, so re-running a tick, skipping one or running
//! one late converges on the same state. `CANCELLED` events are never matched.
//! A tick that errors or exceeds `tick_timeout_seconds` is rolled back and
//! logged; the next tick retries the same corrections.
//!
//! ## Lifecycle
//!
//! ```rust,ignore
//! let handle = LifecycleScheduler::new(ledger, config.scheduler.clone()).spawn();
//! // ...
//! handle.shutdown().await;
//! ```

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::constants::operations;
use crate::error::{AdmissionError, AdmissionResult};
use crate::ledger::AdmissionLedger;
use crate::logging::log_lifecycle_tick;

/// Rows changed by one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub started: u64,
    pub completed: u64,
}

impl TickReport {
    pub fn is_noop(&self) -> bool {
        self.started == 0 && self.completed == 0
    }
}

#[derive(Clone)]
pub struct LifecycleScheduler {
    ledger: Arc<dyn AdmissionLedger>,
    config: SchedulerConfig,
}

impl std::fmt::Debug for LifecycleScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleScheduler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LifecycleScheduler {
    #[must_use]
    pub fn new(ledger: Arc<dyn AdmissionLedger>, config: SchedulerConfig) -> Self {
        Self { ledger, config }
    }

    /// Run one tick against the current time
    pub async fn tick(&self) -> AdmissionResult<TickReport> {
        self.tick_at(Utc::now()).await
    }

    /// Run one tick as if the clock read `now`
    pub async fn tick_at(&self, now: DateTime<Utc>) -> AdmissionResult<TickReport> {
        let timeout = self.config.tick_timeout();

        let work = async {
            let mut tx = self.ledger.begin().await?;
            let started = tx.advance_started(now).await?;
            let completed = tx.advance_completed(now).await?;
            tx.commit().await?;
            Ok(TickReport { started, completed })
        };

        match tokio::time::timeout(timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(AdmissionError::TransactionTimeout {
                operation: operations::SCHEDULER_TICK.to_string(),
                timeout,
            }),
        }
    }

    /// Start the periodic loop on the runtime. The first tick runs
    /// immediately; ticks never overlap.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));

        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut timer = interval(self.config.tick_interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_seconds = self.config.tick_interval_seconds,
            timeout_seconds = self.config.tick_timeout_seconds,
            "Starting lifecycle scheduler"
        );

        loop {
            tokio::select! {
                _ = timer.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let start = Instant::now();
            match self.tick().await {
                Ok(report) if report.is_noop() => {
                    debug!("No event status changes this tick");
                }
                Ok(report) => {
                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    log_lifecycle_tick(report.started, report.completed, elapsed_ms);
                }
                Err(e @ AdmissionError::TransactionTimeout { .. }) => {
                    warn!(error = %e, "Lifecycle tick timed out, deferring to next tick");
                }
                Err(e) => {
                    error!(error = %e, "Lifecycle tick failed, deferring to next tick");
                }
            }
        }

        info!("Lifecycle scheduler stopped");
    }
}

/// Owner of a running scheduler task. Dropping it also stops the loop.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop to stop and wait for it. An in-flight tick finishes
    /// first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Lifecycle scheduler task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
