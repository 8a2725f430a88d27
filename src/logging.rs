//! # Structured Logging Module
//!
//! One-time `tracing` subscriber setup plus helpers that give admission
//! outcomes a consistent structured shape.

use std::sync::OnceLock;

use chrono::Utc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging. `RUST_LOG` takes precedence over the
/// configured level. Safe to call more than once.
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

        let layer = if config.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // Another subscriber (e.g. a test harness) may already be installed
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }

        tracing::info!(
            level = %config.level,
            json = config.json,
            "Structured logging initialized"
        );
    });
}

/// Log one register/cancel outcome
pub fn log_admission_operation(
    operation: &str,
    user_id: i64,
    event_id: i64,
    outcome: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        user_id = user_id,
        event_id = event_id,
        outcome = %outcome,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "ADMISSION_OPERATION"
    );
}

/// Log a rejected admission request
pub fn log_admission_rejection(operation: &str, user_id: i64, event_id: i64, code: &str) {
    tracing::warn!(
        operation = %operation,
        user_id = user_id,
        event_id = event_id,
        code = %code,
        "ADMISSION_REJECTED"
    );
}

/// Log the result of a scheduler tick that changed something
pub fn log_lifecycle_tick(started: u64, completed: u64, elapsed_ms: u64) {
    tracing::info!(
        started = started,
        completed = completed,
        elapsed_ms = elapsed_ms,
        timestamp = %Utc::now().to_rfc3339(),
        "LIFECYCLE_TICK"
    );
}
