//! # Admission Daemon
//!
//! Runs the lifecycle scheduler and the notification worker against
//! PostgreSQL, and holds a ready registration engine for the request layer
//! embedded alongside it. Stops on Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use admission_core::config::{ConfigManager, SinkKind};
use admission_core::database::DatabaseConnection;
use admission_core::ledger::{AdmissionLedger, PgAdmissionLedger};
use admission_core::lifecycle::LifecycleScheduler;
use admission_core::logging::init_structured_logging;
use admission_core::notifications::{
    InboxNotificationSink, LoggingNotificationSink, NotificationDispatcher, NotificationSink,
};
use admission_core::registration::RegistrationEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let manager = ConfigManager::load().context("failed to load admission configuration")?;
    let config = manager.config().clone();

    init_structured_logging(&config.logging);
    info!(
        environment = manager.environment(),
        config_directory = %manager.config_directory().display(),
        "Starting admission daemon"
    );

    let database = DatabaseConnection::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    if !database
        .health_check()
        .await
        .context("database health check failed")?
    {
        anyhow::bail!("database health check returned an unexpected result");
    }
    database
        .migrate()
        .await
        .context("failed to apply migrations")?;

    let ledger: Arc<dyn AdmissionLedger> =
        Arc::new(PgAdmissionLedger::new(database.pool().clone()));

    let sink: Arc<dyn NotificationSink> = match config.notifications.sink {
        SinkKind::Log => Arc::new(LoggingNotificationSink),
        SinkKind::Inbox => Arc::new(InboxNotificationSink::new(database.pool().clone())),
    };
    let (dispatcher, notification_worker) =
        NotificationDispatcher::spawn(sink, config.notifications.queue_capacity);

    let engine = RegistrationEngine::new(Arc::clone(&ledger), dispatcher, &config.engine);

    let scheduler = if config.scheduler.enabled {
        Some(LifecycleScheduler::new(Arc::clone(&ledger), config.scheduler.clone()).spawn())
    } else {
        info!("Lifecycle scheduler disabled by configuration");
        None
    };

    info!(?engine, "Admission daemon ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    if let Some(handle) = scheduler {
        handle.shutdown().await;
    }

    let stats = engine.dispatcher().stats_handle();
    drop(engine);
    notification_worker
        .await
        .context("notification worker panicked")?;

    let stats = stats.snapshot();

    info!(
        enqueued = stats.enqueued,
        dropped = stats.dropped,
        delivered = stats.delivered,
        failed = stats.failed,
        "Notification worker drained"
    );

    database.close().await;
    info!("Admission daemon stopped");
    Ok(())
}
