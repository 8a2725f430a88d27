#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Admission Core
//!
//! Admission control and event lifecycle scheduling for an event-registration
//! platform.
//!
//! ## Overview
//!
//! Two pieces share one durable ledger:
//!
//! - The **registration engine** admits users to capacity-bounded events,
//!   queues them on a strict FIFO waitlist once an event is full, and promotes
//!   the longest-waiting user whenever a seat is released.
//! - The **lifecycle scheduler** advances events from `UPCOMING` through
//!   `IN_PROGRESS` to `COMPLETED` purely from wall-clock time. Closed events
//!   stop admitting registrations.
//!
//! ## Guarantees
//!
//! - Registered seats never exceed capacity, under any concurrency
//! - A user is never both registered and waitlisted for the same event
//! - Promotion is FIFO, one user per released seat
//! - Scheduler ticks are idempotent and never touch cancelled events
//!
//! ## Module Organization
//!
//! - [`registration`] - Register/cancel/promote protocol
//! - [`lifecycle`] - Status clock and periodic scheduler
//! - [`ledger`] - Transactional ledger traits, PostgreSQL and in-memory backends
//! - [`models`] - Rows and SQL for the ledger tables
//! - [`notifications`] - Notification intents, sinks and the bounded dispatcher
//! - [`state_machine`] - Admission and event status states
//! - [`config`] - Layered configuration
//! - [`database`] - Connection pool and migrations
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use admission_core::config::AdmissionConfig;
//! use admission_core::ledger::InMemoryAdmissionLedger;
//! use admission_core::notifications::{LoggingNotificationSink, NotificationDispatcher};
//! use admission_core::registration::RegistrationEngine;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AdmissionConfig::default();
//! let ledger = Arc::new(InMemoryAdmissionLedger::new());
//! let (dispatcher, _worker) = NotificationDispatcher::spawn(
//!     Arc::new(LoggingNotificationSink),
//!     config.notifications.queue_capacity,
//! );
//!
//! let engine = RegistrationEngine::new(ledger, dispatcher, &config.engine);
//! let result = engine.register(1, 1).await?;
//! println!("{}: {}", result.status, result.message);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                            # Unit and in-memory integration tests
//! cargo test --features postgres-tests  # PostgreSQL tests, requires DATABASE_URL
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod registration;
pub mod state_machine;

pub use config::{AdmissionConfig, ConfigManager, ConfigurationError};
pub use error::{AdmissionError, AdmissionResult};
pub use ledger::{AdmissionLedger, EventRoster, InMemoryAdmissionLedger, PgAdmissionLedger};
pub use lifecycle::{EventStatusClock, LifecycleScheduler, SchedulerHandle, TickReport};
pub use notifications::{NotificationDispatcher, NotificationIntent, NotificationKind};
pub use registration::{AdmissionStatus, CancelOutcome, RegisterResult, RegistrationEngine};
pub use state_machine::{AdmissionState, EventStatus, EventVisibility, RegistrationStatus};
