//! # Event Lifecycle
//!
//! Time-driven event status: the pure [`EventStatusClock`] rules and the
//! [`LifecycleScheduler`] that applies them to the ledger.

pub mod clock;
pub mod scheduler;

pub use clock::EventStatusClock;
pub use scheduler::{LifecycleScheduler, SchedulerHandle, TickReport};
