//! # Registration
//!
//! Transactional admission control: capacity-bounded registration, FIFO
//! waitlisting and promotion on cancellation.

pub mod engine;
pub mod types;

pub use engine::RegistrationEngine;
pub use types::{AdmissionStatus, CancelOutcome, RegisterResult};
