//! Error types for the admission engine.
//!
//! Domain errors are expected, caller-recoverable rejections. Infrastructure
//! errors are opaque to end users and are logged where they occur.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigurationError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdmissionError {
    #[error("user {user_id} is already registered for event {event_id}")]
    AlreadyRegistered { user_id: i64, event_id: i64 },
    #[error("event {event_id} not found")]
    EventNotFound { event_id: i64 },
    #[error("user {user_id} not found")]
    UserNotFound { user_id: i64 },
    #[error("event {event_id} is private and user {user_id} is not invited")]
    NotInvited { user_id: i64, event_id: i64 },
    #[error("no registration or waitlist entry for user {user_id} on event {event_id}")]
    RegistrationNotFound { user_id: i64, event_id: i64 },
    #[error("user {user_id} already attended event {event_id}")]
    AlreadyAttended { user_id: i64, event_id: i64 },
    #[error("event {event_id} is {status} and no longer accepts registrations")]
    EventClosed { event_id: i64, status: String },
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Transaction timeout for operation {operation}: {timeout:?}")]
    TransactionTimeout {
        operation: String,
        timeout: Duration,
    },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AdmissionError {
    /// True for expected, user-facing rejections.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRegistered { .. }
                | Self::EventNotFound { .. }
                | Self::UserNotFound { .. }
                | Self::NotInvited { .. }
                | Self::RegistrationNotFound { .. }
                | Self::AlreadyAttended { .. }
                | Self::EventClosed { .. }
                | Self::InvalidEvent(_)
        )
    }

    /// Stable machine-readable code for API collaborators.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRegistered { .. } => "already_registered",
            Self::EventNotFound { .. } => "event_not_found",
            Self::UserNotFound { .. } => "user_not_found",
            Self::NotInvited { .. } => "not_invited",
            Self::RegistrationNotFound { .. } => "registration_not_found",
            Self::AlreadyAttended { .. } => "already_attended",
            Self::EventClosed { .. } => "event_closed",
            Self::InvalidEvent(_) => "invalid_event",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::TransactionTimeout { .. } => "transaction_timeout",
            Self::Storage(_) => "storage_error",
            Self::Configuration(_) => "configuration_error",
        }
    }

    /// Human-readable reason for the end user. Infrastructure failures never
    /// leak their internal detail.
    pub fn user_message(&self) -> String {
        match self {
            Self::AlreadyRegistered { .. } => "You are already registered for this event.".into(),
            Self::EventNotFound { .. } => "Event not found.".into(),
            Self::UserNotFound { .. } => {
                "User not found. Please sync your profile first.".into()
            }
            Self::NotInvited { .. } => {
                "This event is private and you are not invited.".into()
            }
            Self::RegistrationNotFound { .. } => "Registration not found.".into(),
            Self::AlreadyAttended { .. } => {
                "You have already checked in to this event.".into()
            }
            Self::EventClosed { .. } => "This event is no longer accepting registrations.".into(),
            Self::InvalidEvent(reason) => format!("Event details are invalid: {reason}."),
            Self::StorageUnavailable(_)
            | Self::TransactionTimeout { .. }
            | Self::Storage(_)
            | Self::Configuration(_) => {
                "Something went wrong on our side. Please try again.".into()
            }
        }
    }
}

impl From<sqlx::Error> for AdmissionError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => AdmissionError::StorageUnavailable(err.to_string()),
            other => AdmissionError::Storage(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AdmissionError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AdmissionError::Storage(format!("migration failed: {err}"))
    }
}

impl From<ConfigurationError> for AdmissionError {
    fn from(err: ConfigurationError) -> Self {
        AdmissionError::Configuration(err.to_string())
    }
}

pub type AdmissionResult<T> = std::result::Result<T, AdmissionError>;
