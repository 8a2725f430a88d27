//! # Admission Configuration System
//!
//! Layered configuration for the admission engine, the lifecycle scheduler and
//! the notification dispatcher.
//!
//! ## Layering
//!
//! 1. Compiled defaults ([`AdmissionConfig::default`])
//! 2. `config/admission/base.toml`
//! 3. `config/admission/{environment}.toml`
//! 4. `ADMISSION__SECTION__KEY` environment variables
//! 5. `DATABASE_URL` for the connection string
//!
//! ## Usage
//!
//! ```rust,no_run
//! use admission_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let tick = manager.config().scheduler.tick_interval();
//! let timeout = manager.config().engine.transaction_timeout();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::constants::defaults;

/// Root configuration structure mirroring `config/admission/base.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Database connection and pooling configuration
    pub database: DatabaseConfig,

    /// Registration engine settings
    pub engine: EngineConfig,

    /// Lifecycle scheduler settings
    pub scheduler: SchedulerConfig,

    /// Notification dispatch settings
    pub notifications: NotificationConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DATABASE_URL.to_string(),
            max_connections: defaults::MAX_CONNECTIONS,
            acquire_timeout_seconds: defaults::ACQUIRE_TIMEOUT_SECONDS,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound for a single register or cancel transaction
    pub transaction_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transaction_timeout_ms: defaults::TRANSACTION_TIMEOUT_MS,
        }
    }
}

impl EngineConfig {
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub tick_interval_seconds: u64,
    /// A tick that runs longer than this is abandoned and retried next tick
    pub tick_timeout_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_seconds: defaults::TICK_INTERVAL_SECONDS,
            tick_timeout_seconds: defaults::TICK_TIMEOUT_SECONDS,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }

    pub fn tick_timeout(&self) -> Duration {
        Duration::from_secs(self.tick_timeout_seconds)
    }
}

/// Which sink receives notification intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Log the message that would be e-mailed
    Log,
    /// Persist an in-app notification row
    Inbox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Bounded queue size between the engine and the sink worker
    pub queue_capacity: usize,
    pub sink: SinkKind,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            queue_capacity: defaults::NOTIFICATION_QUEUE_CAPACITY,
            sink: SinkKind::Log,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AdmissionConfig {
    /// Validate cross-field constraints after all layers are merged
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.url.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "database.url",
                "database configuration",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "pool size must be greater than 0",
            ));
        }

        if self.engine.transaction_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "engine.transaction_timeout_ms",
                "0",
                "transaction timeout must be greater than 0",
            ));
        }

        if self.scheduler.tick_interval_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.tick_interval_seconds",
                "0",
                "tick interval must be greater than 0",
            ));
        }

        if self.scheduler.tick_timeout_seconds == 0
            || self.scheduler.tick_timeout_seconds > self.scheduler.tick_interval_seconds
        {
            return Err(ConfigurationError::invalid_value(
                "scheduler.tick_timeout_seconds",
                self.scheduler.tick_timeout_seconds.to_string(),
                "tick timeout must be positive and no longer than the tick interval",
            ));
        }

        if self.notifications.queue_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "notifications.queue_capacity",
                "0",
                "queue capacity must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AdmissionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.tick_interval(), Duration::from_secs(60));
        assert_eq!(config.scheduler.tick_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_tick_timeout_must_fit_interval() {
        let mut config = AdmissionConfig::default();
        config.scheduler.tick_interval_seconds = 5;
        config.scheduler.tick_timeout_seconds = 30;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { ref field, .. } if field == "scheduler.tick_timeout_seconds"));
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let mut config = AdmissionConfig::default();
        config.notifications.queue_capacity = 0;
        assert!(config.validate().is_err());
    }
}
