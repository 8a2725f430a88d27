//! Configuration Loader
//!
//! Environment-aware configuration loading. Handles file discovery, environment
//! detection and layering of TOML files with environment variable overrides.

use super::error::{ConfigResult, ConfigurationError};
use super::AdmissionConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: AdmissionConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Lets tests pick an environment without touching process variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading admission configuration"
        );

        let config = Self::build(&config_directory, environment)?;
        config.validate()?;

        debug!(
            environment = %environment,
            max_connections = config.database.max_connections,
            tick_interval_seconds = config.scheduler.tick_interval_seconds,
            queue_capacity = config.notifications.queue_capacity,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Get current environment from environment variables
    pub fn detect_environment() -> String {
        env::var("ADMISSION_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("ADMISSION_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config").join("admission"))
    }

    fn build(config_directory: &Path, environment: &str) -> ConfigResult<AdmissionConfig> {
        let defaults = Config::try_from(&AdmissionConfig::default())
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        let settings = Config::builder()
            .add_source(defaults)
            .add_source(File::from(config_directory.join("base.toml")).required(false))
            .add_source(
                File::from(config_directory.join(format!("{environment}.toml"))).required(false),
            )
            .add_source(
                Environment::with_prefix("ADMISSION")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())
            .map_err(|e| ConfigurationError::load_error(environment, e))?
            .build()
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        settings
            .try_deserialize::<AdmissionConfig>()
            .map_err(ConfigurationError::deserialize_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_directory_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().join("absent")), "test")
                .expect("defaults should load");

        assert_eq!(manager.environment(), "test");
        assert_eq!(manager.config().scheduler.tick_interval_seconds, 60);
    }

    #[test]
    fn test_environment_file_overrides_base() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("base.toml"),
            "[scheduler]\ntick_interval_seconds = 30\ntick_timeout_seconds = 5\n\n[notifications]\nqueue_capacity = 64\n",
        )
        .expect("write base");
        fs::write(
            dir.path().join("test.toml"),
            "[scheduler]\ntick_interval_seconds = 2\ntick_timeout_seconds = 1\n",
        )
        .expect("write test");

        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .expect("config should load");

        let config = manager.config();
        assert_eq!(config.scheduler.tick_interval_seconds, 2);
        assert_eq!(config.scheduler.tick_timeout_seconds, 1);
        assert_eq!(config.notifications.queue_capacity, 64);
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("base.toml"),
            "[engine]\ntransaction_timeout_ms = 0\n",
        )
        .expect("write base");

        let result =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test");
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }
}
