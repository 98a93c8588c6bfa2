//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings of the
//! data-access and monitoring core. Configuration is loaded from a TOML file;
//! every field has a default, and `DATABASE_URL` overrides the database path.
//!
//! # Example
//!
//! ```no_run
//! use shiftlog::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::cleanup::CleanupConfig;
use super::database::{ConnectionManagerConfig, DatabaseConfig};
use super::logging::LoggingConfig;
use super::monitor::{PerformanceConfig, PoolMonitorConfig};
use crate::error::{ConfigError, Result};

/// Environment variable overriding [`DatabaseConfig::url`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// SQLite database and pool settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Retry, timeout and probe settings of the connection manager.
    #[serde(default)]
    pub manager: ConnectionManagerConfig,

    /// Rolling window size and health thresholds of the pool monitor.
    #[serde(default)]
    pub pool_monitor: PoolMonitorConfig,

    /// Alert thresholds and sampling of the performance monitor.
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Cleanup scheduler tick and task intervals.
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config = Self::parse_toml(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but falls back to defaults when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is unreadable or invalid.
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `DATABASE_URL` when set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.database.url = url;
            }
        }
    }

    /// Initialize the tracing subscriber from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Validate configuration values.
    ///
    /// Checks that required fields are present and values are within
    /// acceptable ranges.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "url" }.into());
        }
        if self.database.max_connections == 0 {
            return Err(invalid("max_connections", "must be greater than 0"));
        }
        if self.database.acquire_timeout_ms == 0 {
            return Err(invalid("acquire_timeout_ms", "must be greater than 0"));
        }

        let manager = &self.manager;
        if manager.query_timeout_ms == 0 {
            return Err(invalid("query_timeout_ms", "must be greater than 0"));
        }
        if manager.transaction_timeout_ms == 0 {
            return Err(invalid("transaction_timeout_ms", "must be greater than 0"));
        }
        if manager.health_check_timeout_ms == 0 {
            return Err(invalid("health_check_timeout_ms", "must be greater than 0"));
        }
        if manager.retry_max_delay_ms < manager.retry_base_delay_ms {
            return Err(invalid(
                "retry_max_delay_ms",
                "must be >= retry_base_delay_ms",
            ));
        }
        if !(0.0..=1.0).contains(&manager.retry_jitter_ratio) {
            return Err(invalid("retry_jitter_ratio", "must be between 0 and 1"));
        }

        let pool = &self.pool_monitor;
        if pool.history_capacity == 0 {
            return Err(invalid("history_capacity", "must be greater than 0"));
        }
        for (field, rate) in [
            ("degraded_failure_rate", pool.degraded_failure_rate),
            ("unhealthy_failure_rate", pool.unhealthy_failure_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(invalid(field, "must be between 0 and 1"));
            }
        }
        if pool.degraded_failure_rate > pool.unhealthy_failure_rate {
            return Err(invalid(
                "degraded_failure_rate",
                "must be <= unhealthy_failure_rate",
            ));
        }
        if pool.degraded_acquire_latency_ms <= 0.0 {
            return Err(invalid(
                "degraded_acquire_latency_ms",
                "must be greater than 0",
            ));
        }

        let perf = &self.performance;
        if perf.slow_query_ms <= 0.0 || perf.slow_request_ms <= 0.0 {
            return Err(invalid(
                "slow_thresholds",
                "slow_query_ms and slow_request_ms must be greater than 0",
            ));
        }
        if perf.duration_buckets_ms.is_empty() {
            return Err(invalid("duration_buckets_ms", "must not be empty"));
        }
        if perf.duration_buckets_ms.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(invalid(
                "duration_buckets_ms",
                "bounds must be finite and greater than 0",
            ));
        }
        if perf.duration_buckets_ms.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid(
                "duration_buckets_ms",
                "bounds must be strictly increasing",
            ));
        }
        if perf.sample_interval_ms == 0 {
            return Err(invalid("sample_interval_ms", "must be greater than 0"));
        }

        let cleanup = &self.cleanup;
        if cleanup.tick_interval_ms == 0
            || cleanup.pool_trim_interval_ms == 0
            || cleanup.pool_history_max_age_ms == 0
            || cleanup.performance_reset_interval_ms == 0
            || cleanup.alert_prune_interval_ms == 0
            || cleanup.memory_reclaim_interval_ms == 0
        {
            return Err(invalid(
                "cleanup_intervals",
                "tick and task intervals must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = Config::parse_toml("").unwrap();

        assert_eq!(config.database.url, "shiftlog.db");
        assert_eq!(config.manager.max_retries, 3);
        assert_eq!(config.pool_monitor.history_capacity, 1_000);
        assert_eq!(config.cleanup.tick_interval_ms, 1_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn sections_override_defaults() {
        let toml = r#"
[manager]
max_retries = 2
retry_base_delay_ms = 10

[pool_monitor]
history_capacity = 5
unhealthy_failure_rate = 0.5
"#;
        let config = Config::parse_toml(toml).unwrap();

        assert_eq!(config.manager.max_retries, 2);
        assert_eq!(config.manager.retry_base_delay_ms, 10);
        assert_eq!(config.manager.query_timeout_ms, 30_000);
        assert_eq!(config.pool_monitor.history_capacity, 5);
        assert!((config.pool_monitor.unhealthy_failure_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_zero_history_capacity() {
        let result = Config::parse_toml("[pool_monitor]\nhistory_capacity = 0\n");
        assert!(matches!(
            result,
            Err(crate::error::Error::Config(ConfigError::InvalidValue {
                field: "history_capacity",
                ..
            }))
        ));
    }

    #[test]
    fn rejects_unordered_buckets() {
        let result = Config::parse_toml("[performance]\nduration_buckets_ms = [10.0, 5.0]\n");
        assert!(matches!(
            result,
            Err(crate::error::Error::Config(ConfigError::InvalidValue {
                field: "duration_buckets_ms",
                ..
            }))
        ));
    }

    #[test]
    fn rejects_degraded_rate_above_unhealthy() {
        let toml = "[pool_monitor]\ndegraded_failure_rate = 0.6\nunhealthy_failure_rate = 0.5\n";
        assert!(Config::parse_toml(toml).is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        let result = Config::parse_toml("[manager\nmax_retries = ");
        assert!(matches!(
            result,
            Err(crate::error::Error::Config(ConfigError::Parse(_)))
        ));
    }
}
