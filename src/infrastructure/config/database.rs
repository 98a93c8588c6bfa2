//! Database and connection-manager configuration.

use serde::Deserialize;

/// SQLite database and pool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path or URL of the SQLite database.
    ///
    /// Overridden by the `DATABASE_URL` environment variable.
    #[serde(default = "default_url")]
    pub url: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a checkout waits for a free connection (milliseconds).
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    /// SQLite `busy_timeout` applied to every new connection (milliseconds).
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_url() -> String {
    "shiftlog.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_acquire_timeout_ms() -> u64 {
    5_000
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Retry, timeout and probe settings for the connection manager.
///
/// Immutable after construction; the manager shares it by reference.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionManagerConfig {
    /// Retries after the first attempt for retryable failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff seed: attempt `n` waits `base * 2^n` (milliseconds).
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Upper bound on a single backoff delay (milliseconds).
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Extra random delay as a fraction of the backoff (0.0 disables jitter).
    #[serde(default)]
    pub retry_jitter_ratio: f64,
    /// Budget for a whole query operation, retries and backoff included (milliseconds).
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Whole-transaction budget (milliseconds).
    #[serde(default = "default_transaction_timeout_ms")]
    pub transaction_timeout_ms: u64,
    /// Budget for the health probe (milliseconds).
    #[serde(default = "default_health_check_timeout_ms")]
    pub health_check_timeout_ms: u64,
    /// Probe latency above which the database is reported degraded (milliseconds).
    #[serde(default = "default_health_degraded_latency_ms")]
    pub health_degraded_latency_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_base_delay_ms() -> u64 {
    100
}

const fn default_retry_max_delay_ms() -> u64 {
    5_000
}

const fn default_query_timeout_ms() -> u64 {
    30_000
}

const fn default_transaction_timeout_ms() -> u64 {
    60_000
}

const fn default_health_check_timeout_ms() -> u64 {
    2_000
}

const fn default_health_degraded_latency_ms() -> u64 {
    500
}

impl Default for ConnectionManagerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            retry_jitter_ratio: 0.0,
            query_timeout_ms: default_query_timeout_ms(),
            transaction_timeout_ms: default_transaction_timeout_ms(),
            health_check_timeout_ms: default_health_check_timeout_ms(),
            health_degraded_latency_ms: default_health_degraded_latency_ms(),
        }
    }
}
