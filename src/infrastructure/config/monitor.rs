//! Pool monitor and performance monitor configuration.

use serde::Deserialize;

/// Connection pool monitor window and health thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolMonitorConfig {
    /// Number of connection events kept in the rolling window.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Failure rate above which the pool is degraded.
    #[serde(default = "default_degraded_failure_rate")]
    pub degraded_failure_rate: f64,
    /// Failure rate above which the pool is unhealthy.
    #[serde(default = "default_unhealthy_failure_rate")]
    pub unhealthy_failure_rate: f64,
    /// Average acquire latency above which the pool is degraded (milliseconds).
    #[serde(default = "default_degraded_acquire_latency_ms")]
    pub degraded_acquire_latency_ms: f64,
    /// Publish window metrics as gauges on every export.
    #[serde(default = "default_export")]
    pub export: bool,
}

const fn default_history_capacity() -> usize {
    1_000
}

const fn default_degraded_failure_rate() -> f64 {
    0.05
}

const fn default_unhealthy_failure_rate() -> f64 {
    0.25
}

const fn default_degraded_acquire_latency_ms() -> f64 {
    100.0
}

const fn default_export() -> bool {
    true
}

impl Default for PoolMonitorConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            degraded_failure_rate: default_degraded_failure_rate(),
            unhealthy_failure_rate: default_unhealthy_failure_rate(),
            degraded_acquire_latency_ms: default_degraded_acquire_latency_ms(),
            export: default_export(),
        }
    }
}

/// Performance monitor thresholds and sampling settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceConfig {
    /// Queries slower than this raise a slow-query alert (milliseconds).
    #[serde(default = "default_slow_query_ms")]
    pub slow_query_ms: f64,
    /// HTTP requests slower than this raise a slow-request alert (milliseconds).
    #[serde(default = "default_slow_request_ms")]
    pub slow_request_ms: f64,
    /// Upper bounds of the duration histogram buckets (milliseconds).
    #[serde(default = "default_duration_buckets_ms")]
    pub duration_buckets_ms: Vec<f64>,
    /// Self-sampling interval while monitoring (milliseconds).
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    /// Peak resident memory above which a high-memory alert is raised (bytes).
    #[serde(default = "default_memory_alert_bytes")]
    pub memory_alert_bytes: u64,
    /// Minimum gap between two alerts for the same subject (milliseconds).
    #[serde(default = "default_alert_cooldown_ms")]
    pub alert_cooldown_ms: u64,
}

const fn default_slow_query_ms() -> f64 {
    1_000.0
}

const fn default_slow_request_ms() -> f64 {
    2_000.0
}

fn default_duration_buckets_ms() -> Vec<f64> {
    vec![
        5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0,
    ]
}

const fn default_sample_interval_ms() -> u64 {
    30_000
}

const fn default_memory_alert_bytes() -> u64 {
    1024 * 1024 * 1024 // 1GB
}

const fn default_alert_cooldown_ms() -> u64 {
    60_000
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            slow_query_ms: default_slow_query_ms(),
            slow_request_ms: default_slow_request_ms(),
            duration_buckets_ms: default_duration_buckets_ms(),
            sample_interval_ms: default_sample_interval_ms(),
            memory_alert_bytes: default_memory_alert_bytes(),
            alert_cooldown_ms: default_alert_cooldown_ms(),
        }
    }
}
