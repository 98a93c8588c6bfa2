//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use crate::infrastructure::config::{
    CleanupConfig, ConnectionManagerConfig, PerformanceConfig, PoolMonitorConfig,
};

/// Manager config with the given retry budget, a 10ms backoff seed and no jitter.
pub fn manager(max_retries: u32) -> ConnectionManagerConfig {
    ConnectionManagerConfig {
        max_retries,
        retry_base_delay_ms: 10,
        retry_max_delay_ms: 1_000,
        retry_jitter_ratio: 0.0,
        query_timeout_ms: 1_000,
        transaction_timeout_ms: 2_000,
        health_check_timeout_ms: 500,
        health_degraded_latency_ms: 200,
    }
}

/// Pool monitor config with the given window and an unhealthy threshold of 0.5.
pub fn pool_monitor(history_capacity: usize) -> PoolMonitorConfig {
    PoolMonitorConfig {
        history_capacity,
        degraded_failure_rate: 0.2,
        unhealthy_failure_rate: 0.5,
        degraded_acquire_latency_ms: 100.0,
        export: true,
    }
}

/// Performance config with low thresholds and no alert cooldown.
pub fn performance() -> PerformanceConfig {
    PerformanceConfig {
        slow_query_ms: 100.0,
        slow_request_ms: 200.0,
        duration_buckets_ms: vec![10.0, 100.0, 1_000.0],
        sample_interval_ms: 1_000,
        memory_alert_bytes: u64::MAX,
        alert_cooldown_ms: 0,
    }
}

/// Scheduler config ticking every 100ms.
pub fn cleanup() -> CleanupConfig {
    CleanupConfig {
        tick_interval_ms: 100,
        pool_trim_interval_ms: 1_000,
        pool_history_max_age_ms: 60_000,
        performance_reset_interval_ms: 10_000,
        alert_prune_interval_ms: 1_000,
        memory_reclaim_interval_ms: 5_000,
    }
}
