//! Resource cleanup scheduler configuration.

use serde::Deserialize;

/// Run-loop tick and per-task intervals for the default cleanup tasks.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// How often the run loop evaluates due tasks (milliseconds).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Interval of the pool-history trim task (milliseconds).
    #[serde(default = "default_pool_trim_interval_ms")]
    pub pool_trim_interval_ms: u64,
    /// Pool events older than this are dropped by the trim task (milliseconds).
    #[serde(default = "default_pool_history_max_age_ms")]
    pub pool_history_max_age_ms: u64,
    /// Interval of the performance counter reset task (milliseconds).
    #[serde(default = "default_performance_reset_interval_ms")]
    pub performance_reset_interval_ms: u64,
    /// Interval of the alert cooldown prune task (milliseconds).
    #[serde(default = "default_alert_prune_interval_ms")]
    pub alert_prune_interval_ms: u64,
    /// Interval of the memory reclamation hint (milliseconds).
    #[serde(default = "default_memory_reclaim_interval_ms")]
    pub memory_reclaim_interval_ms: u64,
}

const fn default_tick_interval_ms() -> u64 {
    1_000
}

const fn default_pool_trim_interval_ms() -> u64 {
    60_000
}

const fn default_pool_history_max_age_ms() -> u64 {
    300_000 // 5 minutes
}

const fn default_performance_reset_interval_ms() -> u64 {
    86_400_000 // 24 hours
}

const fn default_alert_prune_interval_ms() -> u64 {
    300_000
}

const fn default_memory_reclaim_interval_ms() -> u64 {
    600_000
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            pool_trim_interval_ms: default_pool_trim_interval_ms(),
            pool_history_max_age_ms: default_pool_history_max_age_ms(),
            performance_reset_interval_ms: default_performance_reset_interval_ms(),
            alert_prune_interval_ms: default_alert_prune_interval_ms(),
            memory_reclaim_interval_ms: default_memory_reclaim_interval_ms(),
        }
    }
}
