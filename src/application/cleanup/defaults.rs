//! Built-in cleanup tasks.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::CleanupScheduler;
use crate::application::performance::PerformanceMonitor;
use crate::application::pool_monitor::ConnectionPoolMonitor;
use crate::port::MemoryReclaimer;

pub const POOL_MONITOR_TRIM: &str = "pool_monitor_trim";
pub const PERFORMANCE_RESET: &str = "performance_reset";
pub const ALERT_COOLDOWN_PRUNE: &str = "alert_cooldown_prune";
pub const MEMORY_RECLAIM: &str = "memory_reclaim";

impl CleanupScheduler {
    /// Register the standard maintenance tasks with intervals from
    /// [`CleanupConfig`](crate::infrastructure::config::CleanupConfig).
    pub fn register_default_tasks(
        &self,
        pool_monitor: Arc<ConnectionPoolMonitor>,
        performance: Arc<PerformanceMonitor>,
        reclaimer: Arc<dyn MemoryReclaimer>,
    ) {
        let config = self.config().clone();

        let max_age = Duration::from_millis(config.pool_history_max_age_ms);
        self.register_task(
            POOL_MONITOR_TRIM,
            Duration::from_millis(config.pool_trim_interval_ms),
            move || {
                let removed = pool_monitor.trim_older_than(max_age);
                debug!(removed, "Trimmed pool monitor history");
                Ok(())
            },
        );

        let perf = Arc::clone(&performance);
        self.register_task(
            PERFORMANCE_RESET,
            Duration::from_millis(config.performance_reset_interval_ms),
            move || {
                perf.reset();
                Ok(())
            },
        );

        self.register_task(
            ALERT_COOLDOWN_PRUNE,
            Duration::from_millis(config.alert_prune_interval_ms),
            move || {
                let pruned = performance.prune_alert_cooldowns();
                debug!(pruned, "Pruned alert cooldowns");
                Ok(())
            },
        );

        self.register_task(
            MEMORY_RECLAIM,
            Duration::from_millis(config.memory_reclaim_interval_ms),
            move || {
                let released = reclaimer.reclaim();
                debug!(reclaimer = reclaimer.name(), released, "Requested memory reclamation");
                Ok(())
            },
        );
    }
}
