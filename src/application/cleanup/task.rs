//! Cleanup task definitions.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::error::CleanupError;

/// Owner-provided cleanup work. Runs synchronously on the scheduler task.
pub type CleanupAction = Arc<dyn Fn() -> Result<(), CleanupError> + Send + Sync>;

/// A registered task and its run history.
pub(super) struct CleanupTask {
    pub(super) interval: Duration,
    pub(super) enabled: bool,
    /// Registration time until the first run.
    pub(super) last_run_at: Instant,
    pub(super) runs: u64,
    pub(super) failures: u64,
    pub(super) last_error: Option<String>,
    pub(super) action: CleanupAction,
}

impl CleanupTask {
    pub(super) fn new(interval: Duration, enabled: bool, action: CleanupAction) -> Self {
        Self {
            interval,
            enabled,
            last_run_at: Instant::now(),
            runs: 0,
            failures: 0,
            last_error: None,
            action,
        }
    }

    pub(super) fn is_due(&self, now: Instant) -> bool {
        self.enabled && now.saturating_duration_since(self.last_run_at) >= self.interval
    }

    pub(super) fn info(&self, name: &str, now: Instant) -> TaskInfo {
        TaskInfo {
            name: name.to_string(),
            interval_ms: self.interval.as_millis() as u64,
            enabled: self.enabled,
            runs: self.runs,
            failures: self.failures,
            last_error: self.last_error.clone(),
            since_last_run_ms: now.saturating_duration_since(self.last_run_at).as_millis() as u64,
        }
    }
}

/// Read-only view of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskInfo {
    pub name: String,
    pub interval_ms: u64,
    pub enabled: bool,
    pub runs: u64,
    pub failures: u64,
    pub last_error: Option<String>,
    /// Time since the last run, or since registration if it never ran.
    pub since_last_run_ms: u64,
}

/// Scheduler-wide run counters plus per-task views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupMetrics {
    pub total_runs: u64,
    pub failures: u64,
    pub last_error: Option<String>,
    pub tasks: Vec<TaskInfo>,
}
