//! Resource cleanup scheduler.
//!
//! Runs owner-provided maintenance closures (history trimming, counter
//! resets, memory reclamation) on per-task intervals. The scheduler owns no
//! data of its own.
//!
//! # Failure isolation
//!
//! A task that returns an error or panics is logged and counted; the other
//! tasks and the run loop carry on. Runs are serialized across the loop and
//! manual calls, so two tasks never execute at the same time.
//!
//! Actions are synchronous and may block (trimming under a lock, calling
//! into the allocator), so each one runs on tokio's blocking pool.

mod defaults;
mod task;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub use defaults::{ALERT_COOLDOWN_PRUNE, MEMORY_RECLAIM, PERFORMANCE_RESET, POOL_MONITOR_TRIM};
pub use task::{CleanupAction, CleanupMetrics, TaskInfo};

use crate::error::CleanupError;
use crate::infrastructure::config::CleanupConfig;
use task::CleanupTask;

#[derive(Default)]
struct Totals {
    runs: u64,
    failures: u64,
    last_error: Option<String>,
}

struct Runner {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Interval-gated runner for named cleanup tasks.
pub struct CleanupScheduler {
    config: CleanupConfig,
    tasks: Mutex<BTreeMap<String, CleanupTask>>,
    totals: Mutex<Totals>,
    run_lock: tokio::sync::Mutex<()>,
    runner: Mutex<Option<Runner>>,
}

impl CleanupScheduler {
    #[must_use]
    pub fn new(config: CleanupConfig) -> Self {
        Self {
            config,
            tasks: Mutex::new(BTreeMap::new()),
            totals: Mutex::new(Totals::default()),
            run_lock: tokio::sync::Mutex::new(()),
            runner: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    /// Register or replace a task. A replaced task keeps its enabled flag;
    /// a new one starts enabled.
    pub fn register_task<F>(&self, name: impl Into<String>, interval: Duration, action: F)
    where
        F: Fn() -> Result<(), CleanupError> + Send + Sync + 'static,
    {
        let name = name.into();
        let enabled = self.tasks.lock().get(&name).map_or(true, |t| t.enabled);
        self.register_task_with(name, interval, enabled, action);
    }

    /// Register or replace a task with an explicit enabled flag.
    pub fn register_task_with<F>(
        &self,
        name: impl Into<String>,
        interval: Duration,
        enabled: bool,
        action: F,
    ) where
        F: Fn() -> Result<(), CleanupError> + Send + Sync + 'static,
    {
        let name = name.into();
        let action: CleanupAction = Arc::new(action);
        let replaced = self
            .tasks
            .lock()
            .insert(name.clone(), CleanupTask::new(interval, enabled, action))
            .is_some();
        debug!(
            task = %name,
            interval_ms = interval.as_millis() as u64,
            enabled,
            replaced,
            "Cleanup task registered"
        );
    }

    /// Returns `false` if no such task existed.
    pub fn unregister_task(&self, name: &str) -> bool {
        self.tasks.lock().remove(name).is_some()
    }

    /// # Errors
    ///
    /// Returns [`CleanupError::UnknownTask`] if the task is not registered.
    pub fn enable_task(&self, name: &str) -> Result<(), CleanupError> {
        self.set_enabled(name, true)
    }

    /// # Errors
    ///
    /// Returns [`CleanupError::UnknownTask`] if the task is not registered.
    pub fn disable_task(&self, name: &str) -> Result<(), CleanupError> {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), CleanupError> {
        let mut tasks = self.tasks.lock();
        let task = tasks
            .get_mut(name)
            .ok_or_else(|| CleanupError::UnknownTask(name.to_string()))?;
        task.enabled = enabled;
        Ok(())
    }

    #[must_use]
    pub fn task_names(&self) -> Vec<String> {
        self.tasks.lock().keys().cloned().collect()
    }

    #[must_use]
    pub fn task_info(&self, name: &str) -> Option<TaskInfo> {
        let now = Instant::now();
        self.tasks.lock().get(name).map(|t| t.info(name, now))
    }

    #[must_use]
    pub fn metrics(&self) -> CleanupMetrics {
        let now = Instant::now();
        let tasks = self
            .tasks
            .lock()
            .iter()
            .map(|(name, task)| task.info(name, now))
            .collect();
        let totals = self.totals.lock();
        CleanupMetrics {
            total_runs: totals.runs,
            failures: totals.failures,
            last_error: totals.last_error.clone(),
            tasks,
        }
    }

    /// Start the periodic run loop.
    ///
    /// Idempotent: returns `false` without starting a second loop when
    /// already running, or when called outside a tokio runtime.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut slot = self.runner.lock();
        if slot.is_some() {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime available, cleanup scheduler not started");
            return false;
        };

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let scheduler = Arc::downgrade(self);
        let period = Duration::from_millis(self.config.tick_interval_ms.max(1));

        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                let Some(scheduler) = scheduler.upgrade() else {
                    break;
                };
                scheduler.tick().await;
            }
        });

        *slot = Some(Runner { running, handle });
        info!(
            tick_ms = period.as_millis() as u64,
            tasks = self.tasks.lock().len(),
            "Cleanup scheduler started"
        );
        true
    }

    /// Stop the run loop. No tick begins after this returns.
    pub fn stop(&self) -> bool {
        let Some(runner) = self.runner.lock().take() else {
            return false;
        };
        runner.running.store(false, Ordering::SeqCst);
        runner.handle.abort();
        info!("Cleanup scheduler stopped");
        true
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.runner.lock().is_some()
    }

    /// Run every enabled task whose interval has elapsed. Returns how many ran.
    pub async fn tick(&self) -> usize {
        let _serial = self.run_lock.lock().await;
        let now = Instant::now();

        // Phase 1: pick due tasks (brief lock).
        let due: Vec<(String, CleanupAction)> = self
            .tasks
            .lock()
            .iter()
            .filter(|(_, task)| task.is_due(now))
            .map(|(name, task)| (name.clone(), Arc::clone(&task.action)))
            .collect();

        // Phase 2: run them without holding the registry lock.
        for (name, action) in &due {
            let _ = self.run_task(name, action).await;
        }
        due.len()
    }

    /// Run one task immediately, ignoring its interval and enabled flag.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::UnknownTask`] if the task is not registered,
    /// or the task's own failure.
    pub async fn run_now(&self, name: &str) -> Result<(), CleanupError> {
        let _serial = self.run_lock.lock().await;
        let action = self
            .tasks
            .lock()
            .get(name)
            .map(|task| Arc::clone(&task.action))
            .ok_or_else(|| CleanupError::UnknownTask(name.to_string()))?;
        self.run_task(name, &action).await
    }

    /// Run every enabled task immediately. Returns how many failed.
    pub async fn force_cleanup_all(&self) -> usize {
        let _serial = self.run_lock.lock().await;
        let all: Vec<(String, CleanupAction)> = self
            .tasks
            .lock()
            .iter()
            .filter(|(_, task)| task.enabled)
            .map(|(name, task)| (name.clone(), Arc::clone(&task.action)))
            .collect();

        let mut failed = 0;
        for (name, action) in &all {
            if self.run_task(name, action).await.is_err() {
                failed += 1;
            }
        }
        info!(tasks = all.len(), failed, "Forced cleanup finished");
        failed
    }

    async fn run_task(&self, name: &str, action: &CleanupAction) -> Result<(), CleanupError> {
        let started = Instant::now();
        let action = Arc::clone(action);
        let task = name.to_string();
        let result = tokio::task::spawn_blocking(move || {
            match catch_unwind(AssertUnwindSafe(|| action())) {
                Ok(result) => result,
                Err(payload) => Err(CleanupError::failed(task, panic_message(payload.as_ref()))),
            }
        })
        .await
        .unwrap_or_else(|e| Err(CleanupError::failed(name, e.to_string())));
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let failure = result.as_ref().err().map(ToString::to_string);

        if let Some(task) = self.tasks.lock().get_mut(name) {
            task.last_run_at = started;
            task.runs += 1;
            if let Some(reason) = &failure {
                task.failures += 1;
                task.last_error = Some(reason.clone());
            }
        }

        let mut totals = self.totals.lock();
        totals.runs += 1;
        match failure {
            Some(reason) => {
                totals.failures += 1;
                error!(task = name, error = %reason, "Cleanup task failed");
                totals.last_error = Some(reason);
            }
            None => debug!(task = name, elapsed_ms, "Cleanup task finished"),
        }
        result
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        if let Some(runner) = self.runner.get_mut().take() {
            runner.running.store(false, Ordering::SeqCst);
            runner.handle.abort();
        }
    }
}
