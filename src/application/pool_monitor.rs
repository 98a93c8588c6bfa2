//! Connection pool monitor.
//!
//! Observes individual connection checkouts (acquire, release, failure) in a
//! bounded rolling window and derives aggregate metrics and a health verdict
//! from that window. The monitor never owns connections itself.
//!
//! Two observers feed the window. The connection manager reports one outcome
//! per operation attempt (`record_release` / `record_failure`); the pool
//! reports raw checkouts, checkins and checkout timeouts (`record_checkout`,
//! `record_checkin`, `record_checkout_timeout`). Failure rate and hold
//! duration are computed over manager outcomes only, while acquire latency
//! and exhaustion come from either side.
//!
//! # Thread Safety
//!
//! The window is guarded by a single `parking_lot::Mutex`; every recording
//! call takes it briefly and never calls into another component while
//! holding it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::application::metrics::MetricsRecorder;
use crate::domain::{ConnectionEvent, ConnectionEventKind, HealthVerdict};
use crate::infrastructure::config::PoolMonitorConfig;

const GAUGE_ACQUIRE_LATENCY: &str = "db_pool_acquire_latency_ms";
const GAUGE_HOLD_DURATION: &str = "db_pool_hold_duration_ms";
const GAUGE_FAILURE_RATE: &str = "db_pool_failure_rate";
const GAUGE_WINDOW_EVENTS: &str = "db_pool_window_events";
const GAUGE_HEALTH: &str = "db_pool_health";

/// Aggregates over the current history window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolMetrics {
    pub average_acquire_latency_ms: f64,
    pub average_hold_duration_ms: f64,
    /// `failures / (failures + releases)`; zero when nothing completed yet.
    pub failure_rate: f64,
    pub total_events: usize,
    pub acquires: usize,
    /// Successful manager attempts.
    pub releases: usize,
    /// Failed manager attempts.
    pub failures: usize,
    /// Connections returned to the pool, as reported by the pool.
    pub checkins: usize,
    pub exhaustions: usize,
}

/// Bounded-window observer of connection lifecycle events.
pub struct ConnectionPoolMonitor {
    config: PoolMonitorConfig,
    history: Mutex<VecDeque<ConnectionEvent>>,
    recorder: Option<Arc<MetricsRecorder>>,
}

impl ConnectionPoolMonitor {
    /// Create a monitor with the given window size and thresholds.
    ///
    /// A zero `history_capacity` is raised to one so the window can always
    /// hold the latest event.
    #[must_use]
    pub fn new(mut config: PoolMonitorConfig) -> Self {
        config.history_capacity = config.history_capacity.max(1);
        Self {
            history: Mutex::new(VecDeque::with_capacity(config.history_capacity)),
            config,
            recorder: None,
        }
    }

    /// Attach a recorder that [`export`](Self::export) publishes gauges to.
    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<MetricsRecorder>) -> Self {
        recorder.describe_gauge(
            GAUGE_ACQUIRE_LATENCY,
            "Average connection acquire latency over the monitor window",
        );
        recorder.describe_gauge(
            GAUGE_HOLD_DURATION,
            "Average connection hold duration over the monitor window",
        );
        recorder.describe_gauge(
            GAUGE_FAILURE_RATE,
            "Share of failed checkouts over the monitor window",
        );
        recorder.describe_gauge(GAUGE_WINDOW_EVENTS, "Events in the monitor window");
        recorder.describe_gauge(
            GAUGE_HEALTH,
            "Pool health verdict (0 healthy, 1 degraded, 2 unhealthy)",
        );
        self.recorder = Some(recorder);
        self
    }

    #[must_use]
    pub fn config(&self) -> &PoolMonitorConfig {
        &self.config
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.history_capacity
    }

    fn push(&self, event: ConnectionEvent) {
        let mut history = self.history.lock();
        while history.len() >= self.config.history_capacity {
            history.pop_front();
        }
        history.push_back(event);
    }

    /// A connection was checked out after waiting `latency_ms`.
    pub fn record_acquire(&self, latency_ms: f64) {
        self.push(ConnectionEvent::acquire(latency_ms));
    }

    /// A connection was returned after being held for `duration_ms`.
    pub fn record_release(&self, duration_ms: f64) {
        self.push(ConnectionEvent::release(duration_ms));
    }

    pub fn record_failure(&self, error: impl Into<String>) {
        self.push(ConnectionEvent::failure(error));
    }

    /// No connection became available within `timeout_ms`.
    pub fn record_exhaustion(&self, timeout_ms: f64) {
        self.push(ConnectionEvent::exhaustion(timeout_ms));
    }

    /// The pool handed out a connection after `latency_ms`.
    pub fn record_checkout(&self, latency_ms: f64) {
        self.push(ConnectionEvent::acquire(latency_ms).from_pool());
    }

    /// The pool got a connection back after `held_ms`.
    pub fn record_checkin(&self, held_ms: f64) {
        self.push(ConnectionEvent::release(held_ms).from_pool());
    }

    /// The pool gave up waiting for a free connection after `timeout_ms`.
    pub fn record_checkout_timeout(&self, timeout_ms: f64) {
        self.push(ConnectionEvent::exhaustion(timeout_ms).from_pool());
    }

    /// Copy of the window, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<ConnectionEvent> {
        self.history.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }

    /// Aggregates over the current window (not all-time totals).
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let history = self.history.lock();
        let mut metrics = PoolMetrics {
            total_events: history.len(),
            ..PoolMetrics::default()
        };
        let mut acquire_total = 0.0;
        let mut hold_total = 0.0;

        for event in history.iter() {
            match event.kind {
                ConnectionEventKind::Acquire => {
                    metrics.acquires += 1;
                    acquire_total += event.duration_ms;
                }
                ConnectionEventKind::Release if event.is_outcome() => {
                    metrics.releases += 1;
                    hold_total += event.duration_ms;
                }
                ConnectionEventKind::Release => metrics.checkins += 1,
                ConnectionEventKind::Failure => {
                    if event.is_outcome() {
                        metrics.failures += 1;
                    }
                    if event.exhausted {
                        metrics.exhaustions += 1;
                    }
                }
            }
        }
        drop(history);

        if metrics.acquires > 0 {
            metrics.average_acquire_latency_ms = acquire_total / metrics.acquires as f64;
        }
        if metrics.releases > 0 {
            metrics.average_hold_duration_ms = hold_total / metrics.releases as f64;
        }
        let outcomes = metrics.failures + metrics.releases;
        if outcomes > 0 {
            metrics.failure_rate = metrics.failures as f64 / outcomes as f64;
        }
        metrics
    }

    /// Health verdict for the current window.
    #[must_use]
    pub fn health_status(&self) -> HealthVerdict {
        self.verdict_for(&self.metrics())
    }

    fn verdict_for(&self, metrics: &PoolMetrics) -> HealthVerdict {
        if metrics.failure_rate > self.config.unhealthy_failure_rate || metrics.exhaustions > 0 {
            HealthVerdict::Unhealthy
        } else if metrics.failure_rate > self.config.degraded_failure_rate
            || metrics.average_acquire_latency_ms > self.config.degraded_acquire_latency_ms
        {
            HealthVerdict::Degraded
        } else {
            HealthVerdict::Healthy
        }
    }

    /// Clear the window.
    pub fn reset(&self) {
        let cleared = {
            let mut history = self.history.lock();
            let n = history.len();
            history.clear();
            n
        };
        debug!(cleared, "Pool monitor history reset");
    }

    /// Drop events older than `max_age`. Returns how many were removed.
    pub fn trim_older_than(&self, max_age: Duration) -> usize {
        let mut history = self.history.lock();
        let before = history.len();
        while history
            .front()
            .is_some_and(|event| event.recorded_at.elapsed() > max_age)
        {
            history.pop_front();
        }
        before - history.len()
    }

    /// Publish the window aggregates as gauges, when a recorder is attached
    /// and export is enabled.
    pub fn export(&self) {
        let Some(recorder) = self.recorder.as_ref().filter(|_| self.config.export) else {
            return;
        };
        let metrics = self.metrics();
        let verdict = self.verdict_for(&metrics);
        recorder.set_gauge(GAUGE_ACQUIRE_LATENCY, &[], metrics.average_acquire_latency_ms);
        recorder.set_gauge(GAUGE_HOLD_DURATION, &[], metrics.average_hold_duration_ms);
        recorder.set_gauge(GAUGE_FAILURE_RATE, &[], metrics.failure_rate);
        recorder.set_gauge(GAUGE_WINDOW_EVENTS, &[], metrics.total_events as f64);
        recorder.set_gauge(GAUGE_HEALTH, &[], f64::from(verdict as u8));
    }
}
