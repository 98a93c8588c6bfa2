//! Performance monitor.
//!
//! Records HTTP-level, query-level and business-event timings into the
//! shared [`MetricsRecorder`], publishes threshold alerts to an
//! [`AlertSink`], and optionally samples process resource usage on a fixed
//! interval.
//!
//! # State machine
//!
//! ```text
//! Idle --start_monitoring--> Monitoring --stop_monitoring--> Idle
//! ```
//!
//! Self-sampling only ticks while monitoring. Recording works in both
//! states and never fails the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::application::metrics::MetricsRecorder;
use crate::domain::{Alert, AlertKind, OperationRecord};
use crate::infrastructure::config::PerformanceConfig;
use crate::infrastructure::process;
use crate::port::AlertSink;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_MS: &str = "http_request_duration_ms";
pub const HTTP_SERVER_ERRORS_TOTAL: &str = "http_server_errors_total";
pub const DB_QUERIES_TOTAL: &str = "db_queries_total";
pub const DB_QUERY_FAILURES_TOTAL: &str = "db_query_failures_total";
pub const DB_QUERY_DURATION_MS: &str = "db_query_duration_ms";
pub const BUSINESS_EVENTS_TOTAL: &str = "business_events_total";
pub const ALERTS_TOTAL: &str = "alerts_total";
pub const PROCESS_SAMPLES_TOTAL: &str = "process_samples_total";
pub const PROCESS_PEAK_RSS_BYTES: &str = "process_peak_rss_bytes";
pub const PROCESS_CPU_SECONDS: &str = "process_cpu_seconds";
pub const PROCESS_CPU_UTILIZATION: &str = "process_cpu_utilization";
pub const PROCESS_LOGICAL_CPUS: &str = "process_logical_cpus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Idle,
    Monitoring,
}

/// Totals used by health reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSnapshot {
    pub http_requests: u64,
    pub http_server_errors: u64,
    pub queries: u64,
    pub query_failures: u64,
    pub business_events: u64,
    pub alerts: u64,
    pub monitoring: bool,
}

struct Sampler {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Process-wide counters and histograms with threshold alerting.
pub struct PerformanceMonitor {
    config: PerformanceConfig,
    recorder: Arc<MetricsRecorder>,
    sink: Arc<dyn AlertSink>,
    cooldowns: DashMap<(AlertKind, String), Instant>,
    sampler: Mutex<Option<Sampler>>,
    last_cpu: Mutex<Option<(Instant, f64)>>,
}

impl PerformanceMonitor {
    /// Create a monitor and declare every metric it records, so that all of
    /// them are exported even before the first sample.
    #[must_use]
    pub fn new(
        config: PerformanceConfig,
        recorder: Arc<MetricsRecorder>,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        let buckets = config.duration_buckets_ms.clone();
        recorder.describe_counter(HTTP_REQUESTS_TOTAL, "HTTP requests by route and status");
        recorder.describe_histogram(
            HTTP_REQUEST_DURATION_MS,
            "HTTP request duration in milliseconds",
            &buckets,
        );
        recorder.describe_counter(HTTP_SERVER_ERRORS_TOTAL, "HTTP responses with status >= 500");
        recorder.describe_counter(DB_QUERIES_TOTAL, "Database operations by name and outcome");
        recorder.describe_counter(DB_QUERY_FAILURES_TOTAL, "Failed database operations");
        recorder.describe_histogram(
            DB_QUERY_DURATION_MS,
            "Database operation duration in milliseconds",
            &buckets,
        );
        recorder.describe_counter(BUSINESS_EVENTS_TOTAL, "Business events by name");
        recorder.describe_counter(ALERTS_TOTAL, "Threshold alerts published");
        recorder.describe_counter(PROCESS_SAMPLES_TOTAL, "Self-sampling ticks");
        recorder.describe_gauge(PROCESS_PEAK_RSS_BYTES, "Peak resident set size in bytes");
        recorder.describe_gauge(PROCESS_CPU_SECONDS, "User plus system CPU seconds");
        recorder.describe_gauge(
            PROCESS_CPU_UTILIZATION,
            "CPU utilization over the last sampling interval (0-1)",
        );
        recorder.describe_gauge(PROCESS_LOGICAL_CPUS, "Logical CPUs available");

        Self {
            config,
            recorder,
            sink,
            cooldowns: DashMap::new(),
            sampler: Mutex::new(None),
            last_cpu: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn recorder(&self) -> &Arc<MetricsRecorder> {
        &self.recorder
    }

    #[must_use]
    pub fn config(&self) -> &PerformanceConfig {
        &self.config
    }

    /// Start periodic self-sampling.
    ///
    /// Idempotent: returns `false` without starting a second timer when
    /// already monitoring, or when called outside a tokio runtime.
    pub fn start_monitoring(self: &Arc<Self>) -> bool {
        let mut slot = self.sampler.lock();
        if slot.is_some() {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime available, self-sampling not started");
            return false;
        };

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let monitor = Arc::downgrade(self);
        let period = Duration::from_millis(self.config.sample_interval_ms.max(1));

        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                let Some(monitor) = monitor.upgrade() else {
                    break;
                };
                monitor.sample_now();
            }
        });

        *slot = Some(Sampler { running, handle });
        info!(interval_ms = period.as_millis() as u64, "Performance monitoring started");
        true
    }

    /// Stop self-sampling. No tick begins after this returns; a tick
    /// already in progress may finish. Returns `false` when idle.
    pub fn stop_monitoring(&self) -> bool {
        let Some(sampler) = self.sampler.lock().take() else {
            return false;
        };
        sampler.running.store(false, Ordering::SeqCst);
        sampler.handle.abort();
        info!("Performance monitoring stopped");
        true
    }

    #[must_use]
    pub fn state(&self) -> MonitorState {
        if self.sampler.lock().is_some() {
            MonitorState::Monitoring
        } else {
            MonitorState::Idle
        }
    }

    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.state() == MonitorState::Monitoring
    }

    /// Take one process snapshot and publish it as gauges.
    pub fn sample_now(&self) {
        self.recorder.increment_counter(PROCESS_SAMPLES_TOTAL, &[], 1);
        let Some(sample) = process::sample() else {
            debug!("Process sampling unavailable on this platform");
            return;
        };

        let now = Instant::now();
        let utilization = {
            let mut last = self.last_cpu.lock();
            let utilization = last.and_then(|(at, cpu)| {
                let wall = now.duration_since(at).as_secs_f64();
                (wall > 0.0).then(|| {
                    ((sample.cpu_seconds - cpu) / (wall * sample.logical_cpus as f64))
                        .clamp(0.0, 1.0)
                })
            });
            *last = Some((now, sample.cpu_seconds));
            utilization
        };

        self.recorder
            .set_gauge(PROCESS_PEAK_RSS_BYTES, &[], sample.peak_rss_bytes as f64);
        self.recorder
            .set_gauge(PROCESS_CPU_SECONDS, &[], sample.cpu_seconds);
        self.recorder
            .set_gauge(PROCESS_LOGICAL_CPUS, &[], sample.logical_cpus as f64);
        if let Some(utilization) = utilization {
            self.recorder
                .set_gauge(PROCESS_CPU_UTILIZATION, &[], utilization);
        }

        self.check_threshold(
            AlertKind::HighMemory,
            "process",
            sample.peak_rss_bytes as f64,
            self.config.memory_alert_bytes as f64,
        );
    }

    /// Record one HTTP request.
    pub fn record_http_request(&self, route: &str, duration_ms: f64, status: u16) {
        let status_label = status.to_string();
        self.recorder.increment_counter(
            HTTP_REQUESTS_TOTAL,
            &[("route", route), ("status", &status_label)],
            1,
        );
        self.recorder
            .observe(HTTP_REQUEST_DURATION_MS, &[("route", route)], duration_ms);
        if status >= 500 {
            self.recorder
                .increment_counter(HTTP_SERVER_ERRORS_TOTAL, &[("route", route)], 1);
        }
        self.check_threshold(
            AlertKind::SlowRequest,
            route,
            duration_ms,
            self.config.slow_request_ms,
        );
    }

    /// Record one completed database operation.
    pub fn record_query(&self, name: &str, duration_ms: f64, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.recorder.increment_counter(
            DB_QUERIES_TOTAL,
            &[("query", name), ("outcome", outcome)],
            1,
        );
        if !success {
            self.recorder
                .increment_counter(DB_QUERY_FAILURES_TOTAL, &[("query", name)], 1);
        }
        self.recorder
            .observe(DB_QUERY_DURATION_MS, &[("query", name)], duration_ms);
        self.check_threshold(
            AlertKind::SlowQuery,
            name,
            duration_ms,
            self.config.slow_query_ms,
        );
    }

    /// Record a completed operation record (as produced by the connection manager).
    pub fn record_operation(&self, record: &OperationRecord) {
        self.record_query(&record.name, record.duration_ms, record.success);
    }

    pub fn record_business_event(&self, name: &str, count: u64) {
        self.recorder
            .increment_counter(BUSINESS_EVENTS_TOTAL, &[("event", name)], count);
    }

    /// Publish an alert when `value` exceeds `threshold`, unless the same
    /// subject alerted within the cooldown.
    fn check_threshold(&self, kind: AlertKind, subject: &str, value: f64, threshold: f64) {
        if value <= threshold {
            return;
        }

        let now = Instant::now();
        let cooldown = Duration::from_millis(self.config.alert_cooldown_ms);
        let allowed = match self.cooldowns.entry((kind, subject.to_string())) {
            Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) >= cooldown {
                    entry.insert(now);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        };
        if !allowed {
            debug!(kind = kind.as_str(), subject, "Alert suppressed by cooldown");
            return;
        }

        self.recorder
            .increment_counter(ALERTS_TOTAL, &[("kind", kind.as_str())], 1);
        self.sink.publish(Alert::new(kind, subject, value, threshold));
    }

    /// Drop cooldown entries that have expired. Returns how many were removed.
    pub fn prune_alert_cooldowns(&self) -> usize {
        let cooldown = Duration::from_millis(self.config.alert_cooldown_ms);
        let before = self.cooldowns.len();
        self.cooldowns.retain(|_, at| at.elapsed() < cooldown);
        before.saturating_sub(self.cooldowns.len())
    }

    #[must_use]
    pub fn pending_cooldowns(&self) -> usize {
        self.cooldowns.len()
    }

    /// Render every metric in the Prometheus text exposition format.
    #[must_use]
    pub fn export_metrics(&self) -> String {
        self.recorder.render()
    }

    /// Zero every counter, gauge and histogram. Metric names stay declared.
    pub fn reset(&self) {
        self.recorder.reset();
        debug!("Performance counters reset");
    }

    #[must_use]
    pub fn snapshot(&self) -> PerformanceSnapshot {
        PerformanceSnapshot {
            http_requests: self.recorder.counter_total(HTTP_REQUESTS_TOTAL),
            http_server_errors: self.recorder.counter_total(HTTP_SERVER_ERRORS_TOTAL),
            queries: self.recorder.counter_total(DB_QUERIES_TOTAL),
            query_failures: self.recorder.counter_total(DB_QUERY_FAILURES_TOTAL),
            business_events: self.recorder.counter_total(BUSINESS_EVENTS_TOTAL),
            alerts: self.recorder.counter_total(ALERTS_TOTAL),
            monitoring: self.is_monitoring(),
        }
    }
}

impl Drop for PerformanceMonitor {
    fn drop(&mut self) {
        if let Some(sampler) = self.sampler.get_mut().take() {
            sampler.running.store(false, Ordering::SeqCst);
            sampler.handle.abort();
        }
    }
}
