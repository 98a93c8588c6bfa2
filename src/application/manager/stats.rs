//! Lock-free operation counters for the connection manager.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time view of the manager counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ManagerStatistics {
    pub total_operations: u64,
    pub total_failures: u64,
    pub average_latency_ms: f64,
    pub retry_count: u64,
    pub timeouts: u64,
}

#[derive(Debug, Default)]
pub(super) struct Counters {
    operations: AtomicU64,
    failures: AtomicU64,
    latency_total_us: AtomicU64,
    retries: AtomicU64,
    timeouts: AtomicU64,
}

impl Counters {
    pub(super) fn record_operation(&self, duration_ms: f64, success: bool) {
        self.operations.fetch_add(1, Ordering::Relaxed);
        self.latency_total_us
            .fetch_add((duration_ms * 1000.0) as u64, Ordering::Relaxed);
        if !success {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(super) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> ManagerStatistics {
        let total_operations = self.operations.load(Ordering::Relaxed);
        let latency_total_us = self.latency_total_us.load(Ordering::Relaxed);
        let average_latency_ms = if total_operations == 0 {
            0.0
        } else {
            latency_total_us as f64 / 1000.0 / total_operations as f64
        };
        ManagerStatistics {
            total_operations,
            total_failures: self.failures.load(Ordering::Relaxed),
            average_latency_ms,
            retry_count: self.retries.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}
