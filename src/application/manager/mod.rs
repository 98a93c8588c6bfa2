//! Database connection manager.
//!
//! Every data operation goes through the manager, which bounds it with a
//! timeout, retries transient failures with exponential backoff, and
//! reports each attempt to the [`ConnectionPoolMonitor`] and each completed
//! operation to the [`PerformanceMonitor`] as an [`OperationRecord`].
//!
//! # Timeouts
//!
//! The query timeout covers the whole operation: every attempt and every
//! backoff sleep share one deadline, and a retry whose backoff would outlive
//! it is not started. A timeout abandons the wait, not the work: a blocking backend call that
//! is already running keeps running on its worker thread. Transactions
//! additionally hand their deadline to the backend, which refuses to commit
//! once it has passed.

mod retry;
mod stats;


use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{sleep, timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

pub use retry::Backoff;
pub use stats::ManagerStatistics;

use crate::application::performance::PerformanceMonitor;
use crate::application::pool_monitor::ConnectionPoolMonitor;
use crate::domain::{HealthVerdict, OperationRecord};
use crate::error::DataAccessError;
use crate::infrastructure::config::ConnectionManagerConfig;
use crate::port::{
    BackendError, DatabaseService, ErrorClass, RetryClassifier, StepFailure, TransactionStep,
};

/// Outcome of a single health probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthProbe {
    pub verdict: HealthVerdict,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

/// Timeout, retry and reporting layer over a [`DatabaseService`].
pub struct DatabaseConnectionManager<S: DatabaseService> {
    config: Arc<ConnectionManagerConfig>,
    service: S,
    classifier: Arc<dyn RetryClassifier>,
    pool_monitor: Arc<ConnectionPoolMonitor>,
    performance: Arc<PerformanceMonitor>,
    backoff: Backoff,
    counters: stats::Counters,
    closed: AtomicBool,
}

impl<S: DatabaseService> DatabaseConnectionManager<S> {
    pub fn new(
        config: Arc<ConnectionManagerConfig>,
        service: S,
        classifier: Arc<dyn RetryClassifier>,
        pool_monitor: Arc<ConnectionPoolMonitor>,
        performance: Arc<PerformanceMonitor>,
    ) -> Self {
        Self {
            backoff: Backoff::from_config(&config),
            config,
            service,
            classifier,
            pool_monitor,
            performance,
            counters: stats::Counters::default(),
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionManagerConfig {
        &self.config
    }

    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    #[must_use]
    pub fn pool_monitor(&self) -> &Arc<ConnectionPoolMonitor> {
        &self.pool_monitor
    }

    #[must_use]
    pub fn performance(&self) -> &Arc<PerformanceMonitor> {
        &self.performance
    }

    fn ensure_open(&self) -> Result<(), DataAccessError> {
        if self.closed.load(Ordering::Acquire) {
            Err(DataAccessError::ShutDown)
        } else {
            Ok(())
        }
    }

    /// Run `op` on a backend connection with timeout and retry.
    ///
    /// `op` may be invoked once per attempt, so it must be safe to re-run.
    ///
    /// # Errors
    ///
    /// - [`DataAccessError::Timeout`] when the operation, retries and backoff
    ///   included, runs past `query_timeout_ms`
    /// - [`DataAccessError::NonRetryableFailure`] for permanent backend errors
    /// - [`DataAccessError::RetryExhausted`] after `max_retries` retries
    /// - [`DataAccessError::ShutDown`] after [`shutdown`](Self::shutdown)
    pub async fn execute_query<T, F>(&self, name: &str, op: F) -> Result<T, DataAccessError>
    where
        F: Fn(&mut S::Connection) -> Result<T, BackendError> + Send + Sync + 'static,
        T: Send + 'static,
    {
        self.ensure_open()?;

        let op = Arc::new(op);
        let budget = Duration::from_millis(self.config.query_timeout_ms);
        let started = Instant::now();
        let deadline = started + budget;
        let mut attempt: u32 = 0;

        let outcome = loop {
            let attempt_started = Instant::now();
            let op = Arc::clone(&op);
            let result = timeout_at(deadline, self.service.execute(move |conn| op(conn))).await;
            let attempt_ms = elapsed_ms(attempt_started);

            match result {
                Ok(Ok(value)) => {
                    self.pool_monitor.record_release(attempt_ms);
                    break Ok(value);
                }
                Ok(Err(error)) => {
                    self.pool_monitor.record_failure(error.to_string());
                    match self.classifier.classify(&error) {
                        ErrorClass::NonRetryable => {
                            debug!(operation = name, error = %error, "Non-retryable failure");
                            break Err(DataAccessError::NonRetryableFailure(error));
                        }
                        ErrorClass::Retryable if attempt >= self.config.max_retries => {
                            warn!(
                                operation = name,
                                attempts = attempt + 1,
                                error = %error,
                                "Retries exhausted"
                            );
                            break Err(DataAccessError::RetryExhausted {
                                operation: name.to_string(),
                                attempts: attempt + 1,
                                last: error,
                            });
                        }
                        ErrorClass::Retryable => {
                            let delay = self.backoff.delay(attempt);
                            if deadline.saturating_duration_since(Instant::now()) <= delay {
                                debug!(
                                    operation = name,
                                    attempts = attempt + 1,
                                    delay_ms = delay.as_millis() as u64,
                                    "Backoff would outlive the query timeout"
                                );
                                break Err(self.query_timed_out(name));
                            }
                            self.counters.record_retry();
                            warn!(
                                operation = name,
                                attempt = attempt + 1,
                                delay_ms = delay.as_millis() as u64,
                                error = %error,
                                "Retryable failure, backing off"
                            );
                            sleep(delay).await;
                            attempt += 1;
                        }
                    }
                }
                Err(_) => {
                    self.pool_monitor
                        .record_failure(format!("timed out after {}ms", budget.as_millis()));
                    break Err(self.query_timed_out(name));
                }
            }
        };

        self.finish(name, started, outcome.is_ok());
        outcome
    }

    fn query_timed_out(&self, name: &str) -> DataAccessError {
        self.counters.record_timeout();
        warn!(
            operation = name,
            timeout_ms = self.config.query_timeout_ms,
            "Query timed out"
        );
        DataAccessError::Timeout {
            operation: name.to_string(),
            timeout_ms: self.config.query_timeout_ms,
        }
    }

    /// Run `steps` in one backend transaction bounded by
    /// `transaction_timeout_ms`. Transactions are never retried.
    ///
    /// # Errors
    ///
    /// - [`DataAccessError::TransactionAborted`] when a step fails; every
    ///   earlier step has been rolled back
    /// - [`DataAccessError::Timeout`] when the deadline passes first
    /// - [`DataAccessError::ShutDown`] after [`shutdown`](Self::shutdown)
    pub async fn execute_transaction(
        &self,
        name: &str,
        steps: Vec<TransactionStep<S::Connection>>,
    ) -> Result<(), DataAccessError> {
        self.ensure_open()?;

        let budget = Duration::from_millis(self.config.transaction_timeout_ms);
        let started = Instant::now();
        let deadline = std::time::Instant::now() + budget;
        let step_count = steps.len();

        let outcome = match timeout(budget, self.service.transaction(steps, deadline)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(StepFailure {
                cause: BackendError::DeadlineExceeded,
                ..
            }))
            | Err(_) => Err(DataAccessError::Timeout {
                operation: name.to_string(),
                timeout_ms: self.config.transaction_timeout_ms,
            }),
            Ok(Err(StepFailure { step, cause })) => Err(DataAccessError::TransactionAborted {
                operation: name.to_string(),
                step,
                cause,
            }),
        };

        match &outcome {
            Ok(()) => {
                self.pool_monitor.record_release(elapsed_ms(started));
                debug!(operation = name, steps = step_count, "Transaction committed");
            }
            Err(error) => {
                if matches!(error, DataAccessError::Timeout { .. }) {
                    self.counters.record_timeout();
                }
                self.pool_monitor.record_failure(error.to_string());
                warn!(operation = name, error = %error, "Transaction rolled back");
            }
        }

        self.finish(name, started, outcome.is_ok());
        outcome
    }

    fn finish(&self, name: &str, started: Instant, success: bool) {
        let record = OperationRecord::new(name, elapsed_ms(started), success);
        self.counters.record_operation(record.duration_ms, record.success);
        self.performance.record_operation(&record);
    }

    /// Probe the backend with its cheapest round trip. Never retries.
    pub async fn health_check(&self) -> HealthProbe {
        if self.closed.load(Ordering::Acquire) {
            return HealthProbe {
                verdict: HealthVerdict::Unhealthy,
                latency_ms: 0.0,
                error: Some(DataAccessError::ShutDown.to_string()),
            };
        }

        let budget = Duration::from_millis(self.config.health_check_timeout_ms);
        let started = Instant::now();
        let result = timeout(budget, self.service.ping()).await;
        let latency_ms = elapsed_ms(started);

        let (verdict, error) = match result {
            Ok(Ok(())) if latency_ms > self.config.health_degraded_latency_ms as f64 => {
                (HealthVerdict::Degraded, None)
            }
            Ok(Ok(())) => (HealthVerdict::Healthy, None),
            Ok(Err(error)) => (HealthVerdict::Unhealthy, Some(error.to_string())),
            Err(_) => (
                HealthVerdict::Unhealthy,
                Some(format!(
                    "health check timed out after {}ms",
                    self.config.health_check_timeout_ms
                )),
            ),
        };

        debug!(verdict = %verdict, latency_ms, "Database health probe");
        HealthProbe {
            verdict,
            latency_ms,
            error,
        }
    }

    #[must_use]
    pub fn statistics(&self) -> ManagerStatistics {
        self.counters.snapshot()
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Release the database handle. Only the first call closes it.
    ///
    /// # Errors
    ///
    /// Returns [`DataAccessError::ShutDown`] when already shut down.
    pub fn shutdown(&self) -> Result<(), DataAccessError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(DataAccessError::ShutDown);
        }
        self.service.close();
        info!("Database connection manager shut down");
        Ok(())
    }
}
