//! In-memory [`DatabaseService`] with scripted failures and delays.
//!
//! The "database" is a list of rows. Operations receive a
//! [`ScriptedConnection`] holding a working copy; `execute` writes it back
//! on success (autocommit), `transaction` only when every step succeeded
//! before the deadline.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::port::{BackendError, DatabaseService, StepFailure, TransactionStep};

/// Working copy of the rows handed to operations.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnection {
    pub rows: Vec<String>,
}

impl ScriptedConnection {
    pub fn insert(&mut self, row: impl Into<String>) -> Result<(), BackendError> {
        let row = row.into();
        if self.rows.contains(&row) {
            return Err(BackendError::Constraint(format!(
                "UNIQUE constraint failed: {row}"
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

/// Scripted database backend for manager tests.
///
/// Each `execute` call pops the next scripted error, if any, and fails with
/// it without running the operation; once the script is exhausted the
/// operation runs normally.
#[derive(Default)]
pub struct ScriptedDatabase {
    rows: Arc<Mutex<Vec<String>>>,
    execute_errors: Mutex<VecDeque<BackendError>>,
    ping_results: Mutex<VecDeque<Result<(), BackendError>>>,
    execute_delay: Duration,
    transaction_delay: Duration,
    ping_delay: Duration,
    execute_calls: Arc<AtomicU32>,
    transaction_calls: Arc<AtomicU32>,
    close_calls: Arc<AtomicU32>,
}

impl ScriptedDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `execute` calls with these errors, in order.
    pub fn with_execute_errors(self, errors: Vec<BackendError>) -> Self {
        *self.execute_errors.lock() = errors.into();
        self
    }

    /// Results returned by successive `ping` calls (then `Ok`).
    pub fn with_ping_results(self, results: Vec<Result<(), BackendError>>) -> Self {
        *self.ping_results.lock() = results.into();
        self
    }

    /// Sleep (tokio time) before each `execute`.
    pub fn with_execute_delay(mut self, delay: Duration) -> Self {
        self.execute_delay = delay;
        self
    }

    /// Sleep (tokio time) before running transaction steps.
    pub fn with_transaction_delay(mut self, delay: Duration) -> Self {
        self.transaction_delay = delay;
        self
    }

    pub fn with_ping_delay(mut self, delay: Duration) -> Self {
        self.ping_delay = delay;
        self
    }

    pub fn with_rows(self, rows: Vec<String>) -> Self {
        *self.rows.lock() = rows;
        self
    }

    /// Committed rows.
    pub fn rows(&self) -> Vec<String> {
        self.rows.lock().clone()
    }

    pub fn execute_calls(&self) -> u32 {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn transaction_calls(&self) -> u32 {
        self.transaction_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> u32 {
        self.close_calls.load(Ordering::SeqCst)
    }

    async fn pause(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DatabaseService for ScriptedDatabase {
    type Connection = ScriptedConnection;

    async fn execute<T, F>(&self, op: F) -> Result<T, BackendError>
    where
        F: FnOnce(&mut Self::Connection) -> Result<T, BackendError> + Send + 'static,
        T: Send + 'static,
    {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        Self::pause(self.execute_delay).await;

        let scripted = self.execute_errors.lock().pop_front();
        if let Some(error) = scripted {
            return Err(error);
        }

        let mut conn = ScriptedConnection {
            rows: self.rows.lock().clone(),
        };
        let value = op(&mut conn)?;
        *self.rows.lock() = conn.rows;
        Ok(value)
    }

    async fn transaction(
        &self,
        steps: Vec<TransactionStep<Self::Connection>>,
        deadline: Instant,
    ) -> Result<(), StepFailure> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        Self::pause(self.transaction_delay).await;

        let mut conn = ScriptedConnection {
            rows: self.rows.lock().clone(),
        };
        for (index, step) in steps.into_iter().enumerate() {
            if Instant::now() >= deadline {
                return Err(StepFailure {
                    step: index,
                    cause: BackendError::DeadlineExceeded,
                });
            }
            step(&mut conn).map_err(|cause| StepFailure { step: index, cause })?;
        }
        *self.rows.lock() = conn.rows;
        Ok(())
    }

    async fn ping(&self) -> Result<(), BackendError> {
        Self::pause(self.ping_delay).await;
        let scripted = self.ping_results.lock().pop_front();
        scripted.unwrap_or(Ok(()))
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}
