//! Database service port.
//!
//! The connection manager is the only consumer of this trait. Implementations
//! own the physical connections; the manager owns the single service handle.

use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;

/// Backend-level failure, before retry classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("database busy: {0}")]
    Busy(String),

    #[error("no connection available: {0}")]
    PoolExhausted(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{0}")]
    Other(String),
}

/// One step of a transaction, run against the backend's connection type.
pub type TransactionStep<C> = Box<dyn FnOnce(&mut C) -> Result<(), BackendError> + Send>;

/// A transaction failed; every step before `step` has been rolled back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("step {step} failed: {cause}")]
pub struct StepFailure {
    pub step: usize,
    pub cause: BackendError,
}

/// Access to the shared database.
///
/// `execute` and `transaction` may run blocking work on a separate thread.
/// Dropping the returned future abandons the wait but does not necessarily
/// stop that work.
#[async_trait]
pub trait DatabaseService: Send + Sync + 'static {
    /// Connection type handed to operations and transaction steps.
    type Connection: Send + 'static;

    /// Run a single operation on a pooled connection.
    async fn execute<T, F>(&self, op: F) -> Result<T, BackendError>
    where
        F: FnOnce(&mut Self::Connection) -> Result<T, BackendError> + Send + 'static,
        T: Send + 'static;

    /// Run `steps` in order inside one transaction.
    ///
    /// Implementations must roll back when any step fails, and must not
    /// commit once `deadline` has passed.
    async fn transaction(
        &self,
        steps: Vec<TransactionStep<Self::Connection>>,
        deadline: Instant,
    ) -> Result<(), StepFailure>;

    /// Cheapest possible round trip.
    async fn ping(&self) -> Result<(), BackendError>;

    /// Release underlying resources. Called once at shutdown.
    fn close(&self) {}
}
