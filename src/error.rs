use thiserror::Error;

use crate::port::outbound::database::BackendError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures surfaced by the database connection manager.
///
/// Callers only ever see the final classified outcome of an operation;
/// intermediate retry attempts are absorbed by the manager.
#[derive(Error, Debug, Clone)]
pub enum DataAccessError {
    #[error("operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("operation '{operation}' failed after {attempts} attempts: {last}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        last: BackendError,
    },

    #[error("non-retryable failure: {0}")]
    NonRetryableFailure(BackendError),

    #[error("transaction '{operation}' aborted at step {step}: {cause}")]
    TransactionAborted {
        operation: String,
        step: usize,
        cause: BackendError,
    },

    #[error("connection manager has been shut down")]
    ShutDown,
}

impl DataAccessError {
    /// Short label used for metrics and log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::RetryExhausted { .. } => "retry_exhausted",
            Self::NonRetryableFailure(_) => "non_retryable",
            Self::TransactionAborted { .. } => "transaction_aborted",
            Self::ShutDown => "shut_down",
        }
    }
}

/// Cleanup scheduler errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CleanupError {
    #[error("cleanup task '{task}' failed: {reason}")]
    TaskFailed { task: String, reason: String },

    #[error("unknown cleanup task: {0}")]
    UnknownTask(String),
}

impl CleanupError {
    /// Convenience constructor for task actions.
    pub fn failed(task: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TaskFailed {
            task: task.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DataAccess(#[from] DataAccessError),

    #[error(transparent)]
    Cleanup(#[from] CleanupError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, Error>;
