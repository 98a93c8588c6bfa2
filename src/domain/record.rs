//! Completed-operation records.

use chrono::{DateTime, Utc};

/// Outcome of one completed database operation or HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub name: String,
    pub duration_ms: f64,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

impl OperationRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, duration_ms: f64, success: bool) -> Self {
        Self {
            name: name.into(),
            duration_ms,
            success,
            timestamp: Utc::now(),
        }
    }
}
