//! Alerts published when an observed value crosses a configured threshold.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    SlowQuery,
    SlowRequest,
    HighMemory,
}

impl AlertKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SlowQuery => "slow_query",
            Self::SlowRequest => "slow_request",
            Self::HighMemory => "high_memory",
        }
    }
}

/// A threshold breach.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    /// Operation, route or resource the alert is about.
    pub subject: String,
    pub value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    #[must_use]
    pub fn new(kind: AlertKind, subject: impl Into<String>, value: f64, threshold: f64) -> Self {
        Self {
            kind,
            subject: subject.into(),
            value,
            threshold,
            timestamp: Utc::now(),
        }
    }
}
