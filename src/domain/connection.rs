//! Connection lifecycle events observed by the pool monitor.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to a connection checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionEventKind {
    Acquire,
    Release,
    Failure,
}

/// Who observed the event.
///
/// Operation outcomes come from the connection manager. Checkouts and
/// checkins reported by the pool itself are tagged `Pool` and only feed
/// acquire latency and exhaustion, so one attempt is never counted twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionEventSource {
    #[default]
    Manager,
    Pool,
}

/// A single entry in the pool monitor's history window.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionEvent {
    pub kind: ConnectionEventKind,
    pub source: ConnectionEventSource,
    /// Acquire latency for `Acquire`, hold duration for `Release`, zero otherwise.
    pub duration_ms: f64,
    pub error: Option<String>,
    /// Set on failures caused by no connection being available in time.
    pub exhausted: bool,
    pub timestamp: DateTime<Utc>,
    /// Monotonic timestamp used for age-based trimming.
    #[serde(skip)]
    pub recorded_at: Instant,
}

impl ConnectionEvent {
    fn new(kind: ConnectionEventKind, duration_ms: f64, error: Option<String>) -> Self {
        Self {
            kind,
            source: ConnectionEventSource::Manager,
            duration_ms,
            error,
            exhausted: false,
            timestamp: Utc::now(),
            recorded_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn acquire(latency_ms: f64) -> Self {
        Self::new(ConnectionEventKind::Acquire, latency_ms, None)
    }

    #[must_use]
    pub fn release(duration_ms: f64) -> Self {
        Self::new(ConnectionEventKind::Release, duration_ms, None)
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::new(ConnectionEventKind::Failure, 0.0, Some(error.into()))
    }

    #[must_use]
    pub fn exhaustion(timeout_ms: f64) -> Self {
        let mut event = Self::new(
            ConnectionEventKind::Failure,
            0.0,
            Some(format!("no connection available within {timeout_ms:.0}ms")),
        );
        event.exhausted = true;
        event
    }

    /// Tag the event as reported by the pool rather than the manager.
    #[must_use]
    pub fn from_pool(mut self) -> Self {
        self.source = ConnectionEventSource::Pool;
        self
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.kind == ConnectionEventKind::Failure
    }

    /// Whether this event is the outcome of a manager operation attempt.
    #[must_use]
    pub fn is_outcome(&self) -> bool {
        self.source == ConnectionEventSource::Manager
            && matches!(
                self.kind,
                ConnectionEventKind::Release | ConnectionEventKind::Failure
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaustion_is_a_flagged_failure() {
        let event = ConnectionEvent::exhaustion(500.0);
        assert!(event.is_failure());
        assert!(event.exhausted);
        assert_eq!(
            event.error.as_deref(),
            Some("no connection available within 500ms")
        );
    }

    #[test]
    fn release_carries_duration() {
        let event = ConnectionEvent::release(12.5);
        assert_eq!(event.kind, ConnectionEventKind::Release);
        assert!((event.duration_ms - 12.5).abs() < f64::EPSILON);
        assert!(event.error.is_none());
        assert!(event.is_outcome());
    }

    #[test]
    fn pool_checkin_is_not_an_outcome() {
        let event = ConnectionEvent::release(3.0).from_pool();
        assert_eq!(event.source, ConnectionEventSource::Pool);
        assert!(!event.is_outcome());
        assert!(!ConnectionEvent::acquire(1.0).is_outcome());
    }
}
