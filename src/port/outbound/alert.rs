//! Alert sink port.
//!
//! Alerts are fire-and-forget: publishing must return quickly and never
//! fail the operation that triggered it.

use tracing::warn;

use crate::domain::Alert;

/// Receiver of threshold alerts.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `publish` should not block; spawn a task for slow delivery
pub trait AlertSink: Send + Sync {
    fn publish(&self, alert: Alert);
}

/// Registry of sinks (composite pattern).
///
/// Broadcasts alerts to all registered sinks.
pub struct AlertSinkRegistry {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl AlertSinkRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { sinks: vec![] }
    }

    pub fn register(&mut self, sink: Box<dyn AlertSink>) {
        self.sinks.push(sink);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Default for AlertSinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSink for AlertSinkRegistry {
    fn publish(&self, alert: Alert) {
        for sink in &self.sinks {
            sink.publish(alert.clone());
        }
    }
}

/// Discards every alert.
pub struct NullAlertSink;

impl AlertSink for NullAlertSink {
    fn publish(&self, _alert: Alert) {}
}

/// Writes alerts to the tracing log at `warn` level.
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn publish(&self, alert: Alert) {
        warn!(
            kind = alert.kind.as_str(),
            subject = %alert.subject,
            value = alert.value,
            threshold = alert.threshold,
            "Threshold alert"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::domain::AlertKind;

    struct Counting(Arc<AtomicUsize>);

    impl AlertSink for Counting {
        fn publish(&self, _alert: Alert) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn registry_broadcasts_to_every_sink() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry = AlertSinkRegistry::new();
        registry.register(Box::new(Counting(Arc::clone(&count))));
        registry.register(Box::new(Counting(Arc::clone(&count))));
        registry.register(Box::new(NullAlertSink));

        registry.publish(Alert::new(AlertKind::SlowQuery, "q", 2000.0, 1000.0));

        assert_eq!(registry.len(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_registry_is_empty() {
        assert!(AlertSinkRegistry::default().is_empty());
    }
}
