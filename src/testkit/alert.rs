//! Alert sink that records everything it receives.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{Alert, AlertKind};
use crate::port::AlertSink;

/// Thread-safe alert collector for assertions in tests.
#[derive(Clone, Default)]
pub struct RecordingAlertSink {
    alerts: Arc<Mutex<Vec<Alert>>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.lock().is_empty()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }

    pub fn count_of(&self, kind: AlertKind) -> usize {
        self.alerts.lock().iter().filter(|a| a.kind == kind).count()
    }
}

impl AlertSink for RecordingAlertSink {
    fn publish(&self, alert: Alert) {
        self.alerts.lock().push(alert);
    }
}
