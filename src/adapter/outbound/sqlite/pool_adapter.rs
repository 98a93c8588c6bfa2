//! Bridge from r2d2 pool events to the connection pool monitor.
//!
//! Events arrive tagged as pool-observed, so they feed acquire latency and
//! exhaustion without being counted as operation outcomes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use diesel::r2d2::event::{CheckinEvent, CheckoutEvent, HandleEvent, TimeoutEvent};

use crate::application::pool_monitor::ConnectionPoolMonitor;

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Forwards checkout, checkin and timeout events to a [`ConnectionPoolMonitor`].
#[derive(Clone)]
pub struct PoolEventAdapter {
    monitor: Arc<ConnectionPoolMonitor>,
}

impl PoolEventAdapter {
    pub fn new(monitor: Arc<ConnectionPoolMonitor>) -> Self {
        Self { monitor }
    }

    pub fn boxed(self) -> Box<dyn HandleEvent> {
        Box::new(self)
    }

    fn on_checkout(&self, waited: Duration) {
        self.monitor.record_checkout(millis(waited));
    }

    fn on_checkin(&self, held: Duration) {
        self.monitor.record_checkin(millis(held));
    }

    fn on_timeout(&self, timeout: Duration) {
        self.monitor.record_checkout_timeout(millis(timeout));
    }
}

impl fmt::Debug for PoolEventAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolEventAdapter")
            .field("window_events", &self.monitor.len())
            .finish()
    }
}

impl HandleEvent for PoolEventAdapter {
    fn handle_checkout(&self, event: CheckoutEvent) {
        self.on_checkout(event.duration());
    }

    fn handle_checkin(&self, event: CheckinEvent) {
        self.on_checkin(event.duration());
    }

    fn handle_timeout(&self, event: TimeoutEvent) {
        self.on_timeout(event.timeout());
    }
}
