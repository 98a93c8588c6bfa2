//! Backend-agnostic domain types shared by the monitoring core.
//!
//! - [`HealthVerdict`] - Tri-state health judgment derived on demand
//! - [`OperationRecord`] - Outcome of one completed operation
//! - [`ConnectionEvent`] - One entry in the pool monitor's history window
//! - [`Alert`] - Threshold breach published by the performance monitor

mod alert;
mod connection;
mod health;
mod record;

pub use alert::{Alert, AlertKind};
pub use connection::{ConnectionEvent, ConnectionEventKind, ConnectionEventSource};
pub use health::HealthVerdict;
pub use record::OperationRecord;
