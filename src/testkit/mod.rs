//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`database`] - [`ScriptedDatabase`](database::ScriptedDatabase), an
//!   in-memory [`DatabaseService`](crate::port::DatabaseService) with
//!   scripted failures and delays.
//! - [`alert`] - [`RecordingAlertSink`](alert::RecordingAlertSink) for
//!   alert assertions.
//! - [`config`] - Canonical test configurations.

pub mod alert;
pub mod config;
pub mod database;
