//! Shiftlog - resilient data access and operational monitoring for the
//! shift-log backend.
//!
//! Every database operation goes through a connection manager that bounds it
//! with a timeout, retries transient failures with exponential backoff, and
//! reports to two monitors: a rolling-window connection pool monitor and a
//! process-wide performance monitor. A cleanup scheduler keeps their state
//! bounded.
//!
//! # Architecture
//!
//! - [`domain`] - Value types: connection events, operation records, alerts, health verdicts
//! - [`port`] - Traits the application depends on: database, retry classification, alerts, memory reclamation
//! - [`application`] - Manager, monitors, metrics recorder, cleanup scheduler, health report
//! - [`adapter`] - SQLite (Diesel + r2d2) backend, pool event bridge, CLI
//! - [`infrastructure`] - Configuration, process sampling, composition root
//!
//! # Example
//!
//! ```no_run
//! use shiftlog::infrastructure::bootstrap::Core;
//! use shiftlog::infrastructure::config::Config;
//!
//! # async fn demo() -> shiftlog::error::Result<()> {
//! let core = Core::initialize(Config::load_or_default("config.toml")?)?;
//! core.start_background();
//! let report = core.health_report().await;
//! println!("{}", report.verdict);
//! core.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
