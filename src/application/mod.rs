//! Application services.
//!
//! The data-access manager, the two monitors, the cleanup scheduler and the
//! metrics recorder they share. Everything here talks to the outside world
//! only through the traits in [`crate::port`].

pub mod cleanup;
pub mod health;
pub mod manager;
pub mod metrics;
pub mod performance;
pub mod pool_monitor;
