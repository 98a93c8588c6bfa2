//! Outbound ports: capabilities the core consumes from its environment.

pub mod alert;
pub mod classifier;
pub mod database;
pub mod reclaim;
