//! Outbound adapters (driven side).

pub mod reclaim;
pub mod sqlite;
