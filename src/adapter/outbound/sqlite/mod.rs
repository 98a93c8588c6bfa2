//! SQLite backend via Diesel and r2d2.
//!
//! - [`connection`] builds the pool and applies per-connection pragmas.
//! - [`service`] implements [`DatabaseService`](crate::port::DatabaseService).
//! - [`pool_adapter`] forwards r2d2 pool events to the pool monitor.

pub mod connection;
mod error;
pub mod pool_adapter;
pub mod service;

pub use connection::{create_pool, DbPool};
pub use pool_adapter::PoolEventAdapter;
pub use service::SqliteDatabase;
