//! Connection pool construction.

use std::time::Duration;

use diesel::prelude::*;
use diesel::r2d2::event::HandleEvent;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;

use crate::error::{Error, Result};
use crate::infrastructure::config::DatabaseConfig;

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Applies `busy_timeout` to every connection the pool opens.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout_ms: u64,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        diesel::sql_query(format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms))
            .execute(conn)
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Create a connection pool for the configured database.
///
/// `events` receives checkout, checkin and timeout notifications.
///
/// # Errors
/// Returns an error if the pool cannot open its initial connections.
pub fn create_pool(
    config: &DatabaseConfig,
    events: Option<Box<dyn HandleEvent>>,
) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(&config.url);
    let mut builder = Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(Duration::from_millis(config.acquire_timeout_ms))
        .connection_customizer(Box::new(SqlitePragmas {
            busy_timeout_ms: config.busy_timeout_ms,
        }));
    if let Some(handler) = events {
        builder = builder.event_handler(handler);
    }
    builder
        .build(manager)
        .map_err(|e| Error::Connection(e.to_string()))
}
