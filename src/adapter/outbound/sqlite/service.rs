//! [`DatabaseService`] over a pooled SQLite database.
//!
//! Every call checks a connection out on a blocking worker thread
//! (`spawn_blocking`), so Diesel's synchronous API never stalls the async
//! runtime.

use std::time::Instant;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::connection::{create_pool, DbPool};
use super::error::{from_diesel, from_join, from_pool};
use super::pool_adapter::PoolEventAdapter;
use crate::error::Result;
use crate::infrastructure::config::DatabaseConfig;
use crate::port::{BackendError, DatabaseService, StepFailure, TransactionStep};

/// SQLite-backed database service.
pub struct SqliteDatabase {
    pool: RwLock<Option<DbPool>>,
}

impl SqliteDatabase {
    /// Open the database, optionally reporting pool events to `events`.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be built.
    pub fn connect(config: &DatabaseConfig, events: Option<PoolEventAdapter>) -> Result<Self> {
        let pool = create_pool(config, events.map(PoolEventAdapter::boxed))?;
        info!(
            url = %config.url,
            max_connections = config.max_connections,
            "SQLite pool ready"
        );
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self {
            pool: RwLock::new(Some(pool)),
        }
    }

    fn pool(&self) -> std::result::Result<DbPool, BackendError> {
        self.pool
            .read()
            .clone()
            .ok_or_else(|| BackendError::ConnectionLost("database closed".into()))
    }

    /// Connections currently open and idle, as reported by r2d2.
    pub fn pool_state(&self) -> Option<(u32, u32)> {
        self.pool.read().as_ref().map(|pool| {
            let state = pool.state();
            (state.connections, state.idle_connections)
        })
    }
}

#[async_trait]
impl DatabaseService for SqliteDatabase {
    type Connection = SqliteConnection;

    async fn execute<T, F>(&self, op: F) -> std::result::Result<T, BackendError>
    where
        F: FnOnce(&mut Self::Connection) -> std::result::Result<T, BackendError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool()?;
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| from_pool(&e))?;
            op(&mut *conn)
        })
        .await
        .map_err(|e| from_join(&e))?
    }

    async fn transaction(
        &self,
        steps: Vec<TransactionStep<Self::Connection>>,
        deadline: Instant,
    ) -> std::result::Result<(), StepFailure> {
        let pool = self.pool().map_err(|cause| StepFailure { step: 0, cause })?;
        let step_count = steps.len();

        tokio::task::spawn_blocking(move || {
            let mut pooled = pool.get().map_err(|e| StepFailure {
                step: 0,
                cause: from_pool(&e),
            })?;
            let conn: &mut SqliteConnection = &mut pooled;

            let mut failure: Option<StepFailure> = None;
            let result = conn.transaction::<(), diesel::result::Error, _>(|conn| {
                for (step, run) in steps.into_iter().enumerate() {
                    if Instant::now() >= deadline {
                        failure = Some(StepFailure {
                            step,
                            cause: BackendError::DeadlineExceeded,
                        });
                        return Err(diesel::result::Error::RollbackTransaction);
                    }
                    if let Err(cause) = run(conn) {
                        failure = Some(StepFailure { step, cause });
                        return Err(diesel::result::Error::RollbackTransaction);
                    }
                }
                if Instant::now() >= deadline {
                    failure = Some(StepFailure {
                        step: step_count,
                        cause: BackendError::DeadlineExceeded,
                    });
                    return Err(diesel::result::Error::RollbackTransaction);
                }
                Ok(())
            });

            match result {
                Ok(()) => Ok(()),
                Err(error) => {
                    let failure = failure.unwrap_or_else(|| StepFailure {
                        step: step_count,
                        cause: from_diesel(&error),
                    });
                    debug!(step = failure.step, cause = %failure.cause, "Transaction rolled back");
                    Err(failure)
                }
            }
        })
        .await
        .map_err(|e| StepFailure {
            step: 0,
            cause: from_join(&e),
        })?
    }

    async fn ping(&self) -> std::result::Result<(), BackendError> {
        self.execute(|conn| {
            diesel::sql_query("SELECT 1")
                .execute(conn)
                .map(|_| ())
                .map_err(|e| from_diesel(&e))
        })
        .await
    }

    fn close(&self) {
        if self.pool.write().take().is_some() {
            info!("SQLite pool closed");
        }
    }
}
