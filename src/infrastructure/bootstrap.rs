//! Composition root: wires config, monitors, the manager and the scheduler.

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::outbound::reclaim::MallocTrimReclaimer;
use crate::adapter::outbound::sqlite::{PoolEventAdapter, SqliteDatabase};
use crate::application::cleanup::CleanupScheduler;
use crate::application::health::HealthReport;
use crate::application::manager::DatabaseConnectionManager;
use crate::application::metrics::MetricsRecorder;
use crate::application::performance::PerformanceMonitor;
use crate::application::pool_monitor::ConnectionPoolMonitor;
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::port::{
    AlertSink, AlertSinkRegistry, DatabaseService, DefaultRetryClassifier, LogAlertSink,
    MemoryReclaimer,
};

/// Build the alert fan-out. Alerts always go to the log.
pub(crate) fn build_alert_sinks() -> AlertSinkRegistry {
    let mut registry = AlertSinkRegistry::new();
    registry.register(Box::new(LogAlertSink));
    registry
}

/// Every long-lived component, constructed once.
pub struct Core<S: DatabaseService = SqliteDatabase> {
    config: Config,
    recorder: Arc<MetricsRecorder>,
    pool_monitor: Arc<ConnectionPoolMonitor>,
    performance: Arc<PerformanceMonitor>,
    manager: Arc<DatabaseConnectionManager<S>>,
    scheduler: Arc<CleanupScheduler>,
}

impl Core<SqliteDatabase> {
    /// Open the configured SQLite database and wire everything around it.
    ///
    /// # Errors
    /// Returns an error if the database pool cannot be created.
    pub fn initialize(config: Config) -> Result<Self> {
        Self::assemble(
            config,
            Arc::new(build_alert_sinks()),
            Arc::new(MallocTrimReclaimer),
            |config, pool_monitor| {
                SqliteDatabase::connect(
                    &config.database,
                    Some(PoolEventAdapter::new(Arc::clone(pool_monitor))),
                )
            },
        )
    }
}

impl<S: DatabaseService> Core<S> {
    /// Wire the components around a service produced by `connect`.
    ///
    /// `connect` receives the pool monitor so that pool-backed services can
    /// report checkout events to it.
    ///
    /// # Errors
    /// Returns whatever `connect` fails with.
    pub fn assemble<C>(
        config: Config,
        alerts: Arc<dyn AlertSink>,
        reclaimer: Arc<dyn MemoryReclaimer>,
        connect: C,
    ) -> Result<Self>
    where
        C: FnOnce(&Config, &Arc<ConnectionPoolMonitor>) -> Result<S>,
    {
        let recorder = Arc::new(MetricsRecorder::new(
            &config.performance.duration_buckets_ms,
        ));
        let pool_monitor = Arc::new(
            ConnectionPoolMonitor::new(config.pool_monitor.clone())
                .with_recorder(Arc::clone(&recorder)),
        );
        let performance = Arc::new(PerformanceMonitor::new(
            config.performance.clone(),
            Arc::clone(&recorder),
            alerts,
        ));

        let service = connect(&config, &pool_monitor)?;
        let manager = Arc::new(DatabaseConnectionManager::new(
            Arc::new(config.manager.clone()),
            service,
            Arc::new(DefaultRetryClassifier),
            Arc::clone(&pool_monitor),
            Arc::clone(&performance),
        ));

        let scheduler = Arc::new(CleanupScheduler::new(config.cleanup.clone()));
        scheduler.register_default_tasks(
            Arc::clone(&pool_monitor),
            Arc::clone(&performance),
            reclaimer,
        );

        info!(
            history_capacity = pool_monitor.capacity(),
            cleanup_tasks = scheduler.task_names().len(),
            "Core services initialized"
        );

        Ok(Self {
            config,
            recorder,
            pool_monitor,
            performance,
            manager,
            scheduler,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn recorder(&self) -> &Arc<MetricsRecorder> {
        &self.recorder
    }

    pub fn pool_monitor(&self) -> &Arc<ConnectionPoolMonitor> {
        &self.pool_monitor
    }

    pub fn performance(&self) -> &Arc<PerformanceMonitor> {
        &self.performance
    }

    pub fn manager(&self) -> &Arc<DatabaseConnectionManager<S>> {
        &self.manager
    }

    pub fn scheduler(&self) -> &Arc<CleanupScheduler> {
        &self.scheduler
    }

    /// Start self-sampling and the cleanup loop.
    pub fn start_background(&self) {
        self.performance.start_monitoring();
        self.scheduler.start();
    }

    /// Probe the database and fold every component into one report.
    pub async fn health_report(&self) -> HealthReport {
        let database = self.manager.health_check().await;
        let pool = self.pool_monitor.metrics();
        HealthReport::assemble(
            database,
            self.pool_monitor.health_status(),
            pool,
            self.manager.statistics(),
            self.performance.snapshot(),
            Some(self.scheduler.metrics()),
        )
    }

    /// Prometheus text for every metric, including fresh pool gauges.
    pub fn export_metrics(&self) -> String {
        self.pool_monitor.export();
        self.performance.export_metrics()
    }

    /// Stop background work and release the database.
    pub fn shutdown(&self) {
        self.scheduler.stop();
        self.performance.stop_monitoring();
        if let Err(e) = self.manager.shutdown() {
            warn!(error = %e, "Shutdown requested twice");
        }
        info!("Core services stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HealthVerdict;
    use crate::port::{NoopReclaimer, NullAlertSink};
    use crate::testkit::database::ScriptedDatabase;

    fn scripted_core() -> Core<ScriptedDatabase> {
        Core::assemble(
            Config::default(),
            Arc::new(NullAlertSink),
            Arc::new(NoopReclaimer),
            |_, _| Ok(ScriptedDatabase::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn health_report_is_healthy_when_idle() {
        let core = scripted_core();
        let report = core.health_report().await;
        assert_eq!(report.verdict, HealthVerdict::Healthy);
        assert_eq!(report.checks.len(), 3);
    }

    #[tokio::test]
    async fn export_includes_pool_and_query_metrics() {
        let core = scripted_core();
        core.manager()
            .execute_query("entries.count", |conn| Ok(conn.count()))
            .await
            .unwrap();

        let text = core.export_metrics();
        assert!(text.contains("db_pool_failure_rate"));
        assert!(text.contains("db_queries_total{outcome=\"success\",query=\"entries.count\"} 1"));
    }

    #[tokio::test]
    async fn shutdown_closes_database_once() {
        let core = scripted_core();
        core.start_background();
        assert!(core.performance().is_monitoring());

        core.shutdown();
        core.shutdown();

        assert!(!core.scheduler().is_running());
        assert!(!core.performance().is_monitoring());
        assert_eq!(core.manager().service().close_calls(), 1);
    }
}
