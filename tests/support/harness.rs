use std::sync::Arc;

use shiftlog::application::manager::DatabaseConnectionManager;
use shiftlog::application::metrics::MetricsRecorder;
use shiftlog::application::performance::PerformanceMonitor;
use shiftlog::application::pool_monitor::ConnectionPoolMonitor;
use shiftlog::infrastructure::config::{ConnectionManagerConfig, PoolMonitorConfig};
use shiftlog::port::{DatabaseService, DefaultRetryClassifier};
use shiftlog::testkit::alert::RecordingAlertSink;
use shiftlog::testkit::config;

/// A manager plus handles to everything it reports to.
pub struct Harness<S: DatabaseService> {
    pub manager: DatabaseConnectionManager<S>,
    pub pool: Arc<ConnectionPoolMonitor>,
    pub performance: Arc<PerformanceMonitor>,
    pub alerts: RecordingAlertSink,
}

pub fn harness<S: DatabaseService>(
    service: S,
    manager: ConnectionManagerConfig,
    pool: PoolMonitorConfig,
) -> Harness<S> {
    let perf_config = config::performance();
    let recorder = Arc::new(MetricsRecorder::new(&perf_config.duration_buckets_ms));
    let alerts = RecordingAlertSink::new();
    let pool = Arc::new(ConnectionPoolMonitor::new(pool).with_recorder(Arc::clone(&recorder)));
    let performance = Arc::new(PerformanceMonitor::new(
        perf_config,
        recorder,
        Arc::new(alerts.clone()),
    ));
    let manager = DatabaseConnectionManager::new(
        Arc::new(manager),
        service,
        Arc::new(DefaultRetryClassifier),
        Arc::clone(&pool),
        Arc::clone(&performance),
    );
    Harness {
        manager,
        pool,
        performance,
        alerts,
    }
}
