use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::testkit::config;

fn counting_task(
    counter: &Arc<AtomicU32>,
) -> impl Fn() -> Result<(), CleanupError> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn tick_respects_interval() {
    let scheduler = CleanupScheduler::new(config::cleanup());
    let runs = Arc::new(AtomicU32::new(0));
    scheduler.register_task("trim", Duration::from_millis(1_000), counting_task(&runs));

    tokio::time::advance(Duration::from_millis(999)).await;
    assert_eq!(scheduler.tick().await, 0);

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(scheduler.tick().await, 1);
    assert_eq!(scheduler.tick().await, 0);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn disabled_tasks_are_skipped() {
    let scheduler = CleanupScheduler::new(config::cleanup());
    let runs = Arc::new(AtomicU32::new(0));
    scheduler.register_task("trim", Duration::from_millis(100), counting_task(&runs));
    scheduler.disable_task("trim").unwrap();

    tokio::time::advance(Duration::from_millis(500)).await;
    assert_eq!(scheduler.tick().await, 0);

    scheduler.enable_task("trim").unwrap();
    assert_eq!(scheduler.tick().await, 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_task_errors() {
    let scheduler = CleanupScheduler::new(config::cleanup());
    assert_eq!(
        scheduler.enable_task("missing"),
        Err(CleanupError::UnknownTask("missing".into()))
    );
    assert_eq!(
        scheduler.run_now("missing").await,
        Err(CleanupError::UnknownTask("missing".into()))
    );
    assert!(!scheduler.unregister_task("missing"));
}

#[tokio::test(start_paused = true)]
async fn run_now_bypasses_gating_and_resets_clock() {
    let scheduler = CleanupScheduler::new(config::cleanup());
    let runs = Arc::new(AtomicU32::new(0));
    scheduler.register_task("trim", Duration::from_millis(1_000), counting_task(&runs));

    tokio::time::advance(Duration::from_millis(600)).await;
    scheduler.run_now("trim").await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    // 1000ms after registration but only 400ms after the manual run.
    tokio::time::advance(Duration::from_millis(400)).await;
    assert_eq!(scheduler.tick().await, 0);

    tokio::time::advance(Duration::from_millis(600)).await;
    assert_eq!(scheduler.tick().await, 1);
}

#[tokio::test]
async fn failures_are_isolated_and_counted() {
    let scheduler = CleanupScheduler::new(config::cleanup());
    let runs = Arc::new(AtomicU32::new(0));
    scheduler.register_task("a_fails", Duration::ZERO, || {
        Err(CleanupError::failed("a_fails", "disk full"))
    });
    scheduler.register_task("b_panics", Duration::ZERO, || panic!("boom"));
    scheduler.register_task("c_works", Duration::ZERO, counting_task(&runs));

    assert_eq!(scheduler.tick().await, 3);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let metrics = scheduler.metrics();
    assert_eq!(metrics.total_runs, 3);
    assert_eq!(metrics.failures, 2);
    assert!(metrics
        .last_error
        .as_deref()
        .is_some_and(|e| e.contains("boom")));

    let info = scheduler.task_info("a_fails").unwrap();
    assert_eq!(info.failures, 1);
    assert!(info.last_error.unwrap().contains("disk full"));
}

#[tokio::test]
async fn actions_run_off_the_runtime_thread() {
    let scheduler = CleanupScheduler::new(config::cleanup());
    let seen = Arc::new(parking_lot::Mutex::new(None));
    let slot = Arc::clone(&seen);
    scheduler.register_task("reclaim", Duration::ZERO, move || {
        *slot.lock() = Some(std::thread::current().id());
        std::thread::sleep(Duration::from_millis(20));
        Ok(())
    });

    scheduler.run_now("reclaim").await.unwrap();

    let ran_on = seen.lock().take().unwrap();
    assert_ne!(ran_on, std::thread::current().id());
    assert_eq!(scheduler.metrics().total_runs, 1);
}

#[tokio::test]
async fn reregister_preserves_enabled_flag() {
    let scheduler = CleanupScheduler::new(config::cleanup());
    scheduler.register_task("trim", Duration::from_secs(1), || Ok(()));
    scheduler.disable_task("trim").unwrap();

    scheduler.register_task("trim", Duration::from_secs(5), || Ok(()));
    let info = scheduler.task_info("trim").unwrap();
    assert!(!info.enabled);
    assert_eq!(info.interval_ms, 5_000);

    scheduler.register_task_with("trim", Duration::from_secs(5), true, || Ok(()));
    assert!(scheduler.task_info("trim").unwrap().enabled);
}

#[tokio::test]
async fn force_cleanup_runs_enabled_tasks() {
    let scheduler = CleanupScheduler::new(config::cleanup());
    let runs = Arc::new(AtomicU32::new(0));
    scheduler.register_task("a", Duration::from_secs(3_600), counting_task(&runs));
    scheduler.register_task("b", Duration::from_secs(3_600), counting_task(&runs));
    scheduler.register_task_with("c", Duration::from_secs(3_600), false, counting_task(&runs));

    assert_eq!(scheduler.force_cleanup_all().await, 0);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn loop_runs_until_stopped() {
    let scheduler = Arc::new(CleanupScheduler::new(config::cleanup()));
    let runs = Arc::new(AtomicU32::new(0));
    scheduler.register_task("trim", Duration::from_millis(1_000), counting_task(&runs));

    assert!(scheduler.start());
    assert!(!scheduler.start());

    tokio::time::sleep(Duration::from_millis(1_050)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    assert!(scheduler.stop());
    tokio::time::sleep(Duration::from_millis(5_000)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert!(!scheduler.is_running());
}

#[tokio::test]
async fn default_tasks_are_registered() {
    use crate::application::metrics::MetricsRecorder;
    use crate::application::performance::PerformanceMonitor;
    use crate::application::pool_monitor::ConnectionPoolMonitor;
    use crate::port::{NoopReclaimer, NullAlertSink};

    let scheduler = CleanupScheduler::new(config::cleanup());
    let pool = Arc::new(ConnectionPoolMonitor::new(config::pool_monitor(10)));
    let perf = Arc::new(PerformanceMonitor::new(
        config::performance(),
        Arc::new(MetricsRecorder::new(&[1.0])),
        Arc::new(NullAlertSink),
    ));
    pool.record_release(1.0);
    perf.record_business_event("entry_created", 3);

    scheduler.register_default_tasks(Arc::clone(&pool), Arc::clone(&perf), Arc::new(NoopReclaimer));
    assert_eq!(
        scheduler.task_names(),
        vec![
            ALERT_COOLDOWN_PRUNE,
            MEMORY_RECLAIM,
            PERFORMANCE_RESET,
            POOL_MONITOR_TRIM
        ]
    );

    scheduler.run_now(PERFORMANCE_RESET).await.unwrap();
    assert_eq!(perf.snapshot().business_events, 0);
    assert_eq!(scheduler.force_cleanup_all().await, 0);
    assert_eq!(pool.len(), 1);
}
