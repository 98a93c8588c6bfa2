use std::sync::Arc;
use std::thread;

use shiftlog::application::metrics::MetricsRecorder;
use shiftlog::application::pool_monitor::ConnectionPoolMonitor;
use shiftlog::domain::{ConnectionEventKind, HealthVerdict};
use shiftlog::testkit::config;

#[test]
fn history_holds_most_recent_events_in_order() {
    let monitor = ConnectionPoolMonitor::new(config::pool_monitor(4));
    for i in 0..10 {
        monitor.record_acquire(f64::from(i));
    }

    let latencies: Vec<f64> = monitor.events().iter().map(|e| e.duration_ms).collect();
    assert_eq!(latencies, vec![6.0, 7.0, 8.0, 9.0]);
}

#[test]
fn three_failures_two_successes_is_unhealthy() {
    let monitor = ConnectionPoolMonitor::new(config::pool_monitor(5));
    for _ in 0..3 {
        monitor.record_failure("connection reset");
    }
    for _ in 0..2 {
        monitor.record_release(5.0);
    }

    let metrics = monitor.metrics();
    assert!((metrics.failure_rate - 0.6).abs() < 1e-9);
    assert_eq!(monitor.health_status(), HealthVerdict::Unhealthy);
}

#[test]
fn failures_age_out_of_the_window() {
    let monitor = ConnectionPoolMonitor::new(config::pool_monitor(5));
    for _ in 0..3 {
        monitor.record_failure("connection reset");
    }
    for _ in 0..5 {
        monitor.record_release(5.0);
    }

    assert_eq!(monitor.metrics().failures, 0);
    assert_eq!(monitor.health_status(), HealthVerdict::Healthy);
}

#[test]
fn moderate_failure_rate_is_degraded() {
    let monitor = ConnectionPoolMonitor::new(config::pool_monitor(10));
    monitor.record_failure("busy");
    for _ in 0..3 {
        monitor.record_release(1.0);
    }
    // 1 / 4 = 0.25: above 0.2, not above 0.5
    assert_eq!(monitor.health_status(), HealthVerdict::Degraded);
}

#[test]
fn concurrent_recording_respects_capacity() {
    let monitor = Arc::new(ConnectionPoolMonitor::new(config::pool_monitor(64)));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || {
                for i in 0..500 {
                    if i % 2 == 0 {
                        monitor.record_acquire(1.0);
                    } else {
                        monitor.record_release(2.0);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let events = monitor.events();
    assert_eq!(events.len(), 64);
    assert!(events
        .iter()
        .all(|e| e.kind != ConnectionEventKind::Failure));
}

#[test]
fn export_reports_health_gauge() {
    let recorder = Arc::new(MetricsRecorder::new(&[1.0]));
    let monitor = ConnectionPoolMonitor::new(config::pool_monitor(10))
        .with_recorder(Arc::clone(&recorder));
    monitor.record_exhaustion(5_000.0);
    monitor.export();

    let text = recorder.render();
    assert!(text.contains("# TYPE db_pool_health gauge"));
    assert!(text.contains("db_pool_health 2"));
}
