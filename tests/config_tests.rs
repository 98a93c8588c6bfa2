mod support;

use shiftlog::error::{ConfigError, Error};
use shiftlog::infrastructure::config::Config;
use support::temp::TempWorkspace;

const FULL: &str = r#"
[logging]
level = "debug"
format = "json"

[database]
url = "shift.db"
max_connections = 3
acquire_timeout_ms = 2000
busy_timeout_ms = 750

[manager]
max_retries = 5
retry_base_delay_ms = 20
retry_max_delay_ms = 400
retry_jitter_ratio = 0.25
query_timeout_ms = 1500
transaction_timeout_ms = 3000
health_check_timeout_ms = 800
health_degraded_latency_ms = 150

[pool_monitor]
history_capacity = 250
degraded_failure_rate = 0.1
unhealthy_failure_rate = 0.3
degraded_acquire_latency_ms = 50.0
export = false

[performance]
slow_query_ms = 250.0
slow_request_ms = 750.0
duration_buckets_ms = [5.0, 50.0, 500.0]
sample_interval_ms = 2000
memory_alert_bytes = 1073741824
alert_cooldown_ms = 30000

[cleanup]
tick_interval_ms = 500
pool_trim_interval_ms = 10000
pool_history_max_age_ms = 600000
performance_reset_interval_ms = 3600000
alert_prune_interval_ms = 60000
memory_reclaim_interval_ms = 300000
"#;

fn invalid_field(toml: &str) -> &'static str {
    match Config::parse_toml(toml) {
        Err(Error::Config(ConfigError::InvalidValue { field, .. })) => field,
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn every_section_parses() {
    let config = Config::parse_toml(FULL).unwrap();

    assert_eq!(config.logging.format, "json");
    assert_eq!(config.database.max_connections, 3);
    assert_eq!(config.database.busy_timeout_ms, 750);
    assert_eq!(config.manager.max_retries, 5);
    assert_eq!(config.manager.health_degraded_latency_ms, 150);
    assert_eq!(config.pool_monitor.history_capacity, 250);
    assert!(!config.pool_monitor.export);
    assert_eq!(config.performance.duration_buckets_ms, vec![5.0, 50.0, 500.0]);
    assert_eq!(config.performance.alert_cooldown_ms, 30_000);
    assert_eq!(config.cleanup.tick_interval_ms, 500);
    assert_eq!(config.cleanup.memory_reclaim_interval_ms, 300_000);
}

#[test]
fn rejects_out_of_range_values() {
    assert_eq!(invalid_field("[database]\nmax_connections = 0\n"), "max_connections");
    assert_eq!(
        invalid_field("[manager]\nretry_jitter_ratio = 1.5\n"),
        "retry_jitter_ratio"
    );
    assert_eq!(
        invalid_field("[manager]\nretry_base_delay_ms = 500\nretry_max_delay_ms = 100\n"),
        "retry_max_delay_ms"
    );
    assert_eq!(
        invalid_field("[pool_monitor]\nunhealthy_failure_rate = 2.0\n"),
        "unhealthy_failure_rate"
    );
    assert_eq!(
        invalid_field("[performance]\nduration_buckets_ms = []\n"),
        "duration_buckets_ms"
    );
    assert_eq!(
        invalid_field("[cleanup]\ntick_interval_ms = 0\n"),
        "cleanup_intervals"
    );
}

#[test]
fn empty_database_url_is_missing() {
    assert!(matches!(
        Config::parse_toml("[database]\nurl = \"  \"\n"),
        Err(Error::Config(ConfigError::MissingField { field: "url" }))
    ));
}

#[test]
fn load_reads_file_and_missing_file_fails() {
    let workspace = TempWorkspace::new();
    let path = workspace.write_config("[manager]\nmax_retries = 7\n");

    let config = Config::load(&path).unwrap();
    assert_eq!(config.manager.max_retries, 7);

    let missing = workspace.path().join("absent.toml");
    assert!(matches!(
        Config::load(&missing),
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
    assert!(Config::load_or_default(&missing).is_ok());
}
