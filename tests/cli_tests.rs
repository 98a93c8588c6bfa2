mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use support::temp::TempWorkspace;

fn shiftlog(workspace: &TempWorkspace) -> Command {
    let mut cmd = Command::cargo_bin("shiftlog").unwrap();
    cmd.current_dir(workspace.path())
        .env("DATABASE_URL", workspace.db_url())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn check_config_accepts_valid_file() {
    let workspace = TempWorkspace::new();
    let path = workspace.write_config("[manager]\nmax_retries = 4\n");

    shiftlog(&workspace)
        .args(["check-config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("4"));
}

#[test]
fn check_config_rejects_invalid_file() {
    let workspace = TempWorkspace::new();
    let path = workspace.write_config("[pool_monitor]\nhistory_capacity = 0\n");

    shiftlog(&workspace)
        .args(["check-config", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("history_capacity"));
}

#[test]
fn check_config_requires_file_unless_allowed() {
    let workspace = TempWorkspace::new();

    shiftlog(&workspace)
        .args(["check-config", "--config", "absent.toml"])
        .assert()
        .failure();

    shiftlog(&workspace)
        .args(["check-config", "--config", "absent.toml", "--allow-missing"])
        .assert()
        .success();
}

#[test]
fn health_json_reports_healthy_database() {
    let workspace = TempWorkspace::new();

    let output = shiftlog(&workspace)
        .args(["health", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["verdict"], "healthy");
    assert_eq!(report["database"]["verdict"], "healthy");
    assert!(report["checks"].as_array().is_some_and(|c| c.len() == 3));
}

#[test]
fn metrics_prints_prometheus_text() {
    let workspace = TempWorkspace::new();

    shiftlog(&workspace)
        .arg("metrics")
        .assert()
        .success()
        .stdout(predicate::str::contains("# TYPE db_pool_health gauge"))
        .stdout(predicate::str::contains("# TYPE db_queries_total counter"));
}

#[test]
fn unknown_subcommand_fails() {
    let workspace = TempWorkspace::new();
    shiftlog(&workspace).arg("frobnicate").assert().failure();
}
