//! `shiftlog health`.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use super::command::HealthArgs;
use super::output;
use crate::application::health::HealthReport;
use crate::domain::HealthVerdict;
use crate::infrastructure::bootstrap::Core;
use crate::infrastructure::config::Config;

/// Exit code used when the report verdict is unhealthy.
pub const UNHEALTHY_EXIT: u8 = 2;

/// Probe the database and print the combined report.
///
/// # Errors
/// Returns an error if configuration or database setup fails.
pub async fn execute(path: &Path, args: &HealthArgs) -> anyhow::Result<ExitCode> {
    let config = Config::load_or_default(path).context("loading configuration")?;
    let core = Core::initialize(config).context("opening database")?;

    let report = core.health_report().await;
    core.shutdown();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(exit_code(report.verdict))
}

pub(crate) fn exit_code(verdict: HealthVerdict) -> ExitCode {
    if verdict == HealthVerdict::Unhealthy {
        ExitCode::from(UNHEALTHY_EXIT)
    } else {
        ExitCode::SUCCESS
    }
}

fn print_report(report: &HealthReport) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("status", output::verdict(report.verdict));

    output::section("Checks");
    for check in &report.checks {
        let detail = check.detail().unwrap_or("");
        output::field(check.name(), format!("{} {detail}", output::verdict(check.verdict())));
    }

    output::section("Database");
    output::field("probe latency", format!("{:.1}ms", report.database.latency_ms));
    output::field("operations", report.manager.total_operations);
    output::field("failures", report.manager.total_failures);
    output::field("retries", report.manager.retry_count);
    output::field("timeouts", report.manager.timeouts);

    output::section("Connection pool");
    output::field("window events", report.pool.total_events);
    output::field("failure rate", format!("{:.3}", report.pool.failure_rate));
    output::field(
        "avg acquire",
        format!("{:.1}ms", report.pool.average_acquire_latency_ms),
    );
    output::field("exhaustions", report.pool.exhaustions);
}
