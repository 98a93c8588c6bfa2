//! `shiftlog run`.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};

use super::command::RunArgs;
use crate::infrastructure::bootstrap::Core;
use crate::infrastructure::config::Config;

/// Start monitoring and cleanup, log a health report periodically, and shut
/// down on Ctrl-C.
///
/// # Errors
/// Returns an error if configuration or database setup fails.
pub async fn execute(path: &Path, args: &RunArgs) -> anyhow::Result<ExitCode> {
    let config = Config::load_or_default(path).context("loading configuration")?;
    config.init_logging();

    let core = Core::initialize(config).context("opening database")?;
    core.start_background();
    info!("shiftlog core running");

    let mut reports = tokio::time::interval(Duration::from_secs(args.report_interval.max(1)));
    loop {
        tokio::select! {
            _ = reports.tick() => {
                let report = core.health_report().await;
                if report.is_healthy() {
                    info!(
                        verdict = %report.verdict,
                        operations = report.manager.total_operations,
                        pool_failure_rate = report.pool.failure_rate,
                        "Health report"
                    );
                } else {
                    warn!(
                        verdict = %report.verdict,
                        operations = report.manager.total_operations,
                        pool_failure_rate = report.pool.failure_rate,
                        "Health report"
                    );
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    core.shutdown();
    info!("shiftlog stopped");
    Ok(ExitCode::SUCCESS)
}
