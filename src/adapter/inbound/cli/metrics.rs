//! `shiftlog metrics`.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use crate::infrastructure::bootstrap::Core;
use crate::infrastructure::config::Config;

/// Probe once so the exposition carries live values, then print it.
///
/// # Errors
/// Returns an error if configuration or database setup fails.
pub async fn execute(path: &Path) -> anyhow::Result<ExitCode> {
    let config = Config::load_or_default(path).context("loading configuration")?;
    let core = Core::initialize(config).context("opening database")?;

    core.performance().sample_now();
    let _ = core.health_report().await;
    print!("{}", core.export_metrics());
    core.shutdown();

    Ok(ExitCode::SUCCESS)
}
