//! `shiftlog check-config`.

use std::path::Path;
use std::process::ExitCode;

use super::command::CheckConfigArgs;
use super::output;
use crate::infrastructure::config::Config;

/// Load and validate the configuration without touching the database.
///
/// # Errors
/// Never; invalid configuration is reported and mapped to a failing exit code.
pub fn execute(path: &Path, args: &CheckConfigArgs) -> anyhow::Result<ExitCode> {
    let loaded = if args.allow_missing {
        Config::load_or_default(path)
    } else {
        Config::load(path)
    };

    match loaded {
        Ok(config) => {
            output::success(&format!("{} is valid", path.display()));
            output::field("database.url", &config.database.url);
            output::field("max_connections", config.database.max_connections);
            output::field("max_retries", config.manager.max_retries);
            output::field("history_capacity", config.pool_monitor.history_capacity);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            output::error(&format!("{}: {e}", path.display()));
            Ok(ExitCode::FAILURE)
        }
    }
}
