//! `shiftlog` command-line interface.

pub mod check;
pub mod command;
pub mod health;
pub mod metrics;
pub mod output;
pub mod run;

use std::process::ExitCode;

use command::{Cli, Commands};

/// Dispatch a parsed command line.
///
/// # Errors
/// Returns an error if configuration or database setup fails.
pub async fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Run(args) => run::execute(&cli.config, &args).await,
        Commands::Health(args) => health::execute(&cli.config, &args).await,
        Commands::Metrics => metrics::execute(&cli.config).await,
        Commands::CheckConfig(args) => check::execute(&cli.config, &args),
    }
}
