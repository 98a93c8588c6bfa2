//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Data-access and monitoring core of the shift-log backend
#[derive(Parser, Debug)]
#[command(name = "shiftlog")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run monitoring and cleanup until interrupted
    Run(RunArgs),

    /// Probe the database and print a health report
    Health(HealthArgs),

    /// Print metrics in Prometheus text format
    Metrics,

    /// Validate the configuration file
    CheckConfig(CheckConfigArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Seconds between logged health reports.
    #[arg(long, default_value_t = 60)]
    pub report_interval: u64,
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Validate built-in defaults when the file does not exist.
    #[arg(long)]
    pub allow_missing: bool,
}
