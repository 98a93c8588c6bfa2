use std::process::ExitCode;

use clap::Parser;
use shiftlog::adapter::inbound::cli::{self, command::Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match cli::execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            cli::output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
