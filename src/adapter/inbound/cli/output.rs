//! Terminal output helpers.

use std::fmt::Display;

use owo_colors::OwoColorize;

use crate::domain::HealthVerdict;

pub fn header(version: &str) {
    println!("{} {}", "shiftlog".bold(), version.dimmed());
    println!();
}

pub fn field(label: &str, value: impl Display) {
    println!("  {:<22} {}", label.dimmed(), value);
}

pub fn section(title: &str) {
    println!();
    println!("{}", title.bold());
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Verdict text coloured by severity.
pub fn verdict(verdict: HealthVerdict) -> String {
    match verdict {
        HealthVerdict::Healthy => verdict.green().to_string(),
        HealthVerdict::Degraded => verdict.yellow().to_string(),
        HealthVerdict::Unhealthy => verdict.red().to_string(),
    }
}
