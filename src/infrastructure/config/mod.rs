//! Infrastructure configuration modules.

pub mod cleanup;
pub mod database;
pub mod logging;
pub mod monitor;
pub mod settings;

pub use cleanup::CleanupConfig;
pub use database::{ConnectionManagerConfig, DatabaseConfig};
pub use logging::LoggingConfig;
pub use monitor::{PerformanceConfig, PoolMonitorConfig};
pub use settings::Config;
