//! Logging and tracing bootstrap shared by the care feedback binaries.

use anyhow::Result;

mod config;
mod tracing_init;

pub use config::{TelemetryConfig, TelemetryProtocol};
pub use tracing_init::{init_telemetry, shutdown};

/// Installs the telemetry subscriber configured from the process environment.
pub fn install(service_name: &str) -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env(service_name, env!("CARGO_PKG_VERSION")))
}
