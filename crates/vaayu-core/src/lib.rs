//! Shared foundation for the Vaayu weather-alerting client.
//!
//! Error hierarchy, typed configuration, clock abstraction, and HTTP retry
//! helpers used across the workspace.

pub mod clock;
pub mod config;
pub mod error;
pub mod retry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BackendConfig, Config, ValidationResult, WeatherConfig};
pub use error::{
    AppError, ConfigError, LocationError, NetworkError, ReqwestErrorExt, StorageError,
};

use anyhow::Result;

/// Initialize tracing for the client process.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Vaayu core initialized");
    Ok(())
}
