pub mod config;
pub mod error;

pub use config::{
    CalendarAccess, CalendarConfig, CatalogConfig, Config, ReminderConfig, StorageConfig,
    ValidationResult, DEFAULT_LEAD_TIME_MINUTES,
};
pub use error::{AppError, ConfigError, DatabaseError, RusqliteErrorExt};

use anyhow::Result;

/// Initialize logging for the Explora binaries.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("Explora core initialized");
    Ok(())
}
