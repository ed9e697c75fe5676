//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `FILEBRIDGE` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use filebridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod convert;
mod error;
mod server;
mod storage;
mod twilio;

pub use ai::AiConfig;
pub use convert::ConvertConfig;
pub use error::{ConfigError, ValidationError};
pub use server::ServerConfig;
pub use storage::StorageConfig;
pub use twilio::TwilioConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, log filter)
    #[serde(default)]
    pub server: ServerConfig,

    /// Twilio WhatsApp configuration
    pub twilio: TwilioConfig,

    /// Storage configuration (file index, gateway, ingestion, staging)
    pub storage: StorageConfig,

    /// AI configuration (HuggingFace)
    pub ai: AiConfig,

    /// Conversion tool configuration
    #[serde(default)]
    pub convert: ConvertConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads a `.env` file if present, then reads environment variables
    /// with the `FILEBRIDGE` prefix:
    ///
    /// - `FILEBRIDGE__SERVER__PORT=3000` -> `server.port = 3000`
    /// - `FILEBRIDGE__STORAGE__DATABASE_URL=...` -> `storage.database_url`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FILEBRIDGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.twilio.validate()?;
        self.storage.validate()?;
        self.ai.validate()?;
        self.convert.validate()?;
        Ok(())
    }
}
