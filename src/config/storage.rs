//! Storage configuration: file index database, blob gateway, ingestion hook

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::files::GatewaySettings;

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// PostgreSQL connection URL for the file index
    pub database_url: String,

    /// Maximum database connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Base URL of the blob storage gateway
    pub gateway_url: String,

    /// Gateway request timeout in seconds
    #[serde(default = "default_gateway_timeout")]
    pub gateway_timeout_secs: u64,

    /// Ingestion workflow webhook URL, called after each stored upload
    pub ingestion_webhook_url: String,

    /// Root directory for per-session staging directories
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

impl StorageConfig {
    /// Build gateway settings from this configuration
    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings::new(self.gateway_url.clone())
            .with_timeout(Duration::from_secs(self.gateway_timeout_secs))
    }

    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if !self.gateway_url.starts_with("http") {
            return Err(ValidationError::InvalidUrl("storage.gateway_url"));
        }
        if !self.ingestion_webhook_url.starts_with("http") {
            return Err(ValidationError::InvalidUrl("storage.ingestion_webhook_url"));
        }
        if self.staging_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__STAGING_DIR"));
        }
        Ok(())
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_gateway_timeout() -> u64 {
    60
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("filebridge")
}
