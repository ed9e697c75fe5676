//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(&'static str),

    #[error("Twilio account SID must start with 'AC'")]
    InvalidAccountSid,

    #[error("Twilio sender must be a WhatsApp address (whatsapp:+...)")]
    InvalidSender,

    #[error("Menu template SID must start with 'HX': {0}")]
    InvalidTemplateSid(&'static str),
}
