//! Conversion tool configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::convert::ConverterSettings;

/// External conversion tool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    /// LibreOffice binary
    #[serde(default = "default_libreoffice")]
    pub libreoffice_bin: String,

    /// Pandoc binary
    #[serde(default = "default_pandoc")]
    pub pandoc_bin: String,

    /// pdftotext binary
    #[serde(default = "default_pdftotext")]
    pub pdftotext_bin: String,

    /// Per-conversion timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ConvertConfig {
    /// Build converter settings from this configuration
    pub fn converter_settings(&self) -> ConverterSettings {
        ConverterSettings {
            libreoffice_bin: self.libreoffice_bin.clone(),
            pandoc_bin: self.pandoc_bin.clone(),
            pdftotext_bin: self.pdftotext_bin.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    /// Validate conversion configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            libreoffice_bin: default_libreoffice(),
            pandoc_bin: default_pandoc(),
            pdftotext_bin: default_pdftotext(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_libreoffice() -> String {
    "libreoffice".to_string()
}

fn default_pandoc() -> String {
    "pandoc".to_string()
}

fn default_pdftotext() -> String {
    "pdftotext".to_string()
}

fn default_timeout() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ConvertConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ConvertConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
