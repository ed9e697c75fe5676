//! Twilio configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::transport::TwilioSettings;
use crate::domain::conversation::MenuId;

/// Twilio WhatsApp configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    /// Account SID (starts with "AC")
    pub account_sid: String,

    /// Auth token
    pub auth_token: Secret<String>,

    /// Sender address, e.g. `whatsapp:+14155238886`
    pub sender: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Content template SID for the generic menu
    pub generic_menu_sid: String,

    /// Content template SID for the file-actions menu
    pub file_actions_menu_sid: String,

    /// Content template SID for the retrieve menu
    pub retrieve_menu_sid: String,

    /// Content template SID for the PDF conversion menu
    pub pdf_menu_sid: String,

    /// Content template SID for the DOCX conversion menu
    pub docx_menu_sid: String,

    /// Content template SID for the image conversion menu
    pub image_menu_sid: String,
}

impl TwilioConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn template_sids(&self) -> [(MenuId, &str, &'static str); 6] {
        [
            (MenuId::Generic, &self.generic_menu_sid, "generic_menu_sid"),
            (
                MenuId::FileActions,
                &self.file_actions_menu_sid,
                "file_actions_menu_sid",
            ),
            (
                MenuId::Retrieve,
                &self.retrieve_menu_sid,
                "retrieve_menu_sid",
            ),
            (MenuId::Pdf, &self.pdf_menu_sid, "pdf_menu_sid"),
            (MenuId::Docx, &self.docx_menu_sid, "docx_menu_sid"),
            (MenuId::Image, &self.image_menu_sid, "image_menu_sid"),
        ]
    }

    /// Build transport settings from this configuration
    pub fn transport_settings(&self) -> TwilioSettings {
        let mut settings = TwilioSettings::new(
            self.account_sid.clone(),
            self.auth_token.expose_secret().clone(),
            self.sender.clone(),
        )
        .with_base_url(self.base_url.clone());
        settings.timeout = self.timeout();
        for (menu, sid, _) in self.template_sids() {
            settings = settings.with_menu_template(menu, sid);
        }
        settings
    }

    /// Validate Twilio configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.account_sid.starts_with("AC") {
            return Err(ValidationError::InvalidAccountSid);
        }
        if self.auth_token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("TWILIO__AUTH_TOKEN"));
        }
        if !self.sender.starts_with("whatsapp:+") {
            return Err(ValidationError::InvalidSender);
        }
        for (_, sid, name) in self.template_sids() {
            if !sid.starts_with("HX") {
                return Err(ValidationError::InvalidTemplateSid(name));
            }
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_timeout() -> u64 {
    15
}
