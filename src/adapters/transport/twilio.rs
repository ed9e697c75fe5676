//! Twilio WhatsApp transport.
//!
//! Sends messages through Twilio's Messages API with the account's basic-auth
//! credentials. Menus are Twilio content templates; the mapping from
//! [`MenuId`] to a template `ContentSid` comes from configuration so template
//! rotation never touches code.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::domain::conversation::MenuId;
use crate::domain::foundation::Identity;
use crate::ports::{ChatTransport, TransportError};

/// Twilio transport configuration.
#[derive(Debug, Clone)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: Secret<String>,
    /// Sender address, e.g. `whatsapp:+14155238886`.
    pub sender: String,
    /// Base URL of the Twilio API (overridable for tests).
    pub base_url: String,
    /// Content template SID per menu.
    pub menu_templates: HashMap<MenuId, String>,
    pub timeout: Duration,
}

impl TwilioSettings {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: Secret::new(auth_token.into()),
            sender: sender.into(),
            base_url: "https://api.twilio.com".to_string(),
            menu_templates: HashMap::new(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_menu_template(mut self, menu: MenuId, content_sid: impl Into<String>) -> Self {
        self.menu_templates.insert(menu, content_sid.into());
        self
    }
}

/// [`ChatTransport`] implementation over the Twilio Messages API.
pub struct TwilioTransport {
    settings: TwilioSettings,
    client: Client,
}

impl TwilioTransport {
    pub fn new(settings: TwilioSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { settings, client })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.settings.base_url, self.settings.account_sid
        )
    }

    async fn post_message(&self, params: Vec<(&str, String)>) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(
                &self.settings.account_sid,
                Some(self.settings.auth_token.expose_secret()),
            )
            .form(&params)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "twilio message accepted");
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(TransportError::Rejected(format!("{status}: {detail}")))
        }
    }

    fn base_params(&self, to: &Identity) -> Vec<(&'static str, String)> {
        vec![
            ("From", self.settings.sender.clone()),
            ("To", to.whatsapp_address()),
        ]
    }
}

#[async_trait]
impl ChatTransport for TwilioTransport {
    async fn send_text(&self, to: &Identity, body: &str) -> Result<(), TransportError> {
        let mut params = self.base_params(to);
        params.push(("Body", body.to_string()));
        self.post_message(params).await
    }

    async fn send_menu(&self, to: &Identity, menu: MenuId) -> Result<(), TransportError> {
        let content_sid = self
            .settings
            .menu_templates
            .get(&menu)
            .ok_or(TransportError::UnknownMenu(menu))?;
        let mut params = self.base_params(to);
        params.push(("ContentSid", content_sid.clone()));
        self.post_message(params).await
    }

    async fn send_media(
        &self,
        to: &Identity,
        url: &str,
        caption: &str,
    ) -> Result<(), TransportError> {
        let mut params = self.base_params(to);
        params.push(("MediaUrl", url.to_string()));
        params.push(("Body", caption.to_string()));
        self.post_message(params).await
    }
}
