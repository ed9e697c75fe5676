//! Chat participant identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable opaque key identifying a chat participant.
///
/// Twilio delivers WhatsApp senders as `whatsapp:+15551234567`; the prefix is
/// a transport concern, so it is stripped here and re-added by the Twilio
/// adapter when addressing outbound messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity from a raw sender address, normalizing away the
    /// `whatsapp:` prefix and surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        let normalized = trimmed.strip_prefix("whatsapp:").unwrap_or(trimmed);
        Self(normalized.to_string())
    }

    /// Returns the normalized identity string (e.g., `+15551234567`).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the WhatsApp-addressable form used by the Twilio API.
    pub fn whatsapp_address(&self) -> String {
        format!("whatsapp:{}", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
