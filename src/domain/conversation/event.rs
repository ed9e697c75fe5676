//! Inbound chat events.

use crate::domain::foundation::Identity;
use crate::domain::session::PendingMedia;

/// An inbound message carried neither text nor media.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("inbound message must carry text or media")]
pub struct EmptyMessage;

/// One webhook delivery, immutable.
///
/// At least one of `body`/`media` is always present; the constructor rejects
/// empty events so the engine never sees one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub from: Identity,
    pub body: Option<String>,
    pub media: Option<PendingMedia>,
}

impl InboundMessage {
    /// Builds an inbound message, rejecting events with neither text nor media.
    pub fn new(
        from: Identity,
        body: Option<String>,
        media: Option<PendingMedia>,
    ) -> Result<Self, EmptyMessage> {
        let body = body.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());
        if body.is_none() && media.is_none() {
            return Err(EmptyMessage);
        }
        Ok(Self { from, body, media })
    }

    /// The message text lower-cased for command matching.
    pub fn command_token(&self) -> Option<String> {
        self.body.as_ref().map(|b| b.trim().to_ascii_lowercase())
    }

    /// True when the event carries an attachment.
    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> PendingMedia {
        PendingMedia {
            remote_url: "https://example.com/f.pdf".into(),
            content_type: "application/pdf".into(),
        }
    }

    #[test]
    fn rejects_empty_events() {
        let result = InboundMessage::new(Identity::new("+1"), None, None);
        assert_eq!(result, Err(EmptyMessage));
    }

    #[test]
    fn blank_body_counts_as_absent() {
        let result = InboundMessage::new(Identity::new("+1"), Some("   ".into()), None);
        assert_eq!(result, Err(EmptyMessage));

        let msg = InboundMessage::new(Identity::new("+1"), Some("  ".into()), Some(media()))
            .expect("media-only event is valid");
        assert!(msg.body.is_none());
    }

    #[test]
    fn command_token_lowercases() {
        let msg = InboundMessage::new(Identity::new("+1"), Some(" Retrieve ".into()), None)
            .expect("valid");
        assert_eq!(msg.command_token().as_deref(), Some("retrieve"));
    }
}
