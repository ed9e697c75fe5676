//! Outbound commands issued by the engine.

use super::menu::MenuId;

/// One outbound instruction to the chat transport.
///
/// Commands are fire-and-forget from the engine's perspective: a transport
/// failure is logged but never aborts the session transition that produced
/// the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    /// Plain text message.
    SendText(String),
    /// Interactive template menu.
    SendMenu(MenuId),
    /// Media attachment with a caption.
    SendMedia { url: String, caption: String },
}

impl OutboundCommand {
    /// Convenience constructor for text commands.
    pub fn text(body: impl Into<String>) -> Self {
        Self::SendText(body.into())
    }

    /// Convenience constructor for media commands.
    pub fn media(url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self::SendMedia {
            url: url.into(),
            caption: caption.into(),
        }
    }
}
