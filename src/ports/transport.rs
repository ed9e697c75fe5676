//! Chat transport port.

use async_trait::async_trait;

use crate::domain::conversation::MenuId;
use crate::domain::foundation::Identity;

/// Transport-level send failures.
///
/// All sends are best-effort: the engine logs these and carries on, so a
/// transport outage can never corrupt a committed session transition.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport rejected the message: {0}")]
    Rejected(String),

    #[error("no template configured for menu '{0}'")]
    UnknownMenu(MenuId),

    #[error("network error: {0}")]
    Network(String),
}

/// Port for sending messages to a chat identity.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends a plain text message.
    async fn send_text(&self, to: &Identity, body: &str) -> Result<(), TransportError>;

    /// Sends an interactive template menu.
    async fn send_menu(&self, to: &Identity, menu: MenuId) -> Result<(), TransportError>;

    /// Sends a media attachment with a caption.
    async fn send_media(&self, to: &Identity, url: &str, caption: &str)
        -> Result<(), TransportError>;
}
