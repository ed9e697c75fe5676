//! Assistant replier port.
//!
//! Optional collaborator that turns free-form text in the entry state into a
//! short capability-scoped reply. When absent or failing, the engine falls
//! back to the generic menu alone.

use async_trait::async_trait;

/// Assistant reply failures.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("inference request failed: {0}")]
    Inference(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Port for generating a conversational reply to an off-flow query.
#[async_trait]
pub trait AssistantReplier: Send + Sync {
    /// Returns a short reply describing what the bot can do for this query.
    async fn reply(&self, query: &str) -> Result<String, AssistantError>;
}
