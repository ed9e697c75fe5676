//! Document question-answering port.

use async_trait::async_trait;
use std::path::Path;

/// Q&A failures.
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("could not extract text from document: {0}")]
    Extraction(String),

    #[error("inference request failed: {0}")]
    Inference(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Port for answering a natural-language question about a staged document.
///
/// Operates only on already-downloaded PDF documents.
#[async_trait]
pub trait DocumentQa: Send + Sync {
    /// Returns a short answer grounded in the document's content.
    async fn answer(&self, document: &Path, question: &str) -> Result<String, QaError>;
}
