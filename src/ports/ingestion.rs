//! Ingestion port: hands a received file descriptor to the storage workflow.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::Identity;

/// Descriptor of a pending upload forwarded to the ingestion workflow.
///
/// The workflow downloads the media itself; we only forward the reference
/// plus the user-chosen display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadDescriptor {
    pub owner: Identity,
    pub file_name: String,
    pub remote_url: String,
    pub content_type: String,
}

/// Ingestion failures.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("ingestion workflow rejected the file: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Port for the storage ingestion workflow.
#[async_trait]
pub trait IngestionClient: Send + Sync {
    /// Forwards a pending-upload descriptor for durable storage.
    async fn ingest(&self, descriptor: &UploadDescriptor) -> Result<(), IngestionError>;
}
