//! Blob store port: durable file storage plus the per-user file index.

use async_trait::async_trait;
use std::path::Path;

use crate::domain::foundation::Identity;

/// Failures talking to the blob store or the file index.
#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("file index query failed: {0}")]
    IndexQuery(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Port for the external blob store and relational file index.
///
/// `resolve` and `list` are read-only and idempotent: calling them twice
/// without intervening writes returns the same result.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Uploads a local file and returns its durable fetch URL.
    async fn upload(&self, local_path: &Path) -> Result<String, FileStoreError>;

    /// Resolves a stored file by owner and display name to a fetch URL.
    async fn resolve(
        &self,
        owner: &Identity,
        file_name: &str,
    ) -> Result<Option<String>, FileStoreError>;

    /// Lists the display names of an owner's stored files.
    async fn list(&self, owner: &Identity) -> Result<Vec<String>, FileStoreError>;
}
