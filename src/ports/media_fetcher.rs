//! Media fetcher port: stages transport-hosted media on the local disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Download failures.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("download failed with status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("could not write staged file: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for downloading remote media into a staging directory.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Downloads `url` into `dest_dir`, naming the file `stem` plus an
    /// extension derived from `content_type`. Returns the staged path.
    async fn fetch(
        &self,
        url: &str,
        content_type: &str,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, FetchError>;
}
