//! Blob store client: storage gateway uploads plus the Postgres file index.
//!
//! Uploads go to an S3-fronting storage gateway over HTTP; the gateway
//! responds with the durable public URL. Lookups (list/resolve) read the
//! relational file index, which joins `files` to `users` by phone number.
//! Both operations are read-only and idempotent from the engine's view.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::domain::foundation::Identity;
use crate::ports::{FileStore, FileStoreError};

/// Storage gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Base URL of the upload gateway, e.g. `https://storage.internal`.
    pub base_url: String,
    pub timeout: Duration,
}

impl GatewaySettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn upload_url(&self, file_name: &str) -> String {
        format!("{}/files/{}", self.base_url.trim_end_matches('/'), file_name)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// [`FileStore`] over the storage gateway and the Postgres file index.
pub struct BlobFileStore {
    settings: GatewaySettings,
    client: Client,
    pool: PgPool,
}

impl BlobFileStore {
    pub fn new(settings: GatewaySettings, pool: PgPool) -> Result<Self, FileStoreError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| FileStoreError::Network(e.to_string()))?;
        Ok(Self {
            settings,
            client,
            pool,
        })
    }
}

#[async_trait]
impl FileStore for BlobFileStore {
    async fn upload(&self, local_path: &Path) -> Result<String, FileStoreError> {
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                FileStoreError::UploadFailed(format!(
                    "not a file path: {}",
                    local_path.display()
                ))
            })?;

        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| FileStoreError::UploadFailed(e.to_string()))?;

        let response = self
            .client
            .post(self.settings.upload_url(file_name))
            .body(bytes)
            .send()
            .await
            .map_err(|e| FileStoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FileStoreError::UploadFailed(format!("{status}: {detail}")));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| FileStoreError::UploadFailed(e.to_string()))?;
        debug!(file_name, url = %body.url, "file uploaded");
        Ok(body.url)
    }

    async fn resolve(
        &self,
        owner: &Identity,
        file_name: &str,
    ) -> Result<Option<String>, FileStoreError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT f.s3_url
             FROM files f
             JOIN users u ON f.user_id = u.user_id
             WHERE u.phone_number = $1 AND f.original_filename = $2",
        )
        .bind(owner.as_str())
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FileStoreError::IndexQuery(e.to_string()))?;

        Ok(row.map(|(url,)| url))
    }

    async fn list(&self, owner: &Identity) -> Result<Vec<String>, FileStoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT f.original_filename
             FROM files f
             JOIN users u ON f.user_id = u.user_id
             WHERE u.phone_number = $1
             ORDER BY f.original_filename",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FileStoreError::IndexQuery(e.to_string()))?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
