//! Workflow ingestion client.
//!
//! Forwards a pending-upload descriptor to the storage workflow's webhook;
//! the workflow downloads the media, stores it durably, and records it in
//! the file index.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::ports::{IngestionClient, IngestionError, UploadDescriptor};

/// [`IngestionClient`] posting descriptors to a workflow webhook.
pub struct WorkflowIngestion {
    webhook_url: String,
    client: Client,
}

impl WorkflowIngestion {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, IngestionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestionError::Network(e.to_string()))?;
        Ok(Self {
            webhook_url: webhook_url.into(),
            client,
        })
    }
}

#[async_trait]
impl IngestionClient for WorkflowIngestion {
    async fn ingest(&self, descriptor: &UploadDescriptor) -> Result<(), IngestionError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(descriptor)
            .send()
            .await
            .map_err(|e| IngestionError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(file_name = %descriptor.file_name, "descriptor forwarded to ingestion");
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(IngestionError::Rejected(format!("{status}: {detail}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Identity;

    #[test]
    fn descriptor_serializes_all_fields() {
        let descriptor = UploadDescriptor {
            owner: Identity::new("whatsapp:+1555"),
            file_name: "taxes".into(),
            remote_url: "https://api.twilio.com/media/1".into(),
            content_type: "application/pdf".into(),
        };
        let json = serde_json::to_value(&descriptor).expect("serializes");
        assert_eq!(json["owner"], "+1555");
        assert_eq!(json["file_name"], "taxes");
        assert_eq!(json["remote_url"], "https://api.twilio.com/media/1");
        assert_eq!(json["content_type"], "application/pdf");
    }
}
