//! Downloader for Twilio-hosted media.
//!
//! Twilio media URLs require the account's basic-auth credentials. The file
//! extension is derived from the reported content type (unknown types land
//! as `.bin`); the destination directory is the caller's per-session staging
//! directory, so concurrent users never collide.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::domain::media::extension_for;
use crate::ports::{FetchError, MediaFetcher};

/// [`MediaFetcher`] authenticating against the Twilio media CDN.
pub struct TwilioMediaFetcher {
    account_sid: String,
    auth_token: Secret<String>,
    client: Client,
}

impl TwilioMediaFetcher {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            account_sid: account_sid.into(),
            auth_token,
            client,
        })
    }
}

#[async_trait]
impl MediaFetcher for TwilioMediaFetcher {
    async fn fetch(
        &self,
        url: &str,
        content_type: &str,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, FetchError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let path = dest_dir.join(format!("{stem}.{}", extension_for(content_type)));
        tokio::fs::write(&path, &bytes).await?;
        debug!(url, path = %path.display(), size = bytes.len(), "media staged");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_name_uses_content_type_extension() {
        // The path shape is decided before any I/O; pin it down here.
        let dir = Path::new("/tmp/staging");
        let path = dir.join(format!("{}.{}", "report", extension_for("application/pdf")));
        assert_eq!(path, PathBuf::from("/tmp/staging/report.pdf"));

        let path = dir.join(format!("{}.{}", "blob", extension_for("application/x-unknown")));
        assert_eq!(path, PathBuf::from("/tmp/staging/blob.bin"));
    }
}
