//! HTTP download of exported bundles

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use super::traits::BundleDownloader;
use crate::errors::MigrationError;

/// Downloads bundles from pre-signed URLs.
///
/// A failed download is not retried: the URL is time-limited and a retry
/// should re-check the job first.
pub struct HttpBundleDownloader {
    client: Client,
}

impl HttpBundleDownloader {
    pub fn new(timeout: Duration) -> Result<Self, MigrationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MigrationError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

/// Drop the query string so signatures never reach the logs
fn redact_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[async_trait]
impl BundleDownloader for HttpBundleDownloader {
    async fn download(&self, url: &str) -> Result<Bytes, MigrationError> {
        debug!("Downloading bundle from {}", redact_url(url));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| MigrationError::Download(e.without_url().to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| MigrationError::Download(e.without_url().to_string()))?;

        debug!("Downloaded {} bytes", body.len());
        Ok(body)
    }
}
