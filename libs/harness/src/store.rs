//! Distributed config-store reads (passive oracle).
//!
//! The harness never parses or writes these blobs; it only compares
//! bytes across an observation window, relying on the external
//! system's own locking to make the comparison meaningful.

use std::time::Duration;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::HarnessConfig;
use crate::error::ClientError;

/// Read-only client for the distributed config store.
#[derive(Debug, Clone)]
pub struct ConfigStoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl ConfigStoreClient {
    /// Create a client for the configured store endpoint.
    pub fn new(config: &HarnessConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.store_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read the opaque blob stored at `path`.
    pub async fn read_blob(&self, path: &str) -> Result<Bytes, ClientError> {
        let url = format!("{}/v1/store/{}", self.base_url, path.trim_start_matches('/'));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, body));
        }

        let blob = response
            .bytes()
            .await
            .map_err(ClientError::from_transport)?;

        debug!(path = %path, bytes = blob.len(), digest = %digest(&blob), "Read store blob");
        Ok(blob)
    }
}

/// Short sha256 digest of a blob, for logs and mismatch reports.
pub(crate) fn digest(blob: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(blob);
    hex::encode(&hasher.finalize()[..8])
}
