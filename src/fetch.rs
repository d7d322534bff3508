//! Remote file download for attachment processing.

use crate::error::AdapterError;
use std::path::Path;

/// Downloads attachment payloads to local files before they are handed to
/// the transcriber. A fetch fully completes (or fails) before any further
/// processing of the same attachment starts.
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: reqwest::Client,
}

impl Fetcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch `url` into `destination`, returning the number of bytes
    /// written. Non-success transport status is an error.
    pub async fn download(&self, url: &str, destination: &Path) -> Result<u64, AdapterError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: format!("download of {url} failed"),
            });
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(destination, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}
