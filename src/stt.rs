//! Speech-to-text via the hosted transcription endpoint.

use crate::config::OpenAiConfig;
use crate::error::AdapterError;
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// Client for `/v1/audio/transcriptions`.
#[derive(Debug, Clone)]
pub struct Transcriber {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl Transcriber {
    pub fn new(http: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.transcription_model.clone(),
        }
    }

    /// Transcribe a local audio file.
    ///
    /// The caller owns the file's lifetime; the fetch that produced it has
    /// already completed by the time this runs.
    pub async fn transcribe(&self, path: &Path) -> Result<String, AdapterError> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("audio")
            .to_owned();

        let form = Form::new()
            .part(
                "file",
                Part::bytes(bytes)
                    .file_name(filename)
                    .mime_str("application/octet-stream")
                    .map_err(AdapterError::Http)?,
            )
            .text("model", self.model.clone());

        let response = self
            .http
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            AdapterError::Malformed(format!("transcription response is not JSON: {e}"))
        })?;

        let text = body
            .get("text")
            .and_then(|value| value.as_str())
            .ok_or_else(|| AdapterError::Malformed("transcription response missing text".into()))?;

        Ok(text.trim().to_owned())
    }
}
