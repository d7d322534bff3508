//! OpenAI-compatible chat completion client.

pub mod lexicon;

use crate::config::OpenAiConfig;
use crate::error::AdapterError;
use serde::{Deserialize, Serialize};

/// Role of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One message in a completion request.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Tuning knobs for a single completion call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Ask the provider for a strict JSON object response.
    pub json_object: bool,
}

/// Thin client over `/v1/chat/completions`. Constructed once at startup and
/// shared by reference; holds no per-request state.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(http: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.chat_model.clone(),
        }
    }

    /// Single completion call with a token budget. One attempt, no retry;
    /// rate limits and timeouts surface as `AdapterError`.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, AdapterError> {
        self.complete_with(
            messages,
            CompletionOptions {
                max_tokens: Some(max_tokens),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn complete_with(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String, AdapterError> {
        let payload: Vec<serde_json::Value> = messages
            .iter()
            .map(|message| {
                serde_json::json!({
                    "role": message.role.as_str(),
                    "content": message.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": payload,
        });
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if options.json_object {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_body: serde_json::Value = response.json().await.map_err(|e| {
            AdapterError::Malformed(format!("completion response ({status}) is not JSON: {e}"))
        })?;

        if !status.is_success() {
            let message = response_body["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_owned();
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response_body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                AdapterError::Malformed("completion response missing message content".into())
            })?;

        Ok(text.trim().to_owned())
    }
}
