//! Configuration loading and validation.

use crate::error::{ConfigError, Result};
use anyhow::Context as _;
use std::time::Duration;

/// Command prefix for the privileged settings/utility commands.
pub const COMMAND_PREFIX: &str = "!owl";

/// Owlbot configuration, loaded from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory path (holds the SQLite database).
    pub data_dir: std::path::PathBuf,

    /// Discord bot token.
    pub discord_token: String,

    /// OpenAI-compatible API configuration.
    pub openai: OpenAiConfig,

    /// Upper bound on handling a single inbound message, adapter calls
    /// included. Routing never retries; it waits at most this long.
    pub handler_timeout: Duration,
}

/// Credentials and model names for the OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key, required at startup.
    pub api_key: String,

    /// Base URL, e.g. `https://api.openai.com`.
    pub base_url: String,

    /// Chat completion model.
    pub chat_model: String,

    /// Speech-to-text model.
    pub transcription_model: String,

    /// Text-to-speech model.
    pub speech_model: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Missing credentials are a startup failure; the process must refuse to
    /// run without them rather than fail on the first message.
    pub fn load() -> Result<Self> {
        let discord_token = require_env("DISCORD_TOKEN")?;
        let api_key = require_env("OPENAI_API_KEY")?;

        let data_dir = match std::env::var("OWLBOT_DATA_DIR") {
            Ok(dir) => std::path::PathBuf::from(dir),
            Err(_) => dirs::data_dir()
                .map(|d| d.join("owlbot"))
                .unwrap_or_else(|| std::path::PathBuf::from("./data")),
        };

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

        let openai = OpenAiConfig {
            api_key,
            base_url: std::env::var("OWLBOT_OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".into()),
            chat_model: std::env::var("OWLBOT_CHAT_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".into()),
            transcription_model: std::env::var("OWLBOT_TRANSCRIPTION_MODEL")
                .unwrap_or_else(|_| "whisper-1".into()),
            speech_model: std::env::var("OWLBOT_SPEECH_MODEL").unwrap_or_else(|_| "tts-1".into()),
        };

        let handler_timeout = match std::env::var("OWLBOT_HANDLER_TIMEOUT_SECS") {
            Ok(value) => {
                let secs: u64 = value.parse().map_err(|_| {
                    ConfigError::Invalid(format!(
                        "OWLBOT_HANDLER_TIMEOUT_SECS must be an integer, got {value:?}"
                    ))
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(180),
        };

        Ok(Self {
            data_dir,
            discord_token,
            openai,
            handler_timeout,
        })
    }

    /// Get the SQLite database path.
    pub fn sqlite_path(&self) -> std::path::PathBuf {
        self.data_dir.join("owl.sqlite3")
    }
}

fn require_env(key: &'static str) -> Result<String> {
    let value = std::env::var(key)
        .map_err(|_| ConfigError::MissingKey(key))?
        .trim()
        .to_owned();
    if value.is_empty() {
        return Err(ConfigError::MissingKey(key).into());
    }
    Ok(value)
}
