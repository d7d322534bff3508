//! Owlbot: a Discord bot that routes guild messages to AI-assisted behaviors.
//!
//! Per-guild settings assign channels to behaviors (translation, rating,
//! dictionary, transcription); mentions anywhere else start a short chat.

pub mod config;
pub mod context;
pub mod db;
pub mod discord;
pub mod error;
pub mod fetch;
pub mod handlers;
pub mod langid;
pub mod llm;
pub mod router;
pub mod settings;
pub mod stt;
pub mod tts;

pub use error::{AdapterError, ConfigError, Error, Result, StoreError};

/// Discord snowflake for a guild.
pub type GuildId = u64;

/// Discord snowflake for a channel.
pub type ChannelId = u64;

/// Display name the bot signs its replies with.
pub const BOT_NAME: &str = "Owl 🦉";

/// Shared adapter bundle, constructed once at startup and passed to the
/// Discord layer. Replaces ambient global clients with explicit handles.
pub struct Capabilities {
    pub settings: settings::store::SettingsStore,
    pub chat: llm::ChatClient,
    pub transcriber: stt::Transcriber,
    pub synthesizer: tts::Synthesizer,
    pub fetcher: fetch::Fetcher,
}

impl Capabilities {
    /// Build every adapter from the loaded configuration.
    pub fn new(config: &config::Config, pool: sqlx::SqlitePool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(AdapterError::Http)?;

        Ok(Self {
            settings: settings::store::SettingsStore::new(pool),
            chat: llm::ChatClient::new(http.clone(), &config.openai),
            transcriber: stt::Transcriber::new(http.clone(), &config.openai),
            synthesizer: tts::Synthesizer::new(http.clone(), &config.openai),
            fetcher: fetch::Fetcher::new(http),
        })
    }
}
