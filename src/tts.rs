//! Text-to-speech pronunciation audio.

use crate::config::OpenAiConfig;
use crate::error::AdapterError;
use std::io::Write as _;
use tempfile::TempPath;

/// English accents the pronounce command understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accent {
    #[default]
    Us,
    Uk,
    Au,
    In,
    Ca,
    Ie,
    Za,
}

impl Accent {
    pub const ALL: [Accent; 7] = [
        Accent::Us,
        Accent::Uk,
        Accent::Au,
        Accent::In,
        Accent::Ca,
        Accent::Ie,
        Accent::Za,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Accent::Us => "us",
            Accent::Uk => "uk",
            Accent::Au => "au",
            Accent::In => "in",
            Accent::Ca => "ca",
            Accent::Ie => "ie",
            Accent::Za => "za",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "us" => Some(Accent::Us),
            "uk" => Some(Accent::Uk),
            "au" => Some(Accent::Au),
            "in" => Some(Accent::In),
            "ca" => Some(Accent::Ca),
            "ie" => Some(Accent::Ie),
            "za" => Some(Accent::Za),
            _ => None,
        }
    }

    /// Synthesis voice carrying this accent.
    fn voice(self) -> &'static str {
        match self {
            Accent::Us => "alloy",
            Accent::Uk => "fable",
            Accent::Au => "nova",
            Accent::In => "shimmer",
            Accent::Ca => "echo",
            Accent::Ie => "onyx",
            Accent::Za => "verse",
        }
    }
}

impl std::fmt::Display for Accent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parsed `[accent] words…` input for the pronounce command.
///
/// Two-stage parse: the leading token is interpreted against the fixed
/// accent set; on a miss the entire input is the text to pronounce with the
/// default accent. No positional guessing beyond that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PronounceRequest {
    pub accent: Accent,
    pub text: String,
}

impl PronounceRequest {
    /// `None` when there is nothing to pronounce (empty input, or an accent
    /// token with no words after it).
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let (head, rest) = match input.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (input, ""),
        };

        match Accent::parse(head) {
            Some(accent) if !rest.is_empty() => Some(Self {
                accent,
                text: rest.to_owned(),
            }),
            Some(_) => None,
            None => Some(Self {
                accent: Accent::default(),
                text: input.to_owned(),
            }),
        }
    }

    /// Attachment filename for the synthesized audio.
    pub fn filename(&self) -> String {
        let safe = self.text.to_lowercase().replace(' ', "_");
        match self.accent {
            Accent::Us => format!("{safe}.mp3"),
            accent => format!("{safe}_{accent}.mp3"),
        }
    }
}

/// Client for `/v1/audio/speech`.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl Synthesizer {
    pub fn new(http: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.speech_model.clone(),
        }
    }

    /// Synthesize speech into a temp file.
    ///
    /// The returned [`TempPath`] deletes the file when dropped, so the audio
    /// is cleaned up on every exit path once the caller is done sending it.
    pub async fn synthesize(
        &self,
        text: &str,
        accent: Accent,
    ) -> Result<TempPath, AdapterError> {
        let body = serde_json::json!({
            "model": self.model,
            "voice": accent.voice(),
            "input": text,
        });

        let response = self
            .http
            .post(format!("{}/v1/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
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

        let bytes = response.bytes().await?;
        let mut file = tempfile::Builder::new()
            .prefix("owl-tts-")
            .suffix(".mp3")
            .tempfile()?;
        file.write_all(&bytes)?;
        Ok(file.into_temp_path())
    }
}
