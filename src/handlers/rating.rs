//! Judge-channel behavior: rate a message 0-9 and pick emoji reactions.

use crate::error::AdapterError;
use crate::handlers::{Behavior, Outcome, Reply};
use crate::llm::{ChatClient, ChatMessage, ChatRole};
use std::sync::OnceLock;

/// Most emoji reactions applied per message, beyond the digit itself.
pub const MAX_EMOJIS: usize = 5;

/// A parsed rating. Malformed model output parses to the zero rating with no
/// emojis rather than failing the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    /// Single digit `'0'..='9'`.
    pub score: char,
    pub emojis: Vec<String>,
}

impl Default for Rating {
    fn default() -> Self {
        Self {
            score: '0',
            emojis: Vec::new(),
        }
    }
}

impl Rating {
    /// Keycap emoji for the score digit.
    pub fn score_emoji(&self) -> String {
        format!("{}\u{fe0f}\u{20e3}", self.score)
    }
}

/// Rate a message and react with the digit plus suggested emojis.
pub async fn handle(chat: &ChatClient, text: &str) -> Result<Outcome, AdapterError> {
    let prompt = format!(
        "You are Owl 🦉, a sharp and witty judge. \
         First, rate the following message with a single digit based on how cool (0-9). \
         Then, suggest 5 emoji reactions (funny, emotional, expressive) matching the vibe.\n\n\
         Format:\nRating: <digit>\nEmojis: 😬 🔥 💯 🤡 🧠\n\n\
         Message:\n\"{}\"",
        text.trim()
    );

    let output = chat
        .complete(&[ChatMessage::new(ChatRole::User, prompt)], 40)
        .await?;
    let rating = parse_rating(&output);

    let mut reactions = vec![rating.score_emoji()];
    reactions.extend(rating.emojis.iter().cloned());

    let emoji_line = if rating.emojis.is_empty() {
        "—".to_owned()
    } else {
        rating.emojis.join(" ")
    };
    let reply = Reply::new(
        Behavior::Rating,
        "🧮 Owl Rating",
        format!("Score: **{}** / 9\nEmojis: {emoji_line}", rating.score),
    );

    Ok(Outcome {
        reactions,
        replies: vec![reply],
        file: None,
    })
}

/// Parse `Rating: <digit>` and an `Emojis:` line out of model output.
/// Anything missing falls back to the default.
pub fn parse_rating(output: &str) -> Rating {
    static RATING_RE: OnceLock<regex::Regex> = OnceLock::new();
    static EMOJI_LINE_RE: OnceLock<regex::Regex> = OnceLock::new();

    let rating_re =
        RATING_RE.get_or_init(|| regex::Regex::new(r"Rating:\s*([0-9])").expect("valid regex"));
    let emoji_line_re =
        EMOJI_LINE_RE.get_or_init(|| regex::Regex::new(r"Emojis:\s*(.+)").expect("valid regex"));

    let score = rating_re
        .captures(output)
        .and_then(|captures| captures.get(1))
        .and_then(|digit| digit.as_str().chars().next())
        .unwrap_or('0');

    let emojis = emoji_line_re
        .captures(output)
        .and_then(|captures| captures.get(1))
        .map(|line| extract_emojis(line.as_str(), MAX_EMOJIS))
        .unwrap_or_default();

    Rating { score, emojis }
}

/// Pull up to `max` emoji out of a text fragment, in document order.
pub fn extract_emojis(text: &str, max: usize) -> Vec<String> {
    static EMOJI_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = EMOJI_RE.get_or_init(|| {
        regex::Regex::new(
            "[\u{1F600}-\u{1F64F}\
             \u{1F300}-\u{1F5FF}\
             \u{1F680}-\u{1F6FF}\
             \u{1F1E0}-\u{1F1FF}\
             \u{2700}-\u{27BF}\
             \u{1F900}-\u{1F9FF}\
             \u{2600}-\u{26FF}]+",
        )
        .expect("valid regex")
    });

    re.find_iter(text)
        .map(|m| m.as_str().to_owned())
        .take(max)
        .collect()
}
