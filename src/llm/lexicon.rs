//! Dictionary lookups backed by the chat model.
//!
//! The model is asked for strict JSON; responses are salvage-parsed and
//! cleaned, with one simplified retry pass and a one-liner fallback, so a
//! lookup always yields at least one usable entry and never errors the
//! calling handler.

use crate::llm::{ChatClient, ChatMessage, ChatRole, CompletionOptions};
use std::sync::OnceLock;

const SYSTEM: &str = "You are an expert English lexicographer. \
Given a word or short phrase, return concise, modern explanations. \
Put the most common, general meanings first. Keep examples short and natural.";

const JSON_INSTRUCTIONS: &str = "Respond in STRICT JSON with keys: word (string), \
entries (array of 1-5 objects). Each entry object MUST have: pos (string, lowercase \
like 'noun' or 'verb'), meaning (string <= 22 words, simple wording), synonyms \
(array of 0-5 short strings), antonyms (array of 0-5 short strings), example \
(string <= 16 words). No markdown, no commentary, JSON only.";

/// One cleaned dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconEntry {
    pub pos: String,
    pub meaning: String,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
    pub example: Option<String>,
}

/// Lookup result: the (possibly normalized) headword plus its entries.
/// `entries` is never empty.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub word: String,
    pub entries: Vec<LexiconEntry>,
}

/// Look up a word or phrase, returning at most `max_entries` entries.
///
/// Parse failures degrade through a second, simpler request and finally a
/// plain-text one-liner; adapter transport errors still propagate.
pub async fn lookup(
    chat: &ChatClient,
    term: &str,
    max_entries: usize,
) -> Result<Lexicon, crate::AdapterError> {
    let options = CompletionOptions {
        max_tokens: Some(500),
        temperature: Some(0.2),
        json_object: true,
    };

    let first = chat
        .complete_with(
            &[
                ChatMessage::new(ChatRole::System, SYSTEM),
                ChatMessage::new(
                    ChatRole::User,
                    format!("Word: {term}\nMax entries: {max_entries}\n\n{JSON_INSTRUCTIONS}"),
                ),
            ],
            options,
        )
        .await?;

    let mut parsed = salvage_json(&first);

    if parsed.is_none() {
        tracing::debug!(term, "lexicon response unparseable, retrying once");
        let second = chat
            .complete_with(
                &[
                    ChatMessage::new(ChatRole::System, SYSTEM),
                    ChatMessage::new(
                        ChatRole::User,
                        format!("Word: {term}\nReturn 1-4 entries.\n{JSON_INSTRUCTIONS}"),
                    ),
                ],
                CompletionOptions {
                    max_tokens: Some(400),
                    ..options
                },
            )
            .await?;
        parsed = salvage_json(&second);
    }

    let parsed = parsed.unwrap_or(serde_json::Value::Null);
    let word = parsed["word"]
        .as_str()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .unwrap_or(term)
        .to_owned();
    let entries = clean_entries(parsed["entries"].as_array(), max_entries);

    if !entries.is_empty() {
        return Ok(Lexicon { word, entries });
    }

    // Last resort: one short main meaning, guaranteed single entry.
    let meaning = one_liner(chat, term).await?;
    Ok(Lexicon {
        word,
        entries: vec![LexiconEntry {
            pos: "meaning".to_owned(),
            meaning: if meaning.is_empty() {
                "A commonly used English term.".to_owned()
            } else {
                meaning
            },
            synonyms: Vec::new(),
            antonyms: Vec::new(),
            example: None,
        }],
    })
}

async fn one_liner(chat: &ChatClient, term: &str) -> Result<String, crate::AdapterError> {
    let text = chat
        .complete_with(
            &[
                ChatMessage::new(ChatRole::System, SYSTEM),
                ChatMessage::new(
                    ChatRole::User,
                    format!("Give ONE short main meaning (<= 18 words) for: {term}\nPlain text only; no quotes."),
                ),
            ],
            CompletionOptions {
                max_tokens: Some(60),
                temperature: Some(0.2),
                json_object: false,
            },
        )
        .await?;
    Ok(text.trim().to_owned())
}

/// Parse model output that should be JSON but may carry code fences or
/// surrounding prose. Returns `None` only when no object can be recovered.
pub fn salvage_json(text: &str) -> Option<serde_json::Value> {
    let stripped = strip_code_fences(text);
    if let Ok(value) = serde_json::from_str(stripped) {
        return Some(value);
    }

    // Salvage the first top-level JSON object in the text.
    static OBJECT_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = OBJECT_RE.get_or_init(|| regex::Regex::new(r"(?s)\{.*\}").expect("valid regex"));
    let candidate = re.find(stripped)?;
    serde_json::from_str(candidate.as_str()).ok()
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").or_else(|| rest.strip_prefix("JSON")).unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Drop malformed entries and bound list sizes. Entries without a meaning
/// are useless and removed entirely.
fn clean_entries(raw: Option<&Vec<serde_json::Value>>, max_entries: usize) -> Vec<LexiconEntry> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.iter()
        .take(max_entries)
        .filter_map(|entry| {
            let object = entry.as_object()?;
            let meaning = object.get("meaning")?.as_str()?.trim();
            if meaning.is_empty() {
                return None;
            }
            let pos = object
                .get("pos")
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "meaning".to_owned());
            let example = object
                .get("example")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned);

            Some(LexiconEntry {
                pos,
                meaning: meaning.to_owned(),
                synonyms: string_list(object.get("synonyms")),
                antonyms: string_list(object.get("antonyms")),
                example,
            })
        })
        .collect()
}

fn string_list(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .take(5)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn parses_clean_json() {
        let value = salvage_json(r#"{"word":"banana","entries":[]}"#).expect("should parse");
        assert_eq!(value["word"], "banana");
    }

    #[test]
    fn strips_code_fences_before_parsing() {
        let fenced = indoc! {r#"
            ```json
            {"word": "banana", "entries": []}
            ```
        "#};
        let value = salvage_json(fenced).expect("should parse fenced JSON");
        assert_eq!(value["word"], "banana");
    }

    #[test]
    fn salvages_object_embedded_in_prose() {
        let noisy = r#"Here you go: {"word": "fence", "entries": []} hope that helps!"#;
        let value = salvage_json(noisy).expect("should salvage embedded object");
        assert_eq!(value["word"], "fence");
    }

    #[test]
    fn rejects_text_with_no_object() {
        assert!(salvage_json("no json here at all").is_none());
    }

    #[test]
    fn cleaning_drops_meaningless_entries_and_bounds_lists() {
        let raw = serde_json::json!([
            {
                "pos": "  Noun ",
                "meaning": " a long yellow fruit ",
                "synonyms": ["plantain", "", "  ", "fruit", "herb", "crop", "extra"],
                "antonyms": [],
                "example": "  "
            },
            { "pos": "verb", "meaning": "" },
            "not an object",
            { "meaning": "to go wrong", "example": "the plan went bananas" }
        ]);
        let entries = clean_entries(raw.as_array(), 6);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pos, "noun");
        assert_eq!(entries[0].meaning, "a long yellow fruit");
        assert_eq!(entries[0].synonyms, ["plantain", "fruit", "herb", "crop", "extra"]);
        assert_eq!(entries[0].example, None);
        assert_eq!(entries[1].pos, "meaning");
        assert_eq!(entries[1].example.as_deref(), Some("the plan went bananas"));
    }

    #[test]
    fn cleaning_respects_entry_cap() {
        let raw = serde_json::json!([
            { "pos": "noun", "meaning": "one" },
            { "pos": "noun", "meaning": "two" },
            { "pos": "noun", "meaning": "three" }
        ]);
        let entries = clean_entries(raw.as_array(), 2);
        assert_eq!(entries.len(), 2);
    }
}
