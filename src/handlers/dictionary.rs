//! Dictionary behaviors: glossary watcher entries and the def/deff commands.

use crate::error::AdapterError;
use crate::handlers::{Behavior, Outcome, Reply};
use crate::llm::lexicon::{self, LexiconEntry};
use crate::llm::ChatClient;

/// Glossary lookup for the dictionary channel: up to three short meanings
/// with synonyms, antonyms, and one example each.
pub async fn handle_glossary(chat: &ChatClient, term: &str) -> Result<Outcome, AdapterError> {
    let lexicon = lexicon::lookup(chat, term, 3).await?;

    let mut reply = Reply::new(
        Behavior::Dictionary,
        format!("📘 {}: quick meanings", lexicon.word),
        "",
    );
    for entry in &lexicon.entries {
        reply = reply.with_field(entry.pos.clone(), glossary_lines(entry), false);
    }

    Ok(Outcome::reply(reply))
}

/// Definition lookup for `!owl def` (quick) and `!owl deff` (full).
pub async fn handle_definition(
    chat: &ChatClient,
    term: &str,
    full: bool,
) -> Result<Outcome, AdapterError> {
    let max_entries = if full { 6 } else { 4 };
    let lexicon = lexicon::lookup(chat, term, max_entries).await?;

    let title = format!("🔍 Definition of **{}**", lexicon.word);
    let reply = if full {
        let mut reply = Reply::new(Behavior::Definition, title, "");
        for (index, entry) in lexicon.entries.iter().enumerate() {
            reply = reply.with_field(
                format!("Meaning ({})", entry.pos),
                definition_lines(index + 1, entry),
                false,
            );
        }
        reply
    } else {
        let primary = &lexicon.entries[0];
        Reply::new(Behavior::Definition, title, primary.meaning.clone())
    };

    Ok(Outcome::reply(reply))
}

fn glossary_lines(entry: &LexiconEntry) -> String {
    let mut lines = vec![format!("**Meaning:** {}", entry.meaning)];
    if !entry.synonyms.is_empty() {
        lines.push(format!("**Synonyms:** {}", entry.synonyms.join(", ")));
    }
    if !entry.antonyms.is_empty() {
        lines.push(format!("**Antonyms:** {}", entry.antonyms.join(", ")));
    }
    if let Some(example) = &entry.example {
        lines.push(format!("**Example:** _{example}_"));
    }
    lines.join("\n")
}

fn definition_lines(index: usize, entry: &LexiconEntry) -> String {
    let mut lines = vec![format!("**{index}.** {}", entry.meaning)];
    if !entry.synonyms.is_empty() {
        lines.push(format!("**Synonyms:** {}", entry.synonyms.join(", ")));
    }
    if !entry.antonyms.is_empty() {
        lines.push(format!("**Antonyms:** {}", entry.antonyms.join(", ")));
    }
    if let Some(example) = &entry.example {
        lines.push(format!("*Example:* {example}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> LexiconEntry {
        LexiconEntry {
            pos: "noun".to_owned(),
            meaning: "a barrier of posts".to_owned(),
            synonyms: vec!["barrier".to_owned()],
            antonyms: Vec::new(),
            example: Some("the fence needs paint".to_owned()),
        }
    }

    #[test]
    fn glossary_lines_skip_empty_sections() {
        let text = glossary_lines(&entry());
        assert!(text.contains("**Meaning:** a barrier of posts"));
        assert!(text.contains("**Synonyms:** barrier"));
        assert!(!text.contains("Antonyms"));
        assert!(text.contains("**Example:** _the fence needs paint_"));
    }

    #[test]
    fn definition_lines_number_the_meanings() {
        let text = definition_lines(2, &entry());
        assert!(text.starts_with("**2.** a barrier of posts"));
    }
}
