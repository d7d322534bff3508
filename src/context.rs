//! Conversation history window for mention-triggered chat.

use crate::error::Result;
use crate::llm::ChatRole;
use crate::ChannelId;
use async_trait::async_trait;

/// Messages scanned from channel history per invocation.
pub const SCAN_LIMIT: u8 = 50;

/// Turns kept after chronological ordering; the oldest beyond the cap are
/// dropped, never the newest.
pub const KEEP_LAST: usize = 20;

/// One attributed utterance reconstructed from channel history. Built fresh
/// for each mention-chat invocation and discarded after the completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub speaker: String,
    pub content: String,
}

impl ConversationTurn {
    /// Render with uniform speaker attribution so the model can follow
    /// multi-party context.
    pub fn render(&self) -> String {
        format!("{}: {}", self.speaker, self.content)
    }
}

/// A raw message as the platform reports it, newest first.
#[derive(Debug, Clone)]
pub struct HistoryMessage {
    pub author_display: String,
    /// True when the bot itself wrote the message.
    pub author_is_self: bool,
    pub content: String,
}

/// Source of channel history strictly before a triggering message. The
/// Discord layer implements this over the REST API; tests supply vectors.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Up to `limit` messages before `before_message`, newest first.
    async fn recent_before(
        &self,
        channel_id: ChannelId,
        before_message: u64,
        limit: u8,
    ) -> Result<Vec<HistoryMessage>>;
}

/// Fetch and assemble the bounded history window for a mention-chat call.
pub async fn build_history(
    source: &dyn HistorySource,
    channel_id: ChannelId,
    before_message: u64,
) -> Result<Vec<ConversationTurn>> {
    let raw = source
        .recent_before(channel_id, before_message, SCAN_LIMIT)
        .await?;
    Ok(assemble_turns(raw))
}

/// Turn newest-first raw messages into an oldest-first turn sequence.
///
/// Empty-content messages are skipped before the cap applies; other bots are
/// ordinary speakers, only the bot's own messages map to the assistant role.
pub fn assemble_turns(newest_first: Vec<HistoryMessage>) -> Vec<ConversationTurn> {
    let mut turns: Vec<ConversationTurn> = newest_first
        .into_iter()
        .filter(|message| !message.content.trim().is_empty())
        .map(|message| ConversationTurn {
            role: if message.author_is_self {
                ChatRole::Assistant
            } else {
                ChatRole::User
            },
            speaker: message.author_display,
            content: message.content.trim().to_owned(),
        })
        .collect();

    turns.reverse();
    if turns.len() > KEEP_LAST {
        turns.drain(..turns.len() - KEEP_LAST);
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(author: &str, is_self: bool, content: &str) -> HistoryMessage {
        HistoryMessage {
            author_display: author.to_owned(),
            author_is_self: is_self,
            content: content.to_owned(),
        }
    }

    #[test]
    fn caps_at_twenty_newest_after_skipping_empties() {
        // Newest first: 60 raw messages, every 12th empty (5 empties).
        let newest_first: Vec<HistoryMessage> = (0..60)
            .map(|i| {
                let content = if i % 12 == 0 {
                    String::new()
                } else {
                    format!("message {i}")
                };
                HistoryMessage {
                    author_display: "alice".to_owned(),
                    author_is_self: false,
                    content,
                }
            })
            .collect();

        let turns = assemble_turns(newest_first);

        assert_eq!(turns.len(), KEEP_LAST);
        // Oldest retained first, newest last. Index 0 was newest and is
        // empty, so the newest surviving turn is "message 1" and the window
        // reaches back to the 20th eligible message, "message 21".
        assert_eq!(turns.last().expect("non-empty").content, "message 1");
        assert_eq!(turns.first().expect("non-empty").content, "message 21");
    }

    #[test]
    fn orders_oldest_to_newest() {
        let turns = assemble_turns(vec![
            raw("bob", false, "third"),
            raw("owl", true, "second"),
            raw("alice", false, "first"),
        ]);

        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, ["first", "second", "third"]);
    }

    #[test]
    fn only_own_messages_map_to_assistant() {
        let turns = assemble_turns(vec![
            raw("owl", true, "my reply"),
            raw("helper-bot", false, "automated notice"),
            raw("alice", false, "question"),
        ]);

        assert_eq!(turns[0].role, ChatRole::User);
        assert_eq!(turns[1].role, ChatRole::User, "other bots are ordinary speakers");
        assert_eq!(turns[2].role, ChatRole::Assistant);
    }

    #[test]
    fn renders_with_speaker_attribution() {
        let turn = ConversationTurn {
            role: ChatRole::User,
            speaker: "alice".to_owned(),
            content: "hello there".to_owned(),
        };
        assert_eq!(turn.render(), "alice: hello there");
    }
}
