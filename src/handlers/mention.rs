//! Mention-triggered conversational replies.

use crate::context::ConversationTurn;
use crate::error::AdapterError;
use crate::handlers::{Behavior, Outcome, Reply};
use crate::llm::{ChatClient, ChatMessage, ChatRole};
use crate::BOT_NAME;

/// Token budget for every conversational reply.
pub const TOKEN_LIMIT: u32 = 200;

const SYSTEM_WITH_MEMORY: &str = "You are Owl 🦉, a witty but thoughtful assistant in a \
Discord server. Be helpful, kind, and sharp. Keep replies under 200 tokens.";

const SYSTEM_WITHOUT_MEMORY: &str = "You are Owl 🦉, a smart assistant in a Discord \
server. Keep it short, lighthearted, and clever. Under 200 tokens.";

/// Assemble the completion payload: system instruction (picked by history
/// presence), the history turns, then the current user turn.
pub fn build_payload(text: &str, history: &[ConversationTurn]) -> Vec<ChatMessage> {
    let system = if history.is_empty() {
        SYSTEM_WITHOUT_MEMORY
    } else {
        SYSTEM_WITH_MEMORY
    };

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::new(ChatRole::System, system));
    for turn in history {
        messages.push(ChatMessage::new(turn.role, turn.render()));
    }
    messages.push(ChatMessage::new(ChatRole::User, text));
    messages
}

/// Run the chat call and wrap the reply for presentation.
pub async fn handle(
    chat: &ChatClient,
    text: &str,
    history: &[ConversationTurn],
) -> Result<Outcome, AdapterError> {
    let payload = build_payload(text, history);
    let reply = chat.complete(&payload, TOKEN_LIMIT).await?;

    Ok(Outcome::reply(Reply::new(
        Behavior::MentionChat,
        format!("🦉 {BOT_NAME} says"),
        reply,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_without_history_uses_the_short_prompt() {
        let payload = build_payload("hello", &[]);

        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].role, ChatRole::System);
        assert_eq!(payload[0].content, SYSTEM_WITHOUT_MEMORY);
        assert_eq!(payload[1].role, ChatRole::User);
        assert_eq!(payload[1].content, "hello");
    }

    #[test]
    fn payload_with_history_interleaves_turns_before_the_current_message() {
        let history = vec![
            ConversationTurn {
                role: ChatRole::User,
                speaker: "alice".to_owned(),
                content: "what's a fence?".to_owned(),
            },
            ConversationTurn {
                role: ChatRole::Assistant,
                speaker: "Owl 🦉".to_owned(),
                content: "a barrier".to_owned(),
            },
        ];
        let payload = build_payload("and a gate? -", &history);

        assert_eq!(payload.len(), 4);
        assert_eq!(payload[0].content, SYSTEM_WITH_MEMORY);
        assert_eq!(payload[1].content, "alice: what's a fence?");
        assert_eq!(payload[2].role, ChatRole::Assistant);
        assert_eq!(payload[2].content, "Owl 🦉: a barrier");
        assert_eq!(payload[3].content, "and a gate? -");
    }
}
