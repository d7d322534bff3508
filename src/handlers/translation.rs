//! Translation-channel behavior: detect the source language, translate to
//! English, and report both with a confidence score.

use crate::error::AdapterError;
use crate::handlers::{Behavior, Outcome, Reply};
use crate::langid;
use crate::llm::{ChatClient, ChatMessage, ChatRole};

/// Translate `text` to English and package the result for presentation.
///
/// `requester` is the display name of the message author, carried into the
/// footer together with the detection confidence.
pub async fn handle(
    chat: &ChatClient,
    text: &str,
    requester: &str,
) -> Result<Outcome, AdapterError> {
    let (language, confidence) = langid::detect(text);
    let translated = translate_to_english(chat, text).await?;

    let source_flag = langid::flag(language);
    let target_flag = langid::flag("eng");

    let reply = Reply::new(
        Behavior::Translation,
        "🌐 Translation",
        format!("{source_flag} → {target_flag}\n\n> {translated}"),
    )
    .with_footer(format!(
        "Requested by {requester} • Confidence {confidence:.2}"
    ));

    Ok(Outcome::reply(reply))
}

async fn translate_to_english(chat: &ChatClient, text: &str) -> Result<String, AdapterError> {
    let prompt = format!(
        "Translate the following to natural English. Only return the translation:\n\n\"{}\"",
        text.trim()
    );
    chat.complete(&[ChatMessage::new(ChatRole::User, prompt)], 120)
        .await
}
