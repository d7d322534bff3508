//! Transcription-channel behavior: download each audio-like attachment and
//! post its transcript.

use crate::fetch::Fetcher;
use crate::handlers::{Behavior, Outcome, Reply};
use crate::router::AttachmentRef;
use crate::stt::Transcriber;

/// Longest transcript slice per reply.
pub const CHUNK_LEN: usize = 1800;

/// Process the qualifying attachments of one message.
///
/// Attachments are handled independently and in order: a failed download or
/// transcription yields a failure notice for that attachment and the loop
/// moves on to its siblings. Each temp file is removed when its scope ends,
/// whatever the exit path.
pub async fn handle(
    fetcher: &Fetcher,
    transcriber: &Transcriber,
    attachments: &[&AttachmentRef],
) -> Outcome {
    let mut outcome = Outcome::default();

    for attachment in attachments {
        match transcribe_one(fetcher, transcriber, attachment).await {
            Ok(text) if text.trim().is_empty() => {
                outcome.replies.push(Reply::failure(
                    Behavior::Transcription,
                    "Transcription failed or empty.",
                ));
            }
            Ok(text) => {
                let chunks = chunk_text(&text, CHUNK_LEN);
                let total = chunks.len();
                for (index, chunk) in chunks.into_iter().enumerate() {
                    let title = if total == 1 {
                        "📜 Transcription".to_owned()
                    } else {
                        format!("📜 Transcription ({}/{total})", index + 1)
                    };
                    outcome.replies.push(Reply::new(
                        Behavior::Transcription,
                        title,
                        format!("> {chunk}"),
                    ));
                }
            }
            Err(error) => {
                tracing::warn!(
                    filename = %attachment.filename,
                    %error,
                    "attachment transcription failed"
                );
                outcome.replies.push(Reply::failure(
                    Behavior::Transcription,
                    "Couldn't transcribe the audio.",
                ));
            }
        }
    }

    outcome
}

/// Download then transcribe a single attachment. The download completes
/// fully before transcription starts; the temp file dies with this scope.
async fn transcribe_one(
    fetcher: &Fetcher,
    transcriber: &Transcriber,
    attachment: &AttachmentRef,
) -> Result<String, crate::AdapterError> {
    let temp = tempfile::Builder::new()
        .prefix("owl-audio-")
        .suffix(&suffix_for(&attachment.filename))
        .tempfile()?
        .into_temp_path();

    fetcher.download(&attachment.url, &temp).await?;
    transcriber.transcribe(&temp).await
}

/// Keep the original extension so the transcription endpoint can sniff the
/// container format.
fn suffix_for(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!(".{}", ext.to_lowercase()),
        _ => ".bin".to_owned(),
    }
}

/// Split on char boundaries into slices of at most `max_len` characters.
fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_len)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
