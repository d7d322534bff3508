//! Message-dispatch decision logic.
//!
//! `decide` turns one inbound message plus the guild's settings into exactly
//! one action. It is pure over a platform-free [`MessageView`] so the
//! fire/skip rules are testable without a gateway connection.

use crate::settings::{ChannelRole, GuildSettings};
use crate::{ChannelId, GuildId};
use std::sync::OnceLock;

/// Marker character that opts a mention into the channel-history window.
pub const MEMORY_MARKER: char = '-';

/// Filename extensions accepted as transcribable when the platform supplied
/// no content type.
const AUDIO_EXTENSIONS: &[&str] = &[
    ".mp3", ".wav", ".m4a", ".aac", ".ogg", ".oga", ".opus", ".flac", ".wma", ".webm", ".mp4",
    ".m4v", ".mov", ".mkv",
];

/// Platform-free projection of an inbound message.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author_is_bot: bool,
    /// True when the bot appears among the message's addressed recipients.
    pub mentions_self: bool,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
}

/// Attachment metadata relevant to routing.
#[derive(Debug, Clone)]
pub struct AttachmentRef {
    pub filename: String,
    pub content_type: Option<String>,
    pub url: String,
}

impl AttachmentRef {
    /// Transcribable when the declared content type says audio or video, or
    /// the filename extension matches the allow-list (case-insensitive).
    pub fn is_audio_like(&self) -> bool {
        let content_type = self.content_type.as_deref().unwrap_or("").to_lowercase();
        if content_type.contains("audio") || content_type.contains("video") {
            return true;
        }
        let name = self.filename.to_lowercase();
        AUDIO_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
    }
}

/// The single behavior (if any) that fires for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutedAction {
    Drop(DropReason),
    MentionChat {
        text: String,
        with_history: bool,
    },
    Translate {
        text: String,
    },
    Judge {
        text: String,
    },
    Define {
        term: String,
    },
    Transcribe {
        attachments: Vec<usize>,
    },
}

/// Why a message was ignored. Carried for trace logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    BotAuthor,
    OutsideGuild,
    EmptyText,
    NoAudioAttachment,
    NotAddressed,
    ExcludedChannel,
}

/// Checks that need no settings lookup. Returns the reason to drop, or
/// `None` when the message is worth a settings read.
pub fn early_drop(view: &MessageView) -> Option<DropReason> {
    if view.author_is_bot {
        return Some(DropReason::BotAuthor);
    }
    if view.guild_id.is_none() {
        return Some(DropReason::OutsideGuild);
    }
    None
}

/// Decide which behavior fires for a message.
///
/// Role-claimed channels win over mention-chat: a translation-channel message
/// that also mentions the bot translates, it does not chat. Within the role
/// paths a channel holds at most one role, with `role_for_channel` breaking
/// ties on violated records.
pub fn decide(view: &MessageView, settings: &GuildSettings) -> RoutedAction {
    if let Some(reason) = early_drop(view) {
        return RoutedAction::Drop(reason);
    }

    match settings.role_for_channel(view.channel_id) {
        Some(ChannelRole::Translation) => {
            let text = clean_mentions(&view.content);
            if text.is_empty() {
                RoutedAction::Drop(DropReason::EmptyText)
            } else {
                RoutedAction::Translate { text }
            }
        }
        Some(ChannelRole::Judge) => {
            let text = view.content.trim();
            if text.is_empty() {
                RoutedAction::Drop(DropReason::EmptyText)
            } else {
                RoutedAction::Judge {
                    text: text.to_owned(),
                }
            }
        }
        Some(ChannelRole::Dictionary) => {
            let term = strip_decoration(&clean_mentions(&view.content));
            if term.is_empty() {
                RoutedAction::Drop(DropReason::EmptyText)
            } else {
                RoutedAction::Define { term }
            }
        }
        Some(ChannelRole::Transcription) => {
            let attachments: Vec<usize> = view
                .attachments
                .iter()
                .enumerate()
                .filter(|(_, att)| att.is_audio_like())
                .map(|(index, _)| index)
                .collect();
            if attachments.is_empty() {
                RoutedAction::Drop(DropReason::NoAudioAttachment)
            } else {
                RoutedAction::Transcribe { attachments }
            }
        }
        None => {
            if !view.mentions_self {
                return RoutedAction::Drop(DropReason::NotAddressed);
            }
            if settings.is_excluded_channel(view.channel_id) {
                // Unreachable for clean records (an excluded channel has a
                // role and matched above), kept for violated ones.
                return RoutedAction::Drop(DropReason::ExcludedChannel);
            }
            let text = clean_mentions(&view.content);
            let with_history = text.contains(MEMORY_MARKER);
            RoutedAction::MentionChat { text, with_history }
        }
    }
}

/// Strip addressed-recipient markup (`<@123>` / `<@!123>`) and trim.
pub fn clean_mentions(text: &str) -> String {
    static MENTION_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = MENTION_RE.get_or_init(|| regex::Regex::new(r"<@!?[0-9]+>").expect("valid regex"));
    let cleaned = re.replace_all(text, "");
    cleaned.replace(['\r', '\u{200b}'], "").trim().to_owned()
}

/// Strip surrounding quoting/formatting punctuation from a lookup phrase.
/// Interior punctuation and whitespace survive, so multi-word phrases pass
/// through verbatim.
pub fn strip_decoration(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| matches!(c, '`' | '*' | '_'))
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild_message(channel_id: ChannelId, content: &str) -> MessageView {
        MessageView {
            guild_id: Some(1),
            channel_id,
            author_is_bot: false,
            mentions_self: false,
            content: content.to_owned(),
            attachments: Vec::new(),
        }
    }

    fn settings_with(role: ChannelRole, channel_id: ChannelId) -> GuildSettings {
        let mut settings = GuildSettings::unset(1);
        match role {
            ChannelRole::Translation => settings.translation_channel_id = Some(channel_id),
            ChannelRole::Transcription => settings.voice_channel_id = Some(channel_id),
            ChannelRole::Judge => settings.judge_channel_id = Some(channel_id),
            ChannelRole::Dictionary => settings.dictionary_channel_id = Some(channel_id),
        }
        settings
    }

    #[test]
    fn drops_bot_authors_and_direct_messages() {
        let mut view = guild_message(10, "hello");
        view.author_is_bot = true;
        assert_eq!(early_drop(&view), Some(DropReason::BotAuthor));

        let mut view = guild_message(10, "hello");
        view.guild_id = None;
        assert_eq!(early_drop(&view), Some(DropReason::OutsideGuild));
    }

    #[test]
    fn mention_with_marker_requests_history() {
        let mut view = guild_message(10, "<@123> hello - remember?");
        view.mentions_self = true;
        let settings = GuildSettings::unset(1);

        match decide(&view, &settings) {
            RoutedAction::MentionChat { text, with_history } => {
                assert_eq!(text, "hello - remember?");
                assert!(with_history);
            }
            other => panic!("expected mention chat, got {other:?}"),
        }
    }

    #[test]
    fn mention_without_marker_skips_history() {
        let mut view = guild_message(10, "<@123> hello remember?");
        view.mentions_self = true;
        let settings = GuildSettings::unset(1);

        match decide(&view, &settings) {
            RoutedAction::MentionChat { with_history, .. } => assert!(!with_history),
            other => panic!("expected mention chat, got {other:?}"),
        }
    }

    #[test]
    fn mention_in_role_claimed_channel_routes_to_the_role() {
        let mut view = guild_message(10, "<@123> bonjour");
        view.mentions_self = true;
        let settings = settings_with(ChannelRole::Translation, 10);

        assert_eq!(
            decide(&view, &settings),
            RoutedAction::Translate {
                text: "bonjour".to_owned()
            }
        );
    }

    #[test]
    fn unaddressed_message_outside_role_channels_is_dropped() {
        let view = guild_message(10, "just chatting");
        let settings = settings_with(ChannelRole::Judge, 99);

        assert_eq!(
            decide(&view, &settings),
            RoutedAction::Drop(DropReason::NotAddressed)
        );
    }

    #[test]
    fn translation_drops_empty_after_mention_strip() {
        let view = guild_message(10, "<@123>   ");
        let settings = settings_with(ChannelRole::Translation, 10);

        assert_eq!(
            decide(&view, &settings),
            RoutedAction::Drop(DropReason::EmptyText)
        );
    }

    #[test]
    fn dictionary_strips_decoration_and_keeps_phrases() {
        let settings = settings_with(ChannelRole::Dictionary, 10);

        let view = guild_message(10, "  `banana`  ");
        assert_eq!(
            decide(&view, &settings),
            RoutedAction::Define {
                term: "banana".to_owned()
            }
        );

        let view = guild_message(10, "**on the fence**");
        assert_eq!(
            decide(&view, &settings),
            RoutedAction::Define {
                term: "on the fence".to_owned()
            }
        );

        for empty in ["   ", "```"] {
            let view = guild_message(10, empty);
            assert_eq!(
                decide(&view, &settings),
                RoutedAction::Drop(DropReason::EmptyText),
                "input {empty:?} should drop"
            );
        }
    }

    #[test]
    fn attachment_classification_by_extension_is_case_insensitive() {
        let clip = AttachmentRef {
            filename: "clip.MP4".to_owned(),
            content_type: None,
            url: String::new(),
        };
        assert!(clip.is_audio_like());

        let notes = AttachmentRef {
            filename: "notes.txt".to_owned(),
            content_type: None,
            url: String::new(),
        };
        assert!(!notes.is_audio_like());

        let voice = AttachmentRef {
            filename: "voice-message".to_owned(),
            content_type: Some("audio/ogg".to_owned()),
            url: String::new(),
        };
        assert!(voice.is_audio_like());
    }

    #[test]
    fn transcription_keeps_only_audio_like_attachments() {
        let mut view = guild_message(10, "");
        view.attachments = vec![
            AttachmentRef {
                filename: "notes.txt".to_owned(),
                content_type: Some("text/plain".to_owned()),
                url: String::new(),
            },
            AttachmentRef {
                filename: "clip.mp4".to_owned(),
                content_type: None,
                url: String::new(),
            },
        ];
        let settings = settings_with(ChannelRole::Transcription, 10);

        assert_eq!(
            decide(&view, &settings),
            RoutedAction::Transcribe {
                attachments: vec![1]
            }
        );

        view.attachments.pop();
        assert_eq!(
            decide(&view, &settings),
            RoutedAction::Drop(DropReason::NoAudioAttachment)
        );
    }

    #[test]
    fn judge_uses_raw_content_and_drops_blank() {
        let settings = settings_with(ChannelRole::Judge, 10);

        let view = guild_message(10, "  nice play  ");
        assert_eq!(
            decide(&view, &settings),
            RoutedAction::Judge {
                text: "nice play".to_owned()
            }
        );

        let view = guild_message(10, "   ");
        assert_eq!(
            decide(&view, &settings),
            RoutedAction::Drop(DropReason::EmptyText)
        );
    }

    #[test]
    fn clean_mentions_handles_nickname_markup() {
        assert_eq!(clean_mentions("<@!456> hey <@123> there"), "hey  there");
        assert_eq!(clean_mentions("plain"), "plain");
    }
}
