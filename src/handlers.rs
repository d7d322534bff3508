//! Behavior handlers and their plain-data outcomes.
//!
//! Handlers talk to capability adapters and return [`Outcome`] values; how
//! those render (embeds, reactions, uploads) is the Discord layer's problem.

pub mod dictionary;
pub mod mention;
pub mod rating;
pub mod transcription;
pub mod translation;

use serde::Serialize;

/// Which behavior produced an outcome.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    MentionChat,
    Translation,
    Rating,
    Dictionary,
    Transcription,
    Pronunciation,
    Definition,
    Settings,
}

/// Presentation tone; the renderer picks colors from this, never the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Info,
    Success,
    Failure,
}

/// One structured field of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A single message-shaped result: behavior tag, title, body, optional
/// structured fields and footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub behavior: Behavior,
    pub tone: Tone,
    pub title: String,
    pub body: String,
    pub fields: Vec<ReplyField>,
    pub footer: Option<String>,
}

impl Reply {
    pub fn new(behavior: Behavior, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            behavior,
            tone: Tone::Info,
            title: title.into(),
            body: body.into(),
            fields: Vec::new(),
            footer: None,
        }
    }

    /// Short failure notice. Every handler that can fail produces exactly
    /// one of these instead of staying silent.
    pub fn failure(behavior: Behavior, title: impl Into<String>) -> Self {
        Self {
            tone: Tone::Failure,
            body: "Please try again.".to_owned(),
            ..Self::new(behavior, format!("⚠️ {}", title.into()), "")
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(ReplyField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

/// A synthesized or downloaded file to attach to the reply. The temp path
/// removes the file when the outcome is dropped.
pub struct OutFile {
    pub filename: String,
    pub path: tempfile::TempPath,
}

/// Everything a handler wants the platform to do for one message.
#[derive(Default)]
pub struct Outcome {
    /// Emoji to react to the triggering message with, in order.
    pub reactions: Vec<String>,
    /// Replies to send, in order.
    pub replies: Vec<Reply>,
    /// Audio attachment accompanying the first reply.
    pub file: Option<OutFile>,
}

impl Outcome {
    pub fn reply(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            ..Default::default()
        }
    }
}
