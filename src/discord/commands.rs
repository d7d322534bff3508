//! `!owl` prefix commands: definitions, pronunciation, and the privileged
//! channel-role settings.

use crate::config::COMMAND_PREFIX;
use crate::discord::{send_outcome, BotState};
use crate::handlers::{self, Behavior, OutFile, Outcome, Reply, Tone};
use crate::settings::ChannelRole;
use crate::tts::PronounceRequest;
use crate::ChannelId;

use serenity::client::Context;
use serenity::model::channel::Message;

/// A parsed `!owl` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Define { word: String, full: bool },
    Pronounce { input: String },
    Set { role: ChannelRole, target: SetTarget },
    ShowSettings,
}

/// What a `set` subcommand points the role at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetTarget {
    Channel(ChannelId),
    Off,
    /// Unparseable argument; the executor answers with usage help.
    Invalid,
}

/// Parse a message as a command. `None` means the message is not addressed
/// to the command prefix and should flow on to routing.
pub fn parse(content: &str) -> Option<Command> {
    let rest = content.trim().strip_prefix(COMMAND_PREFIX)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        // "!owlish" is not for us.
        return None;
    }

    let rest = rest.trim();
    if rest.is_empty() {
        return Some(Command::Help);
    }

    let (sub, args) = match rest.split_once(char::is_whitespace) {
        Some((sub, args)) => (sub, args.trim()),
        None => (rest, ""),
    };

    match sub {
        "def" => Some(Command::Define {
            word: args.to_owned(),
            full: false,
        }),
        "deff" => Some(Command::Define {
            word: args.to_owned(),
            full: true,
        }),
        "p" | "pronounce" => Some(Command::Pronounce {
            input: args.to_owned(),
        }),
        "settings" => Some(Command::ShowSettings),
        "set" => Some(parse_set(args)),
        _ => Some(Command::Help),
    }
}

fn parse_set(args: &str) -> Command {
    let (role_token, target_token) = match args.split_once(char::is_whitespace) {
        Some((role, target)) => (role, target.trim()),
        None => (args, ""),
    };

    let role = match role_token {
        "translation-channel" => ChannelRole::Translation,
        "voice-channel" => ChannelRole::Transcription,
        "judge-channel" => ChannelRole::Judge,
        "dictionary-channel" => ChannelRole::Dictionary,
        _ => return Command::Help,
    };

    Command::Set {
        role,
        target: parse_target(target_token),
    }
}

fn parse_target(token: &str) -> SetTarget {
    if token.eq_ignore_ascii_case("off") {
        return SetTarget::Off;
    }
    let id = token
        .strip_prefix("<#")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(token);
    match id.parse::<ChannelId>() {
        Ok(id) => SetTarget::Channel(id),
        Err(_) => SetTarget::Invalid,
    }
}

/// Execute a command and send its result.
pub async fn run(ctx: &Context, msg: &Message, state: &BotState, command: Command) {
    let outcome = match command {
        Command::Help => Outcome::reply(help_reply()),
        Command::Define { word, full } => define(state, &word, full).await,
        Command::Pronounce { input } => pronounce(state, &input).await,
        Command::Set { role, target } => set_channel(ctx, msg, state, role, target).await,
        Command::ShowSettings => show_settings(ctx, msg, state).await,
    };
    send_outcome(ctx, msg, outcome).await;
}

fn help_reply() -> Reply {
    Reply::new(
        Behavior::Settings,
        "🦉 Owl Commands",
        "`!owl` — Show this help\n\
         `!owl def [word]` — Quick definition\n\
         `!owl deff [word]` — Full definition\n\
         `!owl p [accent] [words]` — Pronounce\n\
         `!owl set translation-channel [#channel|off]`\n\
         `!owl set voice-channel [#channel|off]`\n\
         `!owl set judge-channel [#channel|off]`\n\
         `!owl set dictionary-channel [#channel|off]`\n\
         `!owl settings` — Show current server settings",
    )
}

async fn define(state: &BotState, word: &str, full: bool) -> Outcome {
    let word = word.trim();
    if word.is_empty() {
        return Outcome::reply(Reply::failure(
            Behavior::Definition,
            "Please provide a word.",
        ));
    }

    match handlers::dictionary::handle_definition(&state.caps.chat, word, full).await {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::warn!(%error, "definition lookup failed");
            Outcome::reply(Reply::failure(Behavior::Definition, "Couldn't look that up."))
        }
    }
}

async fn pronounce(state: &BotState, input: &str) -> Outcome {
    let Some(request) = PronounceRequest::parse(input) else {
        let accents: Vec<&str> = crate::tts::Accent::ALL.iter().map(|a| a.as_str()).collect();
        let mut reply = Reply::failure(Behavior::Pronunciation, "Give me something to pronounce.");
        reply.body = format!(
            "Usage: `!owl p [accent] [words]` — accents: {}",
            accents.join(", ")
        );
        return Outcome::reply(reply);
    };

    match state
        .caps
        .synthesizer
        .synthesize(&request.text, request.accent)
        .await
    {
        Ok(path) => {
            let mut reply = Reply::new(Behavior::Pronunciation, "🔊 Pronunciation", "")
                .with_field("Word", &request.text, true)
                .with_field("Accent", request.accent.as_str(), true);
            reply.tone = Tone::Success;

            Outcome {
                reactions: Vec::new(),
                replies: vec![reply],
                file: Some(OutFile {
                    filename: request.filename(),
                    path,
                }),
            }
        }
        Err(error) => {
            tracing::warn!(%error, "speech synthesis failed");
            Outcome::reply(Reply::failure(
                Behavior::Pronunciation,
                "Couldn't generate pronunciation.",
            ))
        }
    }
}

async fn set_channel(
    ctx: &Context,
    msg: &Message,
    state: &BotState,
    role: ChannelRole,
    target: SetTarget,
) -> Outcome {
    let Some(guild_id) = msg.guild_id.map(|id| id.get()) else {
        return Outcome::reply(Reply::failure(
            Behavior::Settings,
            "Settings only work inside a server.",
        ));
    };

    if !can_manage_guild(ctx, msg).await {
        return Outcome::reply(Reply::failure(
            Behavior::Settings,
            "You need the Manage Server permission for that.",
        ));
    }

    let result = match target {
        SetTarget::Invalid => {
            return Outcome::reply(Reply::failure(
                Behavior::Settings,
                "Usage: `!owl set translation-channel #channel|off` etc.",
            ));
        }
        SetTarget::Off => state.caps.settings.clear(guild_id, role).await.map(|_| {
            Reply::new(
                Behavior::Settings,
                format!("✅ {} channel cleared.", role_label(role)),
                "",
            )
        }),
        SetTarget::Channel(channel_id) => state
            .caps
            .settings
            .assign(guild_id, role, channel_id)
            .await
            .map(|_| {
                let mut reply = Reply::new(
                    Behavior::Settings,
                    format!("✅ {} channel set.", role_label(role)),
                    "",
                )
                .with_field("Channel", format!("<#{channel_id}>"), true);
                reply.tone = Tone::Success;
                reply
            }),
    };

    match result {
        Ok(reply) => Outcome::reply(reply),
        Err(error) => {
            tracing::warn!(guild_id, %error, "settings update failed");
            Outcome::reply(Reply::failure(Behavior::Settings, "Couldn't update settings."))
        }
    }
}

async fn show_settings(ctx: &Context, msg: &Message, state: &BotState) -> Outcome {
    let Some(guild_id) = msg.guild_id.map(|id| id.get()) else {
        return Outcome::reply(Reply::failure(
            Behavior::Settings,
            "Settings only work inside a server.",
        ));
    };

    let settings = match state.caps.settings.get(guild_id).await {
        Ok(settings) => settings,
        Err(error) => {
            tracing::warn!(guild_id, %error, "settings lookup failed");
            return Outcome::reply(Reply::failure(
                Behavior::Settings,
                "Couldn't read settings.",
            ));
        }
    };

    let guild_name = msg
        .guild(&ctx.cache)
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| "this server".to_owned());

    let format_channel =
        |id: Option<ChannelId>| id.map(|id| format!("<#{id}>")).unwrap_or_else(|| "—".to_owned());

    let mut reply = Reply::new(
        Behavior::Settings,
        format!("🛠️ Owl Settings — {guild_name}"),
        "",
    )
    .with_field(
        "Translation Channel",
        format_channel(settings.translation_channel_id),
        false,
    )
    .with_field(
        "Transcription Channel",
        format_channel(settings.voice_channel_id),
        false,
    )
    .with_field("Judge Channel", format_channel(settings.judge_channel_id), false)
    .with_field(
        "Dictionary Channel",
        format_channel(settings.dictionary_channel_id),
        false,
    );
    reply.tone = Tone::Success;
    if let Some(updated_at) = settings.updated_at {
        reply = reply.with_footer(format!(
            "Last updated {}",
            updated_at.format("%Y-%m-%d %H:%M UTC")
        ));
    }

    Outcome::reply(reply)
}

fn role_label(role: ChannelRole) -> &'static str {
    match role {
        ChannelRole::Translation => "Translation",
        ChannelRole::Transcription => "Voice/transcription",
        ChannelRole::Judge => "Judge",
        ChannelRole::Dictionary => "Dictionary",
    }
}

async fn can_manage_guild(ctx: &Context, msg: &Message) -> bool {
    let Ok(member) = msg.member(&ctx.http).await else {
        return false;
    };
    let Some(guild) = msg.guild(&ctx.cache) else {
        return false;
    };
    guild.member_permissions(&member).manage_guild()
}
