//! Discord gateway: event handling, dispatch, and outcome rendering.

pub mod commands;

use crate::config::Config;
use crate::context::{self, HistoryMessage, HistorySource};
use crate::handlers::{self, Behavior, Outcome, Reply, Tone};
use crate::router::{self, AttachmentRef, MessageView, RoutedAction};
use crate::Capabilities;

use async_trait::async_trait;
use serenity::builder::{
    CreateAttachment, CreateEmbed, CreateEmbedFooter, CreateMessage, GetMessages,
};
use serenity::client::{Client, Context, EventHandler};
use serenity::model::channel::{Message, ReactionType};
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::id::{MessageId, UserId};
use serenity::model::Colour;
use std::sync::Arc;

/// Discord caps embed field values at 1024 characters.
const FIELD_VALUE_LIMIT: usize = 1024;

/// Shared state for the event handler.
pub struct BotState {
    pub caps: Capabilities,
    pub config: Config,
}

/// The gateway event handler. One `message` invocation runs per inbound
/// message, concurrently with all others; nothing here blocks the loop.
pub struct OwlHandler {
    state: Arc<BotState>,
}

impl OwlHandler {
    pub fn new(state: Arc<BotState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl EventHandler for OwlHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(
            user = %ready.user.name,
            id = %ready.user.id,
            guilds = ready.guilds.len(),
            "connected to Discord"
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        // Privileged/utility commands are consumed before routing so a
        // command message can never double-handle as a watcher behavior.
        if let Some(command) = commands::parse(&msg.content) {
            commands::run(&ctx, &msg, &self.state, command).await;
            return;
        }

        let bot_id = ctx.cache.current_user().id;
        let view = view_from_message(&msg, bot_id);
        if let Some(reason) = router::early_drop(&view) {
            tracing::trace!(?reason, "message dropped");
            return;
        }
        let guild_id = view.guild_id.unwrap_or_default();

        // Settings are read fresh for every message; a store failure drops
        // this message with a warning but never the dispatch loop.
        let settings = match self.state.caps.settings.get(guild_id).await {
            Ok(settings) => settings,
            Err(error) => {
                tracing::warn!(guild_id, %error, "settings lookup failed; dropping message");
                return;
            }
        };

        let action = router::decide(&view, &settings);
        let behavior = match &action {
            RoutedAction::Drop(reason) => {
                tracing::trace!(?reason, channel_id = view.channel_id, "message dropped");
                return;
            }
            RoutedAction::MentionChat { .. } => Behavior::MentionChat,
            RoutedAction::Translate { .. } => Behavior::Translation,
            RoutedAction::Judge { .. } => Behavior::Rating,
            RoutedAction::Define { .. } => Behavior::Dictionary,
            RoutedAction::Transcribe { .. } => Behavior::Transcription,
        };

        let handled = tokio::time::timeout(
            self.state.config.handler_timeout,
            self.run_action(&ctx, &msg, &view, action),
        )
        .await;

        match handled {
            Ok(Ok(outcome)) => send_outcome(&ctx, &msg, outcome).await,
            Ok(Err(error)) => {
                tracing::warn!(?behavior, %error, "handler failed");
                let notice = Outcome::reply(Reply::failure(behavior, failure_title(behavior)));
                send_outcome(&ctx, &msg, notice).await;
            }
            Err(_) => {
                tracing::warn!(?behavior, "handler timed out");
                let notice = Outcome::reply(Reply::failure(behavior, "That took too long."));
                send_outcome(&ctx, &msg, notice).await;
            }
        }
    }
}

impl OwlHandler {
    async fn run_action(
        &self,
        ctx: &Context,
        msg: &Message,
        view: &MessageView,
        action: RoutedAction,
    ) -> Result<Outcome, crate::AdapterError> {
        let caps = &self.state.caps;
        match action {
            // Drop is resolved by the caller before dispatch; it never reaches here.
            RoutedAction::Drop(_) => unreachable!("Drop is handled before run_action"),
            RoutedAction::MentionChat { text, with_history } => {
                let history = if with_history {
                    let source = DiscordHistory {
                        http: &ctx.http,
                        bot_id: ctx.cache.current_user().id,
                    };
                    match context::build_history(&source, view.channel_id, msg.id.get()).await {
                        Ok(history) => history,
                        Err(error) => {
                            // History is an enhancement; answer without it.
                            tracing::warn!(%error, "history fetch failed, replying without it");
                            Vec::new()
                        }
                    }
                } else {
                    Vec::new()
                };
                handlers::mention::handle(&caps.chat, &text, &history).await
            }
            RoutedAction::Translate { text } => {
                handlers::translation::handle(&caps.chat, &text, msg.author.display_name()).await
            }
            RoutedAction::Judge { text } => handlers::rating::handle(&caps.chat, &text).await,
            RoutedAction::Define { term } => {
                handlers::dictionary::handle_glossary(&caps.chat, &term).await
            }
            RoutedAction::Transcribe { attachments } => {
                let selected: Vec<&AttachmentRef> = attachments
                    .iter()
                    .filter_map(|&index| view.attachments.get(index))
                    .collect();
                Ok(handlers::transcription::handle(&caps.fetcher, &caps.transcriber, &selected)
                    .await)
            }
        }
    }
}

/// Project a serenity message into the router's platform-free view.
fn view_from_message(msg: &Message, bot_id: UserId) -> MessageView {
    MessageView {
        guild_id: msg.guild_id.map(|id| id.get()),
        channel_id: msg.channel_id.get(),
        author_is_bot: msg.author.bot,
        mentions_self: msg.mentions.iter().any(|user| user.id == bot_id),
        content: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|attachment| AttachmentRef {
                filename: attachment.filename.clone(),
                content_type: attachment.content_type.clone(),
                url: attachment.url.clone(),
            })
            .collect(),
    }
}

/// Channel history via the REST API, newest first.
struct DiscordHistory<'a> {
    http: &'a serenity::http::Http,
    bot_id: UserId,
}

#[async_trait]
impl HistorySource for DiscordHistory<'_> {
    async fn recent_before(
        &self,
        channel_id: u64,
        before_message: u64,
        limit: u8,
    ) -> crate::Result<Vec<HistoryMessage>> {
        let builder = GetMessages::new()
            .before(MessageId::new(before_message))
            .limit(limit);
        let messages = serenity::model::id::ChannelId::new(channel_id)
            .messages(self.http, builder)
            .await
            .map_err(|error| anyhow::anyhow!("history fetch failed: {error}"))?;

        Ok(messages
            .into_iter()
            .map(|message| HistoryMessage {
                author_display: message.author.display_name().to_owned(),
                author_is_self: message.author.id == self.bot_id,
                content: message.content,
            })
            .collect())
    }
}

fn failure_title(behavior: Behavior) -> &'static str {
    match behavior {
        Behavior::MentionChat => "Couldn't think of a reply.",
        Behavior::Translation => "Couldn't translate that.",
        Behavior::Rating => "Couldn't rate that.",
        Behavior::Dictionary | Behavior::Definition => "Couldn't look that up.",
        Behavior::Transcription => "Couldn't transcribe the audio.",
        Behavior::Pronunciation => "Couldn't generate pronunciation.",
        Behavior::Settings => "Couldn't update settings.",
    }
}

/// Render an outcome: reactions on the triggering message, then each reply
/// as an embed, with any audio file attached to the first.
pub(crate) async fn send_outcome(ctx: &Context, msg: &Message, outcome: Outcome) {
    for emoji in &outcome.reactions {
        if let Err(error) = msg
            .react(&ctx.http, ReactionType::Unicode(emoji.clone()))
            .await
        {
            // Typically missing Add Reactions permission; skip the rest.
            tracing::debug!(%error, "failed to add reaction");
            break;
        }
    }

    let mut file = outcome.file;
    for reply in &outcome.replies {
        let mut builder = CreateMessage::new().embed(embed_for(reply));

        if let Some(out_file) = file.take() {
            match tokio::fs::read(&out_file.path).await {
                Ok(bytes) => {
                    builder =
                        builder.add_file(CreateAttachment::bytes(bytes, out_file.filename.clone()));
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to read outgoing attachment");
                }
            }
            // out_file drops here; the temp file is gone either way.
        }

        if let Err(error) = msg.channel_id.send_message(&ctx.http, builder).await {
            tracing::warn!(%error, "failed to send reply");
        }
    }
}

/// Build an embed from a plain-data reply. The only place presentation
/// markup decisions live.
fn embed_for(reply: &Reply) -> CreateEmbed {
    let colour = match reply.tone {
        Tone::Info => Colour::BLUE,
        Tone::Success => Colour::TEAL,
        Tone::Failure => Colour::RED,
    };

    let mut embed = CreateEmbed::new().colour(colour);
    if !reply.title.is_empty() {
        embed = embed.title(&reply.title);
    }
    if !reply.body.is_empty() {
        embed = embed.description(&reply.body);
    }
    for field in &reply.fields {
        embed = embed.field(&field.name, truncate(&field.value, FIELD_VALUE_LIMIT), field.inline);
    }
    if let Some(footer) = &reply.footer {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    embed
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    text.chars().take(max_chars).collect()
}

/// Build and run the Discord client until it exits or fails.
pub async fn run(state: Arc<BotState>) -> crate::Result<()> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::MESSAGE_CONTENT;

    let token = state.config.discord_token.clone();
    let mut client = Client::builder(&token, intents)
        .event_handler(OwlHandler::new(state))
        .await
        .map_err(|error| anyhow::anyhow!("failed to create Discord client: {error}"))?;

    client
        .start()
        .await
        .map_err(|error| anyhow::anyhow!("Discord client error: {error}"))?;

    Ok(())
}
