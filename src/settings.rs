//! Per-guild channel role assignments and read-side role resolution.

pub mod store;

use crate::{ChannelId, GuildId};
use serde::{Deserialize, Serialize};

/// A behavior assigned to a single channel within a guild.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRole {
    Translation,
    Transcription,
    Judge,
    Dictionary,
}

impl ChannelRole {
    /// Resolution priority when a record violates the one-role-per-channel
    /// invariant: higher wins. The assignment path keeps records clean, so
    /// this order only matters for hand-edited or legacy rows.
    pub const PRIORITY: [ChannelRole; 4] = [
        ChannelRole::Dictionary,
        ChannelRole::Judge,
        ChannelRole::Translation,
        ChannelRole::Transcription,
    ];

    /// Settings column backing this role.
    pub fn column(self) -> &'static str {
        match self {
            ChannelRole::Translation => "translation_channel_id",
            ChannelRole::Transcription => "voice_channel_id",
            ChannelRole::Judge => "judge_channel_id",
            ChannelRole::Dictionary => "dictionary_channel_id",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelRole::Translation => "translation",
            ChannelRole::Transcription => "voice",
            ChannelRole::Judge => "judge",
            ChannelRole::Dictionary => "dictionary",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "translation" => Some(ChannelRole::Translation),
            "voice" | "transcription" => Some(ChannelRole::Transcription),
            "judge" => Some(ChannelRole::Judge),
            "dictionary" => Some(ChannelRole::Dictionary),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Channel role assignments for one guild.
///
/// Reading a guild with no stored row yields the all-unset default; nothing
/// is persisted until the first write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildSettings {
    pub guild_id: GuildId,
    pub translation_channel_id: Option<ChannelId>,
    pub voice_channel_id: Option<ChannelId>,
    pub judge_channel_id: Option<ChannelId>,
    pub dictionary_channel_id: Option<ChannelId>,
    /// When the record was last written; `None` for the default-on-read
    /// value of a guild that was never configured.
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl GuildSettings {
    /// All-unset settings for a guild that has never been configured.
    pub fn unset(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            translation_channel_id: None,
            voice_channel_id: None,
            judge_channel_id: None,
            dictionary_channel_id: None,
            updated_at: None,
        }
    }

    /// Configured channel for a role, if any.
    pub fn channel_for(&self, role: ChannelRole) -> Option<ChannelId> {
        match role {
            ChannelRole::Translation => self.translation_channel_id,
            ChannelRole::Transcription => self.voice_channel_id,
            ChannelRole::Judge => self.judge_channel_id,
            ChannelRole::Dictionary => self.dictionary_channel_id,
        }
    }

    /// Resolve the role claimed by a channel, if any.
    ///
    /// A clean record matches at most one role. If a violated record matches
    /// several, the fixed priority order decides and the conflict is logged;
    /// one message must never fire two behaviors.
    pub fn role_for_channel(&self, channel_id: ChannelId) -> Option<ChannelRole> {
        let mut matches = ChannelRole::PRIORITY
            .into_iter()
            .filter(|role| self.channel_for(*role) == Some(channel_id));

        let winner = matches.next()?;
        let losers: Vec<ChannelRole> = matches.collect();
        if !losers.is_empty() {
            tracing::warn!(
                guild_id = self.guild_id,
                channel_id,
                winner = %winner,
                shadowed = ?losers.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
                "channel claims multiple roles; resolving by priority"
            );
        }
        Some(winner)
    }

    /// Whether mention-chat must refuse to operate in this channel.
    ///
    /// Translation, transcription, and judge channels are off limits so an
    /// unrelated behavior never stacks on top of a role-specific channel.
    /// Dictionary channels are not in the set; the dictionary path wins there
    /// through routing precedence instead.
    pub fn is_excluded_channel(&self, channel_id: ChannelId) -> bool {
        [
            self.translation_channel_id,
            self.voice_channel_id,
            self.judge_channel_id,
        ]
        .contains(&Some(channel_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_unique_role() {
        let mut settings = GuildSettings::unset(1);
        settings.translation_channel_id = Some(10);
        settings.judge_channel_id = Some(20);

        assert_eq!(settings.role_for_channel(10), Some(ChannelRole::Translation));
        assert_eq!(settings.role_for_channel(20), Some(ChannelRole::Judge));
        assert_eq!(settings.role_for_channel(30), None);
    }

    #[test]
    fn violated_record_resolves_by_priority_deterministically() {
        let mut settings = GuildSettings::unset(1);
        settings.translation_channel_id = Some(10);
        settings.judge_channel_id = Some(10);

        for _ in 0..3 {
            assert_eq!(settings.role_for_channel(10), Some(ChannelRole::Judge));
        }

        settings.dictionary_channel_id = Some(10);
        for _ in 0..3 {
            assert_eq!(settings.role_for_channel(10), Some(ChannelRole::Dictionary));
        }
    }

    #[test]
    fn exclusion_covers_translation_voice_judge_but_not_dictionary() {
        let mut settings = GuildSettings::unset(1);
        settings.translation_channel_id = Some(10);
        settings.voice_channel_id = Some(11);
        settings.judge_channel_id = Some(12);
        settings.dictionary_channel_id = Some(13);

        assert!(settings.is_excluded_channel(10));
        assert!(settings.is_excluded_channel(11));
        assert!(settings.is_excluded_channel(12));
        assert!(!settings.is_excluded_channel(13));
        assert!(!settings.is_excluded_channel(14));
    }

    #[test]
    fn role_names_round_trip() {
        for role in ChannelRole::PRIORITY {
            assert_eq!(ChannelRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(ChannelRole::parse("transcription"), Some(ChannelRole::Transcription));
        assert_eq!(ChannelRole::parse("bogus"), None);
    }
}
