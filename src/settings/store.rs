//! Guild settings persistence (SQLite).
//!
//! Every mutation is a single `INSERT … ON CONFLICT DO UPDATE` statement so
//! concurrent writers for the same guild can never interleave a stale
//! read-modify-write: two upserts touching different fields both land.

use crate::error::Result;
use crate::settings::{ChannelRole, GuildSettings};
use crate::{ChannelId, GuildId};
use sqlx::{Row as _, SqlitePool};

/// Partial update for a guild's role assignments. `None` fields are left
/// unchanged by `upsert`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsPatch {
    pub translation_channel_id: Option<ChannelId>,
    pub voice_channel_id: Option<ChannelId>,
    pub judge_channel_id: Option<ChannelId>,
    pub dictionary_channel_id: Option<ChannelId>,
}

/// Single source of truth for guild settings. Handlers read through `get`
/// on every message and never hold a record across messages.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    pool: SqlitePool,
}

impl SettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read a guild's settings, defaulting to all-unset when no row exists.
    ///
    /// The default is a returned value only; nothing is written until the
    /// first `upsert`/`assign`/`clear`.
    pub async fn get(&self, guild_id: GuildId) -> Result<GuildSettings> {
        let row = sqlx::query(
            "SELECT guild_id, translation_channel_id, voice_channel_id, judge_channel_id, \
             dictionary_channel_id, updated_at FROM guild_settings WHERE guild_id = ?",
        )
        .bind(guild_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::StoreError::Query)?;

        let Some(row) = row else {
            return Ok(GuildSettings::unset(guild_id));
        };

        let updated_at = row
            .try_get::<Option<chrono::NaiveDateTime>, _>("updated_at")
            .ok()
            .flatten()
            .map(|value| value.and_utc());

        Ok(GuildSettings {
            guild_id,
            translation_channel_id: read_channel(&row, "translation_channel_id")?,
            voice_channel_id: read_channel(&row, "voice_channel_id")?,
            judge_channel_id: read_channel(&row, "judge_channel_id")?,
            dictionary_channel_id: read_channel(&row, "dictionary_channel_id")?,
            updated_at,
        })
    }

    /// Merge the provided fields into the guild's record, creating it if
    /// absent, and refresh `updated_at`. Fields omitted from the patch are
    /// untouched even when a concurrent writer set them mid-flight.
    pub async fn upsert(&self, guild_id: GuildId, patch: SettingsPatch) -> Result<GuildSettings> {
        sqlx::query(
            "INSERT INTO guild_settings \
             (guild_id, translation_channel_id, voice_channel_id, judge_channel_id, dictionary_channel_id) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(guild_id) DO UPDATE SET \
               translation_channel_id = COALESCE(excluded.translation_channel_id, translation_channel_id), \
               voice_channel_id = COALESCE(excluded.voice_channel_id, voice_channel_id), \
               judge_channel_id = COALESCE(excluded.judge_channel_id, judge_channel_id), \
               dictionary_channel_id = COALESCE(excluded.dictionary_channel_id, dictionary_channel_id), \
               updated_at = datetime('now')",
        )
        .bind(guild_id as i64)
        .bind(patch.translation_channel_id.map(|id| id as i64))
        .bind(patch.voice_channel_id.map(|id| id as i64))
        .bind(patch.judge_channel_id.map(|id| id as i64))
        .bind(patch.dictionary_channel_id.map(|id| id as i64))
        .execute(&self.pool)
        .await
        .map_err(crate::StoreError::Query)?;

        self.get(guild_id).await
    }

    /// Assign a channel to a role, clearing any other role that currently
    /// points at the same channel. One statement, so resolution can never
    /// observe a channel with two roles written by this path.
    pub async fn assign(
        &self,
        guild_id: GuildId,
        role: ChannelRole,
        channel_id: ChannelId,
    ) -> Result<GuildSettings> {
        let column = role.column();
        let mut sql = format!(
            "INSERT INTO guild_settings (guild_id, {column}) VALUES (?, ?) \
             ON CONFLICT(guild_id) DO UPDATE SET {column} = excluded.{column}"
        );
        for other in ChannelRole::PRIORITY {
            if other != role {
                let other_column = other.column();
                sql.push_str(&format!(
                    ", {other_column} = CASE WHEN {other_column} = excluded.{column} \
                     THEN NULL ELSE {other_column} END"
                ));
            }
        }
        sql.push_str(", updated_at = datetime('now')");

        sqlx::query(&sql)
            .bind(guild_id as i64)
            .bind(channel_id as i64)
            .execute(&self.pool)
            .await
            .map_err(crate::StoreError::Query)?;

        self.get(guild_id).await
    }

    /// Unset exactly one role, leaving the others untouched.
    pub async fn clear(&self, guild_id: GuildId, role: ChannelRole) -> Result<GuildSettings> {
        let column = role.column();
        let sql = format!(
            "INSERT INTO guild_settings (guild_id) VALUES (?) \
             ON CONFLICT(guild_id) DO UPDATE SET {column} = NULL, updated_at = datetime('now')"
        );

        sqlx::query(&sql)
            .bind(guild_id as i64)
            .execute(&self.pool)
            .await
            .map_err(crate::StoreError::Query)?;

        self.get(guild_id).await
    }
}

fn read_channel(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Option<ChannelId>> {
    let value: Option<i64> = row.try_get(column).map_err(crate::StoreError::Query)?;
    Ok(value.map(|id| id as ChannelId))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn setup_store() -> SettingsStore {
        SettingsStore::new(db::memory_pool().await)
    }

    #[tokio::test]
    async fn get_of_unknown_guild_defaults_without_writing() {
        let store = setup_store().await;

        let settings = store.get(7).await.expect("get should succeed");
        assert_eq!(settings, GuildSettings::unset(7));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM guild_settings")
            .fetch_one(&store.pool)
            .await
            .expect("count should succeed");
        assert_eq!(count, 0, "default-on-read must not persist a row");
    }

    #[tokio::test]
    async fn upsert_is_idempotent_and_field_granular() {
        let store = setup_store().await;

        store
            .upsert(
                1,
                SettingsPatch {
                    voice_channel_id: Some(200),
                    ..Default::default()
                },
            )
            .await
            .expect("first upsert should succeed");

        let patch = SettingsPatch {
            translation_channel_id: Some(100),
            ..Default::default()
        };
        let once = store.upsert(1, patch).await.expect("upsert should succeed");
        let twice = store.upsert(1, patch).await.expect("repeat upsert should succeed");

        assert_eq!(once.translation_channel_id, twice.translation_channel_id);
        assert_eq!(once.voice_channel_id, twice.voice_channel_id);
        assert_eq!(twice.translation_channel_id, Some(100));
        assert_eq!(twice.voice_channel_id, Some(200), "unrelated field must survive");
        assert!(twice.updated_at.is_some(), "writes must stamp updated_at");
    }

    #[tokio::test]
    async fn concurrent_upserts_to_different_fields_both_land() {
        let store = setup_store().await;

        let (voice, judge) = tokio::join!(
            store.upsert(
                1,
                SettingsPatch {
                    voice_channel_id: Some(11),
                    ..Default::default()
                },
            ),
            store.upsert(
                1,
                SettingsPatch {
                    judge_channel_id: Some(22),
                    ..Default::default()
                },
            ),
        );
        voice.expect("voice upsert should succeed");
        judge.expect("judge upsert should succeed");

        let settings = store.get(1).await.expect("get should succeed");
        assert_eq!(settings.voice_channel_id, Some(11));
        assert_eq!(settings.judge_channel_id, Some(22));
    }

    #[tokio::test]
    async fn clear_unsets_one_role_and_keeps_the_rest() {
        let store = setup_store().await;

        store
            .upsert(
                1,
                SettingsPatch {
                    translation_channel_id: Some(100),
                    voice_channel_id: Some(200),
                    judge_channel_id: Some(300),
                    dictionary_channel_id: Some(400),
                },
            )
            .await
            .expect("seed upsert should succeed");

        let cleared = store
            .clear(1, ChannelRole::Translation)
            .await
            .expect("clear should succeed");
        assert_eq!(cleared.translation_channel_id, None);

        let settings = store.get(1).await.expect("get should succeed");
        assert_eq!(settings.translation_channel_id, None);
        assert_eq!(settings.voice_channel_id, Some(200));
        assert_eq!(settings.judge_channel_id, Some(300));
        assert_eq!(settings.dictionary_channel_id, Some(400));
    }

    #[tokio::test]
    async fn assign_steals_the_channel_from_its_previous_role() {
        let store = setup_store().await;

        store
            .assign(1, ChannelRole::Translation, 50)
            .await
            .expect("first assign should succeed");
        let settings = store
            .assign(1, ChannelRole::Judge, 50)
            .await
            .expect("second assign should succeed");

        assert_eq!(settings.judge_channel_id, Some(50));
        assert_eq!(
            settings.translation_channel_id, None,
            "previous role on the same channel must be cleared"
        );
        assert_eq!(settings.role_for_channel(50), Some(ChannelRole::Judge));
    }

    #[tokio::test]
    async fn assign_to_a_fresh_channel_keeps_other_roles() {
        let store = setup_store().await;

        store
            .assign(1, ChannelRole::Translation, 50)
            .await
            .expect("assign should succeed");
        let settings = store
            .assign(1, ChannelRole::Dictionary, 60)
            .await
            .expect("assign should succeed");

        assert_eq!(settings.translation_channel_id, Some(50));
        assert_eq!(settings.dictionary_channel_id, Some(60));
    }
}
