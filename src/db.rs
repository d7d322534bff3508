//! SQLite connection and schema management.

use crate::error::{Result, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row as _, SqlitePool};
use std::path::Path;

/// Open (creating if necessary) the settings database and bring its schema
/// up to date.
pub async fn connect(path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(StoreError::Connect)?;

    init_schema(&pool).await?;

    tracing::info!(path = %path.display(), "settings database ready");
    Ok(pool)
}

/// Create the base table and apply additive column migrations.
///
/// New role columns are added with `ALTER TABLE` so existing rows keep
/// working and read the new column as unset.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guild_settings (
            guild_id INTEGER PRIMARY KEY,
            translation_channel_id INTEGER NULL,
            voice_channel_id INTEGER NULL,
            judge_channel_id INTEGER NULL,
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(StoreError::Migration)?;

    ensure_column(pool, "guild_settings", "dictionary_channel_id", "INTEGER NULL").await?;

    Ok(())
}

/// Add a column if the table doesn't have it yet.
async fn ensure_column(pool: &SqlitePool, table: &str, column: &str, ddl: &str) -> Result<()> {
    let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
        .fetch_all(pool)
        .await
        .map_err(StoreError::Migration)?;

    let exists = rows.iter().any(|row| {
        row.try_get::<String, _>("name")
            .map(|name| name == column)
            .unwrap_or(false)
    });

    if !exists {
        sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {ddl}"))
            .execute(pool)
            .await
            .map_err(StoreError::Migration)?;
        tracing::info!(table, column, "added settings column");
    }

    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    // A single connection: each pooled connection to `sqlite::memory:` would
    // otherwise get its own private database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should connect");
    init_schema(&pool).await.expect("schema should initialize");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_migration_is_additive_and_idempotent() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite should connect");

        // Simulate a database created before the dictionary column existed.
        sqlx::query(
            "CREATE TABLE guild_settings (
                guild_id INTEGER PRIMARY KEY,
                translation_channel_id INTEGER NULL,
                voice_channel_id INTEGER NULL,
                judge_channel_id INTEGER NULL,
                updated_at TEXT DEFAULT (datetime('now'))
            )",
        )
        .execute(&pool)
        .await
        .expect("legacy schema should be created");

        sqlx::query("INSERT INTO guild_settings (guild_id, judge_channel_id) VALUES (1, 42)")
            .execute(&pool)
            .await
            .expect("legacy row should insert");

        init_schema(&pool).await.expect("migration should apply");
        init_schema(&pool).await.expect("migration should be idempotent");

        let row =
            sqlx::query("SELECT judge_channel_id, dictionary_channel_id FROM guild_settings")
                .fetch_one(&pool)
                .await
                .expect("row should survive migration");

        let judge: Option<i64> = row.try_get("judge_channel_id").expect("column readable");
        let dictionary: Option<i64> = row
            .try_get("dictionary_channel_id")
            .expect("new column readable");
        assert_eq!(judge, Some(42));
        assert_eq!(dictionary, None);
    }
}
