use std::{fs, path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use shared::domain::Fact;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};

const FAVORITES_KEY: &str = "favorites";
const BACKGROUND_COLOR_KEY: &str = "background_color";

/// SQLite-backed key-value store for session preferences: the
/// serialized favorites list and the background color. Loaded once at
/// startup and rewritten after every mutation.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        let storage = Self { pool };
        storage.ensure_preferences_table().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn load_favorites(&self) -> Result<Vec<Fact>> {
        match self.read_value(FAVORITES_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).context("stored favorites are not valid JSON"),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_favorites(&self, favorites: &[Fact]) -> Result<()> {
        let raw = serde_json::to_string(favorites).context("failed to serialize favorites")?;
        self.write_value(FAVORITES_KEY, &raw).await
    }

    pub async fn load_background_color(&self) -> Result<Option<String>> {
        self.read_value(BACKGROUND_COLOR_KEY).await
    }

    pub async fn save_background_color(&self, color: &str) -> Result<()> {
        self.write_value(BACKGROUND_COLOR_KEY, color).await
    }

    async fn ensure_preferences_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn read_value(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM preferences WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get::<String, _>("value")))
    }

    async fn write_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE
                SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    let raw = database_url.strip_prefix("sqlite://")?;
    if raw.is_empty() || raw.starts_with(':') {
        return None;
    }
    Some(PathBuf::from(raw))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
