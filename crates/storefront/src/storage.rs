//! Persistence slot for the serialized cart.
//!
//! The shape is a browser-style string key/value store: one key holds the
//! whole cart as a JSON string.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tokio::sync::Mutex;

#[async_trait]
pub trait CartStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;

    async fn remove_item(&self, key: &str) -> anyhow::Result<()>;
}

/// In-process storage. Clones share the same map.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        self.items.lock().await.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// SQLite-backed storage (a single `kv` table).
///
/// Cheap to clone; the pool is created on first use.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    location: Location,
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteStorage {
    /// Storage in `{app_data_dir}/shopcart/storage.db`.
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::at(default_db_path()?))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self::with_location(Location::File(path.into()))
    }

    /// Private in-memory database, dropped with the last clone.
    pub fn in_memory() -> Self {
        Self::with_location(Location::Memory)
    }

    fn with_location(location: Location) -> Self {
        Self {
            location,
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Get the pool, initializing the database on first use.
    async fn pool(&self) -> anyhow::Result<SqlitePool> {
        let mut pool_guard = self.pool.lock().await;
        if let Some(pool) = pool_guard.as_ref() {
            return Ok(pool.clone());
        }

        let options = match &self.location {
            Location::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create storage directory at {parent:?}")
                    })?;
                }
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
            }
            Location::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .context("failed to build in-memory SQLite options")?,
        };

        // One long-lived connection: an in-memory database only lives as long
        // as its connection, and a file slot never needs more.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open SQLite storage at {:?}", self.location))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create kv table")?;

        *pool_guard = Some(pool.clone());
        Ok(pool)
    }
}

#[async_trait]
impl CartStorage for SqliteStorage {
    async fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let pool = self.pool().await?;

        let row = sqlx::query(
            r#"
            SELECT value
            FROM kv
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&pool)
        .await
        .with_context(|| format!("failed to read storage key {key:?}"))?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let pool = self.pool().await?;

        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key)
            DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .with_context(|| format!("failed to write storage key {key:?}"))?;

        Ok(())
    }

    async fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        let pool = self.pool().await?;

        sqlx::query(
            r#"
            DELETE FROM kv
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .execute(&pool)
        .await
        .with_context(|| format!("failed to remove storage key {key:?}"))?;

        Ok(())
    }
}

/// Resolve `{app_data_dir}/shopcart/storage.db`.
fn default_db_path() -> anyhow::Result<PathBuf> {
    let mut dir = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    dir.push("shopcart");
    dir.push("storage.db");
    Ok(dir)
}
