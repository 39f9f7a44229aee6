use async_trait::async_trait;
use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::{Storage, SESSION_KEY};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::tree::Forest;

/// Schema for the `session_state` table, embedded at build time.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Forest persisted as one JSON row in SQLite.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if needed) the session database at `config.path`.
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        if let Some(dir) = config.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| StorageError::Connection {
                message: format!("cannot create {}: {}", dir.display(), e),
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true);
        let pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);

        Self::open(options, pool_options).await
    }

    /// Private in-memory database. The pool pins its single connection,
    /// since SQLite drops an in-memory database with its last connection.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("bad in-memory URL: {}", e),
            }
        })?;
        let pool_options = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);

        Self::open(options, pool_options).await
    }

    async fn open(
        options: SqliteConnectOptions,
        pool_options: SqlitePoolOptions,
    ) -> StorageResult<Self> {
        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: e.to_string(),
            })?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StorageError::Migration {
                message: e.to_string(),
            })?;
        info!("Session database ready");

        Ok(Self { pool })
    }

    /// Connection pool, for inspecting the stored row directly.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn load_forest(&self) -> StorageResult<Option<Forest>> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT value
            FROM session_state
            WHERE key = ?
            "#,
        )
        .bind(SESSION_KEY)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((value,)) => Ok(Some(serde_json::from_str(&value)?)),
            None => {
                debug!("No stored forest, starting empty");
                Ok(None)
            }
        }
    }

    async fn save_forest(&self, forest: &Forest) -> StorageResult<()> {
        let value = serde_json::to_string(forest)?;

        sqlx::query(
            r#"
            INSERT INTO session_state (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(SESSION_KEY)
        .bind(&value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
