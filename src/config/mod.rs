use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Where and how the forest is persisted.
    pub storage: StorageConfig,
    /// Log filter and output format.
    pub logging: LoggingConfig,
    /// Navigation handling.
    pub session: SessionConfig,
}

/// Which storage backend persists the forest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// SQLite database file (default).
    Sqlite,
    /// Process memory; lost on exit.
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Selected backend.
    pub backend: StorageBackend,
    /// SQLite settings, used when `backend` is SQLite.
    pub database: DatabaseConfig,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file; parent directories are created on open.
    pub path: PathBuf,
    /// Connection pool size.
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Session coordinator configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a committed navigation waits before the tab title is read.
    pub title_delay_ms: u64,
}

impl SessionConfig {
    /// The title-resolution delay as a [`Duration`].
    pub fn title_delay(&self) -> Duration {
        Duration::from_millis(self.title_delay_ms)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "sqlite".to_string())
            .to_lowercase()
            .as_str()
        {
            "sqlite" => StorageBackend::Sqlite,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(AppError::Config {
                    message: format!("Unknown STORAGE_BACKEND: {}", other),
                })
            }
        };

        let storage = StorageConfig {
            backend,
            database: DatabaseConfig {
                path: PathBuf::from(
                    env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/session.db".to_string()),
                ),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            },
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let session = SessionConfig {
            title_delay_ms: env::var("TITLE_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(150),
        };

        Ok(Config {
            storage,
            logging,
            session,
        })
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/session.db"),
            max_connections: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { title_delay_ms: 150 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Sqlite,
                database: DatabaseConfig::default(),
            },
            logging: LoggingConfig::default(),
            session: SessionConfig::default(),
        }
    }
}
