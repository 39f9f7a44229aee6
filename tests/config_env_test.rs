//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use session_weaver::config::{Config, LogFormat, StorageBackend};
use serial_test::serial;
use std::env;
use std::time::Duration;

#[test]
#[serial]
fn test_config_defaults() {
    env::remove_var("STORAGE_BACKEND");
    env::remove_var("DATABASE_PATH");
    env::remove_var("TITLE_DELAY_MS");

    let config = Config::from_env().unwrap();
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert_eq!(
        config.storage.database.path.to_str().unwrap(),
        "./data/session.db"
    );
    assert_eq!(config.session.title_delay(), Duration::from_millis(150));
}

#[test]
#[serial]
fn test_config_from_env_memory_backend() {
    env::set_var("STORAGE_BACKEND", "Memory");

    let config = Config::from_env().unwrap();
    assert_eq!(config.storage.backend, StorageBackend::Memory);

    env::remove_var("STORAGE_BACKEND");
}

#[test]
#[serial]
fn test_config_unknown_backend_is_error() {
    env::set_var("STORAGE_BACKEND", "postgres");

    let result = Config::from_env();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("postgres"));

    env::remove_var("STORAGE_BACKEND");
}

#[test]
#[serial]
fn test_config_from_env_custom_database() {
    env::set_var("DATABASE_PATH", "/custom/session.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(
        config.storage.database.path.to_str().unwrap(),
        "/custom/session.db"
    );
    assert_eq!(config.storage.database.max_connections, 10);

    env::remove_var("DATABASE_PATH");
    env::remove_var("DATABASE_MAX_CONNECTIONS");
}

#[test]
#[serial]
fn test_config_from_env_title_delay() {
    env::set_var("TITLE_DELAY_MS", "400");

    let config = Config::from_env().unwrap();
    assert_eq!(config.session.title_delay_ms, 400);

    env::remove_var("TITLE_DELAY_MS");
}

#[test]
#[serial]
fn test_config_invalid_number_uses_default() {
    env::set_var("DATABASE_MAX_CONNECTIONS", "not-a-number");
    env::set_var("TITLE_DELAY_MS", "-3");

    let config = Config::from_env().unwrap();
    assert_eq!(config.storage.database.max_connections, 5);
    assert_eq!(config.session.title_delay_ms, 150);

    env::remove_var("DATABASE_MAX_CONNECTIONS");
    env::remove_var("TITLE_DELAY_MS");
}

#[test]
#[serial]
fn test_config_from_env_json_log_format() {
    env::set_var("LOG_FORMAT", "json");
    env::set_var("LOG_LEVEL", "debug");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.logging.level, "debug");

    env::remove_var("LOG_FORMAT");
    env::remove_var("LOG_LEVEL");
}
