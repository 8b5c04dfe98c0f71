//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides. Note that Config::from_env() also loads
//! from .env file via dotenvy, so these tests focus on override behavior.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use home_intake::config::{Config, LogFormat};
use serial_test::serial;
use std::env;

#[test]
#[serial]
fn test_config_defaults() {
    env::remove_var("INTAKE_STORE_PATH");
    env::remove_var("INTAKE_STORE_MAX_CONNECTIONS");
    env::remove_var("LOG_LEVEL");
    env::remove_var("LOG_FORMAT");

    let config = Config::from_env().unwrap();

    assert_eq!(config.store.path.to_str().unwrap(), "./data/intake.db");
    assert_eq!(config.store.max_connections, 5);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
#[serial]
fn test_config_custom_store() {
    env::set_var("INTAKE_STORE_PATH", "/custom/path.db");
    env::set_var("INTAKE_STORE_MAX_CONNECTIONS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(config.store.path.to_str().unwrap(), "/custom/path.db");
    assert_eq!(config.store.max_connections, 10);

    env::remove_var("INTAKE_STORE_PATH");
    env::remove_var("INTAKE_STORE_MAX_CONNECTIONS");
}

#[test]
#[serial]
fn test_config_json_log_format() {
    env::set_var("LOG_FORMAT", "JSON");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    env::remove_var("LOG_FORMAT");
}

#[test]
#[serial]
fn test_config_invalid_max_connections_falls_back() {
    env::set_var("INTAKE_STORE_MAX_CONNECTIONS", "not-a-number");

    let config = Config::from_env().unwrap();
    assert_eq!(config.store.max_connections, 5);

    env::remove_var("INTAKE_STORE_MAX_CONNECTIONS");
}
