//! Configuration loading and root folder priority
//!
//! Uses serial_test: tests touching LRM_ROOT_FOLDER run sequentially.

use lrm_common::config::{
    load_config, resolve_root_folder, StorageBackend, TomlConfig, DEFAULT_PORT, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_empty_file_gives_defaults() {
    let config = TomlConfig::parse("").unwrap();
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.storage, StorageBackend::Json);
    assert_eq!(config.dashboard.due_soon_days, 90);
    assert_eq!(config.dashboard.urgent_window_days, 30);
    assert_eq!(config.dashboard.default_account, "director");
    assert!(!config.auth.require_pin);
    assert_eq!(config.auth.session_ttl_hours, 12);
    assert_eq!(config.logging.level, "info");
    assert_eq!(
        config.dashboard.high_priority_states,
        vec!["TX", "CA", "FL", "NY", "IL", "PA", "OH", "GA", "NC", "MI"]
    );
}

#[test]
fn test_full_file_parses() {
    let config = TomlConfig::parse(
        r#"
        root_folder = "/srv/licensing"
        port = 8080
        storage = "sqlite"
        database_path = "db/lic.db"

        [dashboard]
        due_soon_days = 60
        default_account = "jdoe"
        high_priority_states = ["TX"]

        [auth]
        require_pin = true
        director_pin = "9999"

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.storage, StorageBackend::Sqlite);
    assert_eq!(config.dashboard.due_soon_days, 60);
    // Unset keys in a present table keep their defaults
    assert_eq!(config.dashboard.urgent_window_days, 30);
    assert_eq!(config.dashboard.high_priority_states, vec!["TX".to_string()]);
    assert_eq!(config.auth.director_pin.as_deref(), Some("9999"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.database_path(),
        PathBuf::from("/srv/licensing/db/lic.db")
    );
}

#[test]
fn test_invalid_file_is_config_error() {
    let err = TomlConfig::parse("port = \"not a number\"").unwrap_err();
    assert!(matches!(err, lrm_common::Error::Config(_)));
}

#[test]
fn test_explicit_missing_file_is_error() {
    let dir = TempDir::new().unwrap();
    assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
}

#[test]
fn test_explicit_file_loads_and_validates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[dashboard]\ndue_soon_days = -1\n").unwrap();
    assert!(load_config(Some(&path)).is_err());

    std::fs::write(&path, "port = 6000\n").unwrap();
    assert_eq!(load_config(Some(&path)).unwrap().port, 6000);
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let root = resolve_root_folder(
        Some(Path::new("/from/cli")),
        ROOT_FOLDER_ENV,
        Some(Path::new("/from/toml")),
    );
    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(root, PathBuf::from("/from/cli"));
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let root = resolve_root_folder(None, ROOT_FOLDER_ENV, Some(Path::new("/from/toml")));
    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(root, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let root = resolve_root_folder(None, ROOT_FOLDER_ENV, Some(Path::new("/from/toml")));
    assert_eq!(root, PathBuf::from("/from/toml"));

    let fallback = resolve_root_folder(None, ROOT_FOLDER_ENV, None);
    assert!(fallback.to_string_lossy().contains("lrm"));
}

#[test]
#[serial]
fn test_resolved_config_paths() {
    env::remove_var(ROOT_FOLDER_ENV);
    let config = TomlConfig::default().resolve_root_folder(Some(Path::new("/data")));
    assert_eq!(config.data_dir(), PathBuf::from("/data"));
    assert_eq!(config.database_path(), PathBuf::from("/data/licensing.db"));
}
