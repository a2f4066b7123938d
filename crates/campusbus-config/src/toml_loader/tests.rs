//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_campusbus_config.toml"));
    assert!(matches!(
        result.unwrap_err(),
        campusbus_common::ConfigError::FileNotFound(_)
    ));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[broadcast]
host = "ws.bus.example.edu"
app_key = "k"
secure = true

[reconnect]
enabled = true
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.broadcast.host, "ws.bus.example.edu");
    assert_eq!(config.broadcast.app_key, "k");
    assert!(config.broadcast.secure);
    assert!(config.reconnect.enabled);
    // Defaults preserved
    assert_eq!(config.broadcast.port, 6001);
    assert_eq!(config.broadcast.heartbeat_interval_secs, 25);
    assert_eq!(config.api.broadcast_auth_path, "/broadcasting/auth");
    assert_eq!(config.reconnect.max_delay_ms, 30_000);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, campusbus_common::ConfigError::ParseError(_)));
}

#[test]
fn log_level_parses_uppercase() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[logging]\nlevel = \"DEBUG\"\n").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.logging.level, crate::schema::LogLevel::Debug);
    assert_eq!(config.logging.level.as_filter(), "debug");
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("campusbus").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.broadcast.channel, "private-LocationChannel");
    assert_eq!(config.broadcast.event, "NewLocationReceived");
}

#[test]
fn default_config_toml_is_valid() {
    use super::template::default_config_toml;
    use crate::schema::CampusBusConfig;

    let config: CampusBusConfig = toml::from_str(&default_config_toml()).unwrap();
    assert_eq!(config.broadcast.port, 6001);
    assert!(!config.reconnect.enabled);
}

#[test]
fn default_config_path_is_reasonable() {
    if let Ok(path) = default_config_path() {
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("campusbus"));
        assert!(path_str.ends_with("config.toml"));
    }
}

#[test]
fn unreadable_path_is_a_parse_error_not_missing() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_from_path(dir.path());
    assert!(matches!(
        result.unwrap_err(),
        campusbus_common::ConfigError::ParseError(_)
    ));
}
