// Integration test for configuration and settings file support

use dblog_file::config::DblogConfig;
use dblog_file::error::DblogError;
use dblog_file::logs::LogLevel;
use dblog_file::settings::{FileSettingsStore, SettingsStore, SinkSettings};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dblog.toml");

    let toml_content = r#"
        public_files = "/var/www/html/sites/default/files"
        settings_file = "/etc/dblog-file/settings.toml"
        bind = "0.0.0.0:8088"
    "#;

    fs::write(&config_path, toml_content).unwrap();

    let config = DblogConfig::from_file(&config_path).unwrap();
    assert_eq!(
        config.log_path(),
        PathBuf::from("/var/www/html/sites/default/files/dblog-file.log")
    );
    assert_eq!(config.settings_file, PathBuf::from("/etc/dblog-file/settings.toml"));
    assert_eq!(config.bind_addr().unwrap().port(), 8088);
}

#[test]
fn test_load_json_config_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dblog.json");

    fs::write(&config_path, r#"{ "public_files": "files" }"#).unwrap();

    let config = DblogConfig::from_file(&config_path).unwrap();
    assert_eq!(config.log_path(), PathBuf::from("files/dblog-file.log"));
    assert_eq!(config.settings_file, PathBuf::from("dblog_file.settings.toml"));
    assert_eq!(config.bind, "127.0.0.1:8080");
}

#[test]
fn test_config_env_expansion() {
    std::env::set_var("DBLOG_IT_SITE", "/srv/site");

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dblog.toml");
    fs::write(&config_path, "public_files = \"${DBLOG_IT_SITE}/files\"\n").unwrap();

    let config = DblogConfig::from_file(&config_path).unwrap();
    assert_eq!(config.public_files, PathBuf::from("/srv/site/files"));
}

#[test]
fn test_invalid_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dblog.toml");
    fs::write(&config_path, "public_files = [unclosed").unwrap();

    let result = DblogConfig::from_file(&config_path);
    assert!(matches!(result, Err(DblogError::InvalidConfig(_))));
}

#[test]
fn test_missing_config_file() {
    let result = DblogConfig::from_file(&PathBuf::from("/nonexistent/dblog.toml"));
    assert!(matches!(result, Err(DblogError::ConfigError(_))));
}

#[test]
fn test_settings_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSettingsStore::new(temp_dir.path().join("dblog_file.settings.toml"));

    let mut settings = SinkSettings {
        enabled: true,
        count: 5000,
        types: Vec::new(),
    };
    settings.set_types([LogLevel::Warning, LogLevel::Emergency, LogLevel::Error]);
    store.save(&settings).unwrap();

    let written = fs::read_to_string(store.path()).unwrap();
    assert!(written.contains("enabled = true"));
    assert!(written.contains("count = 5000"));
    assert!(written.contains("\"emergency\""));

    let loaded = store.load().unwrap();
    assert_eq!(
        loaded.types,
        vec![LogLevel::Emergency, LogLevel::Error, LogLevel::Warning]
    );
}

#[test]
fn test_settings_file_partial_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.toml");
    fs::write(&path, "enabled = true\n").unwrap();

    let settings = FileSettingsStore::new(&path).load().unwrap();
    assert!(settings.enabled);
    assert_eq!(settings.count, 1000);
    assert!(settings.types.is_empty());
    assert!(!settings.accepts(LogLevel::Error));
}

#[test]
fn test_settings_out_of_range_count_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSettingsStore::new(temp_dir.path().join("settings.toml"));

    let settings = SinkSettings {
        enabled: true,
        count: 25_001,
        types: vec![LogLevel::Error],
    };

    assert!(matches!(
        store.save(&settings),
        Err(DblogError::ConfigValidationError(_))
    ));
    assert!(!store.path().exists());
}
