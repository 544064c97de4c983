//! Tests for the TOML configuration format

use libkeyboard_core::{Config, InputAttributes, SettingsValues};
use std::fs;
use std::time::Duration;

#[test]
fn test_config_toml_save_and_load() {
    let mut config = Config::default();
    config.locale = "fr".to_string();
    config.usually_preceded_by_space.push_str(";:!?");
    config.set_delete_accelerate_at(12);

    let toml_path = std::env::temp_dir().join(format!(
        "libkeyboard_core_config_{}.toml",
        std::process::id()
    ));
    config.save_toml(&toml_path).expect("Failed to save TOML config");

    let loaded = Config::load_toml(&toml_path).expect("Failed to load TOML config");
    assert_eq!(loaded.locale, "fr");
    assert_eq!(loaded.usually_preceded_by_space, config.usually_preceded_by_space);
    assert_eq!(loaded.delete_accelerate_at, 12);
    assert_eq!(loaded.abbreviation_marker, '.');

    let _ = fs::remove_file(toml_path);
}

#[test]
fn test_missing_file_is_an_error() {
    let result = Config::load_toml("/nonexistent/libkeyboard_core.toml");
    assert!(result.is_err());
}

#[test]
fn test_incomplete_toml_is_rejected() {
    assert!(Config::from_toml_str("auto_cap = false").is_err());
}

#[test]
fn test_settings_snapshot_from_config() {
    let mut config = Config::default();
    config.long_press_timeout_ms = 350;
    config.word_connectors = "'".to_string();
    let settings = SettingsValues::new(&config, InputAttributes::default());

    assert_eq!(settings.long_press_timeout, Duration::from_millis(350));
    assert!(settings.is_word_connector('\''));
    assert!(!settings.is_word_connector('-'));
    assert!(settings.is_composing_enabled());
}
