use super::builder::{find_config_line, preserve_comment_formatting, update_config_content};
use super::loading::parse_config;
use super::validation::validate_config;
use super::*;
use crate::common::constants::*;
use crate::settings::SettingValue;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn create_test_config(begin: u32, end: u32, period: u32) -> Config {
    Config {
        nighttime_begin: Some(begin),
        nighttime_end: Some(end),
        time_check_period: Some(period),
        ..Config::with_defaults()
    }
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nightfall").join("nightfall.toml");

    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = Config::load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    let config = result.unwrap();
    assert!(config_path.exists());
    assert_eq!(config, Config::with_defaults());
}

#[test]
fn test_default_config_file_round_trips() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nightfall.toml");
    create_default_config(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("#[Themes]"));
    for key in KEYS {
        assert!(find_config_line(&content, key).is_some(), "missing {key}");
    }

    let loaded = load_from_path(&path).unwrap();
    assert_eq!(loaded, Config::with_defaults());
}

#[test]
fn test_default_config_comments_are_aligned() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nightfall.toml");
    create_default_config(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let columns: Vec<usize> = content
        .lines()
        .filter(|line| !line.starts_with('#') && !line.is_empty())
        .map(|line| line.find(" # ").unwrap())
        .collect();
    assert!(columns.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_missing_keys_fall_back_to_defaults() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nightfall.toml");
    fs::write(&path, "night-theme = \"Yaru-dark\"\n").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.night_theme.as_deref(), Some("Yaru-dark"));
    assert_eq!(config.day_theme.as_deref(), Some(DEFAULT_DAY_THEME));
    assert_eq!(config.nighttime_begin, Some(DEFAULT_NIGHTTIME_BEGIN));
    assert_eq!(config.first_time_user, Some(DEFAULT_FIRST_TIME_USER));
}

#[test]
fn test_load_rejects_missing_file() {
    let temp_dir = tempdir().unwrap();
    assert!(load_from_path(&temp_dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_load_rejects_wrong_type() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nightfall.toml");
    fs::write(&path, "nighttime-begin = \"late\"\n").unwrap();
    assert!(load_from_path(&path).is_err());
}

#[test]
fn test_unknown_keys_are_ignored() {
    let config = parse_config("backend = \"auto\"\nday-theme = \"Yaru\"\n").unwrap();
    assert_eq!(config.day_theme.as_deref(), Some("Yaru"));
}

#[test]
fn test_config_validation_basic() {
    assert!(validate_config(&create_test_config(1320, 360, 1000)).is_ok());
    assert!(validate_config(&create_test_config(0, 0, MINIMUM_TIME_CHECK_PERIOD)).is_ok());
    assert!(
        validate_config(&create_test_config(
            MAXIMUM_MINUTE_OF_DAY,
            MAXIMUM_MINUTE_OF_DAY,
            MAXIMUM_TIME_CHECK_PERIOD
        ))
        .is_ok()
    );
}

#[test]
fn test_config_validation_minutes_out_of_range() {
    let err = validate_config(&create_test_config(1440, 360, 1000)).unwrap_err();
    assert!(err.to_string().contains("nighttime-begin"));

    let err = validate_config(&create_test_config(1320, 1440, 1000)).unwrap_err();
    assert!(err.to_string().contains("nighttime-end"));
}

#[test]
fn test_config_validation_period_limits() {
    assert!(validate_config(&create_test_config(1320, 360, MINIMUM_TIME_CHECK_PERIOD - 1)).is_err());
    assert!(validate_config(&create_test_config(1320, 360, MAXIMUM_TIME_CHECK_PERIOD + 1)).is_err());
}

#[test]
fn test_config_validation_empty_gtk_theme() {
    let config = Config {
        day_theme: Some("  ".to_string()),
        ..Config::with_defaults()
    };
    assert!(validate_config(&config).is_err());

    // Empty shell slots mean "not configured yet"
    let config = Config {
        day_shell: Some(String::new()),
        ..Config::with_defaults()
    };
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_value_and_set_value() {
    let mut config = Config::with_defaults();
    assert_eq!(
        config.value(KEY_NIGHTTIME_END).unwrap(),
        SettingValue::Uint(DEFAULT_NIGHTTIME_END)
    );

    config
        .set_value(KEY_DAY_SHELL, SettingValue::String("Nordic".into()))
        .unwrap();
    assert_eq!(config.day_shell.as_deref(), Some("Nordic"));

    let err = config
        .set_value(KEY_SHELL_ENABLED, SettingValue::Uint(1))
        .unwrap_err();
    assert!(err.to_string().contains("boolean"));

    assert!(config.value("latitude").is_err());
}

#[test]
fn test_changed_keys() {
    let old = Config::with_defaults();
    let mut new = old.clone();
    new.night_theme = Some("Yaru-dark".to_string());
    new.time_check_period = Some(500);

    assert_eq!(
        old.changed_keys(&new),
        vec![KEY_NIGHT_THEME, KEY_TIME_CHECK_PERIOD]
    );
    assert!(old.changed_keys(&old).is_empty());
}

#[test]
fn test_changed_keys_treats_missing_as_default() {
    let sparse = Config::default();
    assert!(sparse.changed_keys(&Config::with_defaults()).is_empty());
}

#[test]
fn test_parse_value() {
    assert_eq!(
        Config::parse_value(KEY_DAY_THEME, "Yaru").unwrap(),
        SettingValue::String("Yaru".into())
    );
    assert_eq!(
        Config::parse_value(KEY_DAY_COMMAND, "\"notify-send \\\"day\\\"\"").unwrap(),
        SettingValue::String("notify-send \"day\"".into())
    );
    assert_eq!(
        Config::parse_value(KEY_NIGHTTIME_BEGIN, "1320").unwrap(),
        SettingValue::Uint(1320)
    );
    assert_eq!(
        Config::parse_value(KEY_COMMANDS_ENABLED, "on").unwrap(),
        SettingValue::Boolean(true)
    );
    assert!(Config::parse_value(KEY_NIGHTTIME_BEGIN, "-5").is_err());
    assert!(Config::parse_value(KEY_SHELL_ENABLED, "maybe").is_err());
    assert!(Config::parse_value("sunset", "19:00").is_err());
}

#[test]
fn test_find_config_line_matches_whole_key() {
    let content = "#[Nighttime]\n# nighttime-begin = 0\nnighttime-begin-extra = 1\nnighttime-begin = 1200 # begin\n";
    assert_eq!(
        find_config_line(content, "nighttime-begin").as_deref(),
        Some("nighttime-begin = 1200 # begin")
    );
    assert!(find_config_line(content, "nighttime-end").is_none());
}

#[test]
fn test_preserve_comment_formatting() {
    let line = "day-theme = \"Adwaita\"      # GTK theme used during the day";
    assert_eq!(
        preserve_comment_formatting(line, "day-theme", "\"Yaru\""),
        "day-theme = \"Yaru\"      # GTK theme used during the day"
    );

    assert_eq!(
        preserve_comment_formatting("shell-enabled = false", "shell-enabled", "true"),
        "shell-enabled = true"
    );
}

#[test]
fn test_preserve_comment_formatting_ignores_hash_in_strings() {
    let line = "day-command = \"echo '#1'\" # run at day";
    assert_eq!(
        preserve_comment_formatting(line, "day-command", "\"true\""),
        "day-command = \"true\" # run at day"
    );
}

#[test]
fn test_update_config_content_appends_missing_key() {
    let content = "day-theme = \"Adwaita\"";
    let updated = update_config_content(content, "night-theme", "\"Adwaita-dark\"");
    assert_eq!(
        updated,
        "day-theme = \"Adwaita\"\nnight-theme = \"Adwaita-dark\"\n"
    );
}

#[test]
fn test_write_config_value_preserves_other_lines() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nightfall.toml");
    create_default_config(&path).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    let changed =
        write_config_value(&path, KEY_NIGHT_THEME, &SettingValue::String("Yaru-dark".into()))
            .unwrap();
    assert!(changed);

    let after = fs::read_to_string(&path).unwrap();
    assert_eq!(before.lines().count(), after.lines().count());
    let differing: Vec<_> = before
        .lines()
        .zip(after.lines())
        .filter(|(a, b)| a != b)
        .collect();
    assert_eq!(differing.len(), 1);
    assert!(differing[0].1.starts_with("night-theme = \"Yaru-dark\""));

    let unchanged =
        write_config_value(&path, KEY_NIGHT_THEME, &SettingValue::String("Yaru-dark".into()))
            .unwrap();
    assert!(!unchanged);
    assert_eq!(load_from_path(&path).unwrap().night_theme.as_deref(), Some("Yaru-dark"));
}
