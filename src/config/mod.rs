//! Configuration system for nightfall.
//!
//! nightfall keeps its own settings in a TOML file, by default
//! `$XDG_CONFIG_HOME/nightfall/nightfall.toml`. The file is created with
//! commented defaults on first run and watched for changes while the daemon
//! runs, so edits made by hand, by `nightfall set`, or by the daemon itself
//! (theme sync-back, first-run setup) all flow through the same reload path.
//!
//! ```toml
//! #[Themes]
//! day-theme = "Adwaita"           # GTK theme used during the day
//! night-theme = "Adwaita-dark"    # GTK theme used during the night
//! shell-enabled = false           # Also switch the GNOME Shell theme (needs User Themes)
//! day-shell = ""                  # Shell theme used during the day
//! night-shell = ""                # Shell theme used during the night
//!
//! #[Commands]
//! commands-enabled = false        # Run commands when day or night begins
//! day-command = ""                # Command run when day begins (/bin/sh -c)
//! night-command = ""              # Command run when night begins (/bin/sh -c)
//!
//! #[Nighttime]
//! nighttime-from-night-light = false # Follow the GNOME Night Light schedule
//! nighttime-begin = 1200          # Minute of the day when night begins (0-1439)
//! nighttime-end = 420             # Minute of the day when night ends (0-1439)
//! time-check-period = 1000        # How often the time is checked (10-1800000) ms
//!
//! #[Internal]
//! first-time-user = true          # Cleared after the first start
//! ```
//!
//! Keys are identical to the settings keys the daemon subscribes to, so a
//! [`Config`] doubles as the backing storage of the extension settings store
//! (`settings::FileStore`).

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::common::constants::*;
use crate::common::utils::format_minutes;
use crate::settings::SettingValue;

pub use builder::{create_default_config, write_config_value};
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_config_watcher;

/// Every key stored in `nightfall.toml`, in file order.
pub const KEYS: [&str; 13] = [
    KEY_DAY_THEME,
    KEY_NIGHT_THEME,
    KEY_SHELL_ENABLED,
    KEY_DAY_SHELL,
    KEY_NIGHT_SHELL,
    KEY_COMMANDS_ENABLED,
    KEY_DAY_COMMAND,
    KEY_NIGHT_COMMAND,
    KEY_NIGHTTIME_FROM_NIGHT_LIGHT,
    KEY_NIGHTTIME_BEGIN,
    KEY_NIGHTTIME_END,
    KEY_TIME_CHECK_PERIOD,
    KEY_FIRST_TIME_USER,
];

/// The value type stored under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    String,
    Uint,
    Boolean,
}

/// Look up the value type of `key`, failing for unknown keys.
pub fn key_kind(key: &str) -> Result<KeyKind> {
    Ok(match key {
        KEY_DAY_THEME | KEY_NIGHT_THEME | KEY_DAY_SHELL | KEY_NIGHT_SHELL | KEY_DAY_COMMAND
        | KEY_NIGHT_COMMAND => KeyKind::String,
        KEY_NIGHTTIME_BEGIN | KEY_NIGHTTIME_END | KEY_TIME_CHECK_PERIOD => KeyKind::Uint,
        KEY_SHELL_ENABLED
        | KEY_COMMANDS_ENABLED
        | KEY_NIGHTTIME_FROM_NIGHT_LIGHT
        | KEY_FIRST_TIME_USER => KeyKind::Boolean,
        _ => bail!("Unknown configuration key: '{}'", key),
    })
}

/// Configuration structure for nightfall settings.
///
/// Fields are optional in the file; [`loading::load_from_path`] fills the
/// gaps with the defaults from `common::constants`, so a loaded `Config`
/// always holds a value for every key.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub day_theme: Option<String>,
    pub night_theme: Option<String>,
    pub day_shell: Option<String>,
    pub night_shell: Option<String>,
    pub day_command: Option<String>,
    pub night_command: Option<String>,
    pub nighttime_begin: Option<u32>, // minute of the day
    pub nighttime_end: Option<u32>,   // minute of the day
    pub time_check_period: Option<u32>, // milliseconds
    pub shell_enabled: Option<bool>,
    pub commands_enabled: Option<bool>,
    pub nighttime_from_night_light: Option<bool>,
    pub first_time_user: Option<bool>,
}

impl Config {
    /// A configuration holding the default value for every key.
    pub fn with_defaults() -> Self {
        let mut config = Self::default();
        loading::apply_defaults(&mut config);
        config
    }

    /// Read the value of `key`, falling back to its default.
    pub fn value(&self, key: &str) -> Result<SettingValue> {
        let string = |v: &Option<String>, default: &str| {
            SettingValue::String(v.clone().unwrap_or_else(|| default.to_string()))
        };

        Ok(match key {
            KEY_DAY_THEME => string(&self.day_theme, DEFAULT_DAY_THEME),
            KEY_NIGHT_THEME => string(&self.night_theme, DEFAULT_NIGHT_THEME),
            KEY_DAY_SHELL => string(&self.day_shell, DEFAULT_DAY_SHELL),
            KEY_NIGHT_SHELL => string(&self.night_shell, DEFAULT_NIGHT_SHELL),
            KEY_DAY_COMMAND => string(&self.day_command, DEFAULT_DAY_COMMAND),
            KEY_NIGHT_COMMAND => string(&self.night_command, DEFAULT_NIGHT_COMMAND),
            KEY_NIGHTTIME_BEGIN => {
                SettingValue::Uint(self.nighttime_begin.unwrap_or(DEFAULT_NIGHTTIME_BEGIN))
            }
            KEY_NIGHTTIME_END => {
                SettingValue::Uint(self.nighttime_end.unwrap_or(DEFAULT_NIGHTTIME_END))
            }
            KEY_TIME_CHECK_PERIOD => {
                SettingValue::Uint(self.time_check_period.unwrap_or(DEFAULT_TIME_CHECK_PERIOD))
            }
            KEY_SHELL_ENABLED => {
                SettingValue::Boolean(self.shell_enabled.unwrap_or(DEFAULT_SHELL_ENABLED))
            }
            KEY_COMMANDS_ENABLED => {
                SettingValue::Boolean(self.commands_enabled.unwrap_or(DEFAULT_COMMANDS_ENABLED))
            }
            KEY_NIGHTTIME_FROM_NIGHT_LIGHT => SettingValue::Boolean(
                self.nighttime_from_night_light
                    .unwrap_or(DEFAULT_NIGHTTIME_FROM_NIGHT_LIGHT),
            ),
            KEY_FIRST_TIME_USER => {
                SettingValue::Boolean(self.first_time_user.unwrap_or(DEFAULT_FIRST_TIME_USER))
            }
            _ => bail!("Unknown configuration key: '{}'", key),
        })
    }

    /// Store `value` under `key`. The value type must match the key.
    ///
    /// Range checks are left to `validation::validate_config`.
    pub fn set_value(&mut self, key: &str, value: SettingValue) -> Result<()> {
        match (key_kind(key)?, value) {
            (KeyKind::String, SettingValue::String(s)) => {
                let slot = match key {
                    KEY_DAY_THEME => &mut self.day_theme,
                    KEY_NIGHT_THEME => &mut self.night_theme,
                    KEY_DAY_SHELL => &mut self.day_shell,
                    KEY_NIGHT_SHELL => &mut self.night_shell,
                    KEY_DAY_COMMAND => &mut self.day_command,
                    _ => &mut self.night_command,
                };
                *slot = Some(s);
            }
            (KeyKind::Uint, SettingValue::Uint(n)) => {
                let slot = match key {
                    KEY_NIGHTTIME_BEGIN => &mut self.nighttime_begin,
                    KEY_NIGHTTIME_END => &mut self.nighttime_end,
                    _ => &mut self.time_check_period,
                };
                *slot = Some(n);
            }
            (KeyKind::Boolean, SettingValue::Boolean(b)) => {
                let slot = match key {
                    KEY_SHELL_ENABLED => &mut self.shell_enabled,
                    KEY_COMMANDS_ENABLED => &mut self.commands_enabled,
                    KEY_NIGHTTIME_FROM_NIGHT_LIGHT => &mut self.nighttime_from_night_light,
                    _ => &mut self.first_time_user,
                };
                *slot = Some(b);
            }
            (kind, value) => bail!(
                "'{}' expects a {} value, got {}",
                key,
                kind_name(kind),
                value.type_name()
            ),
        }
        Ok(())
    }

    /// Keys whose effective value differs between `self` and `other`.
    pub fn changed_keys(&self, other: &Config) -> Vec<&'static str> {
        KEYS.iter()
            .copied()
            .filter(|key| self.value(key).ok() != other.value(key).ok())
            .collect()
    }

    /// Parse a value given on the command line for `key`.
    ///
    /// Strings may be given with or without quotes, booleans also accept
    /// `yes`/`no`, `on`/`off` and `1`/`0`.
    pub fn parse_value(key: &str, raw: &str) -> Result<SettingValue> {
        let raw = raw.trim();
        match key_kind(key)? {
            KeyKind::String => {
                let quoted = (raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2)
                    || (raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2);
                if quoted {
                    let parsed: toml::Table = format!("v = {raw}")
                        .parse()
                        .with_context(|| format!("Invalid string for '{}'", key))?;
                    let value = parsed
                        .get("v")
                        .and_then(|v| v.as_str())
                        .context("Failed to extract string value")?;
                    Ok(SettingValue::String(value.to_string()))
                } else {
                    Ok(SettingValue::String(raw.to_string()))
                }
            }
            KeyKind::Uint => {
                let n = raw.parse::<u32>().with_context(|| {
                    format!("'{}' expects a non-negative integer, got '{}'", key, raw)
                })?;
                Ok(SettingValue::Uint(n))
            }
            KeyKind::Boolean => match raw.to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(SettingValue::Boolean(true)),
                "false" | "no" | "off" | "0" => Ok(SettingValue::Boolean(false)),
                _ => bail!("'{}' expects true or false, got '{}'", key, raw),
            },
        }
    }

    /// Load configuration using the module's load function
    pub fn load() -> Result<Self> {
        load()
    }

    /// Load from path using the module's load_from_path function
    pub fn load_from_path(path: &Path) -> Result<Self> {
        load_from_path(path)
    }

    /// Get configuration path using the module's get_config_path function
    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");

        let day = self.day_theme.as_deref().unwrap_or(DEFAULT_DAY_THEME);
        let night = self.night_theme.as_deref().unwrap_or(DEFAULT_NIGHT_THEME);
        log_indented!("GTK theme: {} / {}", day, night);

        if self.shell_enabled.unwrap_or(DEFAULT_SHELL_ENABLED) {
            let day = self.day_shell.as_deref().unwrap_or(DEFAULT_DAY_SHELL);
            let night = self.night_shell.as_deref().unwrap_or(DEFAULT_NIGHT_SHELL);
            log_indented!("Shell theme: {} / {}", display_theme(day), display_theme(night));
        } else {
            log_indented!("Shell theme: disabled");
        }

        if self.commands_enabled.unwrap_or(DEFAULT_COMMANDS_ENABLED) {
            let day = self.day_command.as_deref().unwrap_or(DEFAULT_DAY_COMMAND);
            let night = self.night_command.as_deref().unwrap_or(DEFAULT_NIGHT_COMMAND);
            log_indented!("Day command: {}", display_command(day));
            log_indented!("Night command: {}", display_command(night));
        } else {
            log_indented!("Commands: disabled");
        }

        if self
            .nighttime_from_night_light
            .unwrap_or(DEFAULT_NIGHTTIME_FROM_NIGHT_LIGHT)
        {
            log_indented!("Nighttime: Night Light schedule");
        } else {
            log_indented!(
                "Nighttime: {} - {}",
                format_minutes(self.nighttime_begin.unwrap_or(DEFAULT_NIGHTTIME_BEGIN)),
                format_minutes(self.nighttime_end.unwrap_or(DEFAULT_NIGHTTIME_END))
            );
        }

        log_indented!(
            "Time check period: {}ms",
            self.time_check_period.unwrap_or(DEFAULT_TIME_CHECK_PERIOD)
        );
    }
}

fn kind_name(kind: KeyKind) -> &'static str {
    match kind {
        KeyKind::String => "string",
        KeyKind::Uint => "uint",
        KeyKind::Boolean => "boolean",
    }
}

fn display_theme(name: &str) -> &str {
    if name.is_empty() { "(unset)" } else { name }
}

fn display_command(command: &str) -> &str {
    if command.trim().is_empty() {
        "(none)"
    } else {
        command.trim()
    }
}

#[cfg(test)]
mod tests;
