//! Locating and reading `nightfall.toml`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::common::constants::*;
use crate::common::utils::private_path;

/// `--config` override, fixed for the whole process once set.
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("The configuration directory can only be chosen once"))
}

pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().cloned().flatten()
}

/// `<dir>/nightfall.toml`, where `<dir>` is the `--config` override or
/// `$XDG_CONFIG_HOME/nightfall`.
pub fn get_config_path() -> Result<PathBuf> {
    let dir = match get_custom_config_dir() {
        Some(dir) => dir,
        None => dirs::config_dir()
            .context("No XDG config directory for this user")?
            .join(APP_NAME),
    };
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Read the settings file, writing the defaults first on a fresh install.
pub fn load() -> Result<Config> {
    let path = get_config_path()?;
    if !path.exists() {
        super::builder::create_default_config(&path)
            .context("Could not write the default settings file")?;
    }
    load_from_path(&path)
}

/// Read, validate and complete the settings file at `path`.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let shown = private_path(path);
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            anyhow::bail!("No settings file at {shown}")
        }
        Err(e) => return Err(e).with_context(|| format!("Cannot read {shown}")),
    };

    let mut config = parse_config(&content).with_context(|| format!("Invalid settings in {shown}"))?;
    validate_config(&config).with_context(|| format!("Rejected settings in {shown}"))?;
    apply_defaults(&mut config);
    Ok(config)
}

/// Parse TOML content into a `Config` without validating it.
pub fn parse_config(content: &str) -> Result<Config> {
    let table: toml::Table = content.parse().context("Invalid TOML syntax")?;

    for key in table.keys() {
        if !super::KEYS.contains(&key.as_str()) {
            log_warning!("Ignoring unknown configuration key '{}'", key);
        }
    }

    let config: Config = toml::from_str(content)?;
    Ok(config)
}

/// Fill every key the file left out.
pub(crate) fn apply_defaults(config: &mut Config) {
    fn fill<T: Clone>(slot: &mut Option<T>, default: T) {
        if slot.is_none() {
            *slot = Some(default);
        }
    }

    fill(&mut config.day_theme, DEFAULT_DAY_THEME.to_string());
    fill(&mut config.night_theme, DEFAULT_NIGHT_THEME.to_string());
    fill(&mut config.day_shell, DEFAULT_DAY_SHELL.to_string());
    fill(&mut config.night_shell, DEFAULT_NIGHT_SHELL.to_string());
    fill(&mut config.day_command, DEFAULT_DAY_COMMAND.to_string());
    fill(&mut config.night_command, DEFAULT_NIGHT_COMMAND.to_string());
    fill(&mut config.nighttime_begin, DEFAULT_NIGHTTIME_BEGIN);
    fill(&mut config.nighttime_end, DEFAULT_NIGHTTIME_END);
    fill(&mut config.time_check_period, DEFAULT_TIME_CHECK_PERIOD);
    fill(&mut config.shell_enabled, DEFAULT_SHELL_ENABLED);
    fill(&mut config.commands_enabled, DEFAULT_COMMANDS_ENABLED);
    fill(
        &mut config.nighttime_from_night_light,
        DEFAULT_NIGHTTIME_FROM_NIGHT_LIGHT,
    );
    fill(&mut config.first_time_user, DEFAULT_FIRST_TIME_USER);
}
