//! Configuration file building and in-place updates.
//!
//! Handles creating the commented default configuration file and rewriting
//! single values in an existing file without disturbing the user's comments
//! and alignment.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::settings::SettingValue;

/// Create the default config file at `path`.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let string = |s: &str| SettingValue::String(s.to_string()).to_toml_literal();

    let config_content = ConfigBuilder::new()
        .add_section("Themes")
        .add_setting(
            KEY_DAY_THEME,
            &string(DEFAULT_DAY_THEME),
            "GTK theme used during the day",
        )
        .add_setting(
            KEY_NIGHT_THEME,
            &string(DEFAULT_NIGHT_THEME),
            "GTK theme used during the night",
        )
        .add_setting(
            KEY_SHELL_ENABLED,
            &DEFAULT_SHELL_ENABLED.to_string(),
            "Also switch the GNOME Shell theme (needs User Themes)",
        )
        .add_setting(
            KEY_DAY_SHELL,
            &string(DEFAULT_DAY_SHELL),
            "Shell theme used during the day",
        )
        .add_setting(
            KEY_NIGHT_SHELL,
            &string(DEFAULT_NIGHT_SHELL),
            "Shell theme used during the night",
        )
        .add_section("Commands")
        .add_setting(
            KEY_COMMANDS_ENABLED,
            &DEFAULT_COMMANDS_ENABLED.to_string(),
            "Run commands when day or night begins",
        )
        .add_setting(
            KEY_DAY_COMMAND,
            &string(DEFAULT_DAY_COMMAND),
            "Command run when day begins (/bin/sh -c)",
        )
        .add_setting(
            KEY_NIGHT_COMMAND,
            &string(DEFAULT_NIGHT_COMMAND),
            "Command run when night begins (/bin/sh -c)",
        )
        .add_section("Nighttime")
        .add_setting(
            KEY_NIGHTTIME_FROM_NIGHT_LIGHT,
            &DEFAULT_NIGHTTIME_FROM_NIGHT_LIGHT.to_string(),
            "Follow the GNOME Night Light schedule",
        )
        .add_setting(
            KEY_NIGHTTIME_BEGIN,
            &DEFAULT_NIGHTTIME_BEGIN.to_string(),
            &format!("Minute of the day when night begins (0-{MAXIMUM_MINUTE_OF_DAY})"),
        )
        .add_setting(
            KEY_NIGHTTIME_END,
            &DEFAULT_NIGHTTIME_END.to_string(),
            &format!("Minute of the day when night ends (0-{MAXIMUM_MINUTE_OF_DAY})"),
        )
        .add_setting(
            KEY_TIME_CHECK_PERIOD,
            &DEFAULT_TIME_CHECK_PERIOD.to_string(),
            &format!(
                "How often the time is checked ({MINIMUM_TIME_CHECK_PERIOD}-{MAXIMUM_TIME_CHECK_PERIOD}) ms"
            ),
        )
        .add_section("Internal")
        .add_setting(
            KEY_FIRST_TIME_USER,
            &DEFAULT_FIRST_TIME_USER.to_string(),
            "Cleared after the first start",
        )
        .build();

    write_atomically(path, &config_content)
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))
}

/// Rewrite `key` in the config file at `path` to `value`.
///
/// Returns `false` if the file already held that value.
pub fn write_config_value(path: &Path, key: &str, value: &SettingValue) -> Result<bool> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let updated = update_config_content(&content, key, &value.to_toml_literal());
    if updated == content {
        return Ok(false);
    }

    write_atomically(path, &updated)
        .with_context(|| format!("Failed to write config to {}", private_path(path)))?;
    Ok(true)
}

/// Replace the value of `key` in `content`, appending the key if missing.
pub fn update_config_content(content: &str, key: &str, literal: &str) -> String {
    if let Some(line) = find_config_line(content, key) {
        let new_line = preserve_comment_formatting(&line, key, literal);
        content
            .lines()
            .map(|l| if l == line { new_line.as_str() } else { l })
            .collect::<Vec<_>>()
            .join("\n")
            + if content.ends_with('\n') { "\n" } else { "" }
    } else {
        let mut updated = content.to_string();
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&format!("{key} = {literal}\n"));
        updated
    }
}

/// Write `content` to a temporary file next to `path`, then rename it over
/// `path`. Readers (and the file watcher) never observe a half-written file.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .context("Config path has no parent directory")?;
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", private_path(dir)))?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", private_path(path)))?;
    Ok(())
}

/// Builder for creating dynamically-aligned configuration files.
///
/// Comments of all settings start in the same column, computed from the
/// longest `key = value` line.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        let mut content = result.join("\n");
        content.push('\n');
        content
    }
}

/// Find the line assigning `key`. Commented-out lines are skipped.
pub(crate) fn find_config_line(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .find(|line| {
            let trimmed = line.trim_start();
            !trimmed.starts_with('#')
                && trimmed
                    .split_once('=')
                    .is_some_and(|(lhs, _)| lhs.trim() == key)
        })
        .map(str::to_string)
}

/// Preserve the original comment formatting when updating a config line value.
///
/// The whitespace between the old value and its trailing comment is kept
/// as is, so hand-aligned comments stay aligned as far as the new value
/// allows.
pub(crate) fn preserve_comment_formatting(
    original_line: &str,
    key: &str,
    new_value: &str,
) -> String {
    let indent_len = original_line.len() - original_line.trim_start().len();
    let key_value_part = format!("{}{key} = {new_value}", &original_line[..indent_len]);

    if let Some(comment_pos) = comment_start(original_line) {
        let comment_part = &original_line[comment_pos..];
        let before_comment = &original_line[..comment_pos];
        let original_spacing =
            match before_comment.rfind(|c: char| !c.is_whitespace()) {
                Some(last_non_space) => &before_comment[last_non_space + 1..],
                None => " ",
            };
        let spacing = if original_spacing.is_empty() {
            " "
        } else {
            original_spacing
        };

        format!("{key_value_part}{spacing}{comment_part}")
    } else {
        key_value_part
    }
}

/// Byte offset of a trailing `#` comment, ignoring `#` inside strings.
fn comment_start(line: &str) -> Option<usize> {
    let mut in_basic = false;
    let mut in_literal = false;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if in_basic {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_basic = false,
                _ => {}
            }
            continue;
        }
        if in_literal {
            if c == '\'' {
                in_literal = false;
            }
            continue;
        }
        match c {
            '"' => in_basic = true,
            '\'' => in_literal = true,
            '#' => return Some(i),
            _ => {}
        }
    }
    None
}
