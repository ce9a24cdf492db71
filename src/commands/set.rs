//! Set command implementation for modifying configuration fields
//!
//! Updates settings in `nightfall.toml` without manual editing, keeping the
//! file's comments. A running daemon picks the change up through its file
//! watcher.

use anyhow::{Context, Result};

use crate::common::utils::private_path;
use crate::config::{self, Config, validation::validate_config};
use crate::settings::SettingValue;

/// Handle the set command - update configuration fields
pub fn handle_set_command(fields: &[(String, String)], debug_enabled: bool) -> Result<()> {
    log_version!();

    super::follow_running_instance()?;

    let config = config::load()?;
    let config_path = config::get_config_path()?;

    let updates = match prepare_updates(&config, fields) {
        Ok(updates) => updates,
        Err(e) => {
            log_pipe!();
            log_error!("{:#}", e);
            anyhow::bail!("Configuration validation failed");
        }
    };

    let mut updated = Vec::new();
    for (key, value) in &updates {
        if config::write_config_value(&config_path, key, value)? {
            updated.push((*key, value));
        } else if debug_enabled {
            log_pipe!();
            log_debug!("{} already holds {}", key, value.to_toml_literal());
        }
    }

    if updated.is_empty() {
        log_block_start!("Configuration unchanged");
        if let [(key, value)] = updates.as_slice() {
            log_indented!("{} is already set to {}", key, value.to_toml_literal());
        } else {
            log_indented!("All fields already have the specified values");
        }
        log_end!();
        return Ok(());
    }

    log_block_start!("Updated configuration");
    for (key, value) in &updated {
        log_indented!("{} = {}", key, value.to_toml_literal());
    }
    log_indented!("in {}", private_path(&config_path));

    if let Ok(pid) = crate::io::instance::get_running_instance_pid() {
        log_block_start!("The running instance (PID: {}) applies it automatically", pid);
    } else {
        log_block_start!("Start nightfall to apply the new configuration");
    }
    log_end!();

    Ok(())
}

/// Parse every `field=value` pair and check the resulting configuration.
///
/// Nothing is written unless all fields are valid together, so
/// `nighttime-begin` and `nighttime-end` can be changed in one call.
fn prepare_updates(
    config: &Config,
    fields: &[(String, String)],
) -> Result<Vec<(&'static str, SettingValue)>> {
    let mut candidate = config.clone();
    let mut updates = Vec::with_capacity(fields.len());

    for (field, raw) in fields {
        let normalized = field.replace('_', "-");
        let key = config::KEYS
            .iter()
            .copied()
            .find(|key| *key == normalized)
            .with_context(|| format!("Unknown configuration field: '{}'", field))?;

        let value = Config::parse_value(key, raw)?;
        candidate.set_value(key, value.clone())?;
        updates.push((key, value));
    }

    validate_config(&candidate)?;
    Ok(updates)
}

/// Display usage help for the set command (--help flag)
pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: nightfall set <field>=<value> [<field>=<value>...]");
    log_block_start!("Description:");
    log_indented!("Update fields of nightfall.toml");
    log_pipe!();
    log_info!("For detailed help with examples, try: nightfall help set");
    log_end!();
}

/// Display detailed help for the set command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("set - Update configuration fields");
    log_block_start!("Usage: nightfall set <field>=<value> [<field>=<value>...]");
    log_block_start!("Description:");
    log_indented!("Validates all values together, then rewrites only the changed");
    log_indented!("lines of nightfall.toml. Comments are preserved. A running");
    log_indented!("instance reloads the file on its own.");
    log_block_start!("Values:");
    log_indented!("Themes and commands: plain text, quotes optional");
    log_indented!("nighttime-begin/end: minute of the day (0-1439)");
    log_indented!("time-check-period: milliseconds (10-1800000)");
    log_indented!("Toggles: true/false, yes/no, on/off, 1/0");
    log_block_start!("Examples:");
    log_indented!("# Night from 21:30 to 06:00");
    log_indented!("nightfall set nighttime-begin=1290 nighttime-end=360");
    log_pipe!();
    log_indented!("# Switch the shell theme too");
    log_indented!("nightfall set shell-enabled=true night-shell=Yaru-dark");
    log_pipe!();
    log_indented!("# Run a command when night begins");
    log_indented!("nightfall set commands-enabled=on \"night-command=notify-send 'Good night'\"");
    log_end!();
}
