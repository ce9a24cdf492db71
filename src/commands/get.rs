//! Get command implementation for reading configuration fields
//!
//! Prints values from `nightfall.toml` (defaults filled in) in human-readable
//! or JSON form.

use anyhow::Result;
use serde_json::json;

use crate::config::KEYS;
use crate::settings::SettingValue;

/// Handle the get command - read configuration fields
///
/// `fields` may be the single special value `all`.
pub fn handle_get_command(fields: &[String], json: bool) -> Result<()> {
    // No version header: the output is meant for scripts
    super::follow_running_instance()?;

    let keys = match resolve_fields(fields) {
        Ok(keys) => keys,
        Err(unknown) => {
            if json {
                let error = json!({
                    "error": format!("Unknown field(s): {}", unknown.join(", ")),
                    "type": "UnknownField",
                    "available": KEYS,
                });
                eprintln!("{}", serde_json::to_string(&error)?);
            } else {
                log_pipe!();
                log_error!("Unknown configuration field(s): {}", unknown.join(", "));
                log_block_start!("Available fields:");
                log_indented!("all (special: returns all fields)");
                for key in KEYS {
                    log_indented!("{}", key);
                }
                log_end!();
            }
            std::process::exit(1);
        }
    };

    let config = crate::config::load()?;
    let mut values = Vec::with_capacity(keys.len());
    for key in keys {
        values.push((key, config.value(key)?));
    }

    if json {
        let mut object = serde_json::Map::new();
        for (key, value) in &values {
            object.insert(key.to_string(), json_value(value));
        }
        println!("{}", serde_json::to_string(&object)?);
    } else if let [(_, value)] = values.as_slice()
        && fields.len() == 1
        && fields[0] != "all"
    {
        println!("{value}");
    } else {
        for (key, value) in &values {
            println!("{key}={value}");
        }
    }

    Ok(())
}

/// Map requested field names to configuration keys.
///
/// Returns the unknown names if any field is not a key.
fn resolve_fields(fields: &[String]) -> Result<Vec<&'static str>, Vec<String>> {
    if fields.iter().any(|f| f == "all") {
        return Ok(KEYS.to_vec());
    }

    let mut keys = Vec::with_capacity(fields.len());
    let mut unknown = Vec::new();
    for field in fields {
        // Accept snake_case spellings too
        let normalized = field.replace('_', "-");
        match KEYS.iter().find(|key| **key == normalized) {
            Some(key) => keys.push(*key),
            None => unknown.push(field.clone()),
        }
    }

    if unknown.is_empty() { Ok(keys) } else { Err(unknown) }
}

fn json_value(value: &SettingValue) -> serde_json::Value {
    match value {
        SettingValue::String(s) => json!(s),
        SettingValue::Uint(n) => json!(n),
        SettingValue::Boolean(b) => json!(b),
        SettingValue::Double(d) => json!(d),
    }
}

/// Display usage help for the get command (--help flag)
pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: nightfall get [OPTIONS] <field> [<field>...]");
    log_block_start!("Options:");
    log_indented!("-j, --json  Output as a JSON object");
    log_pipe!();
    log_info!("For detailed help with examples, try: nightfall help get");
    log_end!();
}

/// Display detailed help for the get command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("get - Read configuration fields");
    log_block_start!("Usage: nightfall get [OPTIONS] <field> [<field>...]");
    log_block_start!("Arguments:");
    log_indented!("<field>  A key of nightfall.toml, or 'all'");
    log_block_start!("Options:");
    log_indented!("-j, --json  Output as a JSON object");
    log_block_start!("Output:");
    log_indented!("One field prints its bare value, several print key=value lines");
    log_block_start!("Examples:");
    log_indented!("# Which theme is used at night?");
    log_indented!("nightfall get night-theme");
    log_pipe!();
    log_indented!("# The nighttime window as JSON");
    log_indented!("nightfall get nighttime-begin nighttime-end --json");
    log_pipe!();
    log_indented!("# Everything");
    log_indented!("nightfall get all");
    log_end!();
}
