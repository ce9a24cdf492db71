//! GNOME settings accessed through the `gsettings` tool.
//!
//! Values are exchanged in GVariant text format (`'Adwaita'`, `uint32 1200`,
//! `20.0`, `true`). Change notifications come from a long-running
//! `gsettings monitor` child, started on the first subscription and killed
//! when the store is dropped.

use anyhow::{Context, Result, bail};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread;

use super::{SettingValue, SettingsHub, SettingsSource, SettingsStore, Subscription};

pub struct GSettingsStore {
    source: SettingsSource,
    schema: String,
    schema_dir: Option<PathBuf>,
    hub: SettingsHub,
    monitor: Mutex<Option<Child>>,
}

impl GSettingsStore {
    pub fn new(source: SettingsSource, schema: &str, hub: SettingsHub) -> Self {
        Self {
            source,
            schema: schema.to_string(),
            schema_dir: None,
            hub,
            monitor: Mutex::new(None),
        }
    }

    /// Look the schema up in `dir` in addition to the installed schemas.
    ///
    /// Extensions ship their compiled schema in their own `schemas/` folder.
    pub fn with_schema_dir(mut self, dir: &Path) -> Self {
        self.schema_dir = Some(dir.to_path_buf());
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new("gsettings");
        if let Some(dir) = &self.schema_dir {
            command.arg("--schemadir").arg(dir);
        }
        command
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self
            .command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .context("Failed to run gsettings")?;

        if !output.status.success() {
            bail!(
                "gsettings {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Whether the schema is installed (or present in the schema dir).
    pub fn is_available(&self) -> bool {
        self.run(&["list-keys", self.schema.as_str()]).is_ok()
    }

    fn ensure_monitor(&self) -> Result<()> {
        let mut monitor = self.monitor.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(child) = monitor.as_mut()
            && matches!(child.try_wait(), Ok(None))
        {
            return Ok(());
        }

        let mut child = self
            .command()
            .args(["monitor", self.schema.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to monitor {}", self.schema))?;
        let stdout = child
            .stdout
            .take()
            .context("gsettings monitor has no stdout")?;

        let hub = self.hub.clone();
        let source = self.source;
        thread::Builder::new()
            .name(format!("gsettings-{}", source.name()))
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else {
                        break;
                    };
                    if let Some((key, _)) = parse_monitor_line(&line) {
                        hub.notify(source, key);
                    }
                }
            })
            .context("Failed to spawn gsettings monitor thread")?;

        *monitor = Some(child);
        Ok(())
    }
}

impl SettingsStore for GSettingsStore {
    fn source(&self) -> SettingsSource {
        self.source
    }

    fn get(&self, key: &str) -> Result<SettingValue> {
        let text = self.run(&["get", self.schema.as_str(), key])?;
        parse_gvariant(&text).with_context(|| format!("{} {}", self.schema, key))
    }

    fn set(&self, key: &str, value: SettingValue) -> Result<()> {
        let literal = format_gvariant(&value);
        self.run(&["set", self.schema.as_str(), key, literal.as_str()])?;
        Ok(())
    }

    fn subscribe(&self, key: &str) -> Result<Subscription> {
        self.ensure_monitor()?;
        Ok(self.hub.subscribe(self.source, key))
    }
}

impl Drop for GSettingsStore {
    fn drop(&mut self) {
        let monitor = self.monitor.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut child) = monitor.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Split a `gsettings monitor` line (`key: value`).
pub fn parse_monitor_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(": ")?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, value.trim()))
}

/// Parse the GVariant text `gsettings get` prints for the value types
/// nightfall reads.
pub fn parse_gvariant(text: &str) -> Result<SettingValue> {
    let text = text.trim();

    match text {
        "true" => return Ok(SettingValue::Boolean(true)),
        "false" => return Ok(SettingValue::Boolean(false)),
        _ => {}
    }

    if let Some(number) = text.strip_prefix("uint32 ") {
        let n = number.trim().parse::<u32>().context("Invalid uint32")?;
        return Ok(SettingValue::Uint(n));
    }

    if let Some(quote) = text.chars().next()
        && (quote == '\'' || quote == '"')
    {
        return parse_quoted(text, quote).map(SettingValue::String);
    }

    if let Ok(n) = text.parse::<u32>() {
        return Ok(SettingValue::Uint(n));
    }
    if let Ok(d) = text.parse::<f64>() {
        return Ok(SettingValue::Double(d));
    }

    bail!("Unsupported value '{}'", text)
}

fn parse_quoted(text: &str, quote: char) -> Result<String> {
    let inner = text
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
        .with_context(|| format!("Unterminated string {text}"))?;

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => bail!("Dangling escape in {text}"),
        }
    }
    Ok(result)
}

/// Render a value as GVariant text for `gsettings set`.
pub fn format_gvariant(value: &SettingValue) -> String {
    match value {
        SettingValue::String(s) => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push('\'');
            for c in s.chars() {
                match c {
                    '\'' | '\\' => {
                        out.push('\\');
                        out.push(c);
                    }
                    '\n' => out.push_str("\\n"),
                    _ => out.push(c),
                }
            }
            out.push('\'');
            out
        }
        SettingValue::Uint(n) => format!("uint32 {n}"),
        SettingValue::Boolean(b) => b.to_string(),
        SettingValue::Double(d) => format!("{d:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gvariant() {
        assert_eq!(parse_gvariant("'Adwaita-dark'").unwrap(), SettingValue::String("Adwaita-dark".into()));
        assert_eq!(parse_gvariant("\"it's\"").unwrap(), SettingValue::String("it's".into()));
        assert_eq!(parse_gvariant("'a\\'b\\\\c'").unwrap(), SettingValue::String("a'b\\c".into()));
        assert_eq!(parse_gvariant("''").unwrap(), SettingValue::String(String::new()));
        assert_eq!(parse_gvariant("uint32 1200").unwrap(), SettingValue::Uint(1200));
        assert_eq!(parse_gvariant("20.5").unwrap(), SettingValue::Double(20.5));
        assert_eq!(parse_gvariant("true\n").unwrap(), SettingValue::Boolean(true));
        assert!(parse_gvariant("@as []").is_err());
        assert!(parse_gvariant("'open").is_err());
    }

    #[test]
    fn test_format_gvariant() {
        assert_eq!(format_gvariant(&SettingValue::String("it's".into())), "'it\\'s'");
        assert_eq!(format_gvariant(&SettingValue::Uint(420)), "uint32 420");
        assert_eq!(format_gvariant(&SettingValue::Double(6.0)), "6.0");
        assert_eq!(format_gvariant(&SettingValue::Boolean(false)), "false");

        let value = SettingValue::String("a'b\\c".into());
        assert_eq!(parse_gvariant(&format_gvariant(&value)).unwrap(), value);
    }

    #[test]
    fn test_parse_monitor_line() {
        assert_eq!(parse_monitor_line("gtk-theme: 'Yaru'"), Some(("gtk-theme", "'Yaru'")));
        assert_eq!(parse_monitor_line("night-light-schedule-from: 20.0"), Some(("night-light-schedule-from", "20.0")));
        assert_eq!(parse_monitor_line("no separator"), None);
    }
}
