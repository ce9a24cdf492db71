//! Key/value settings stores with change notifications.
//!
//! Every configuration source nightfall reads is exposed through the
//! [`SettingsStore`] trait:
//!
//! - `FileStore`: nightfall's own settings, backed by `nightfall.toml`
//! - `GSettingsStore`: a GNOME schema (`org.gnome.desktop.interface`, the Night
//!   Light color plugin, the User Themes extension) accessed through `gsettings`
//! - `MemoryStore`: an in-process store used by tests
//!
//! Change notifications are push based. A component calls
//! [`SettingsStore::subscribe`] and keeps the returned [`Subscription`] for as
//! long as it wants to hear about the key. Stores report changes to the shared
//! [`SettingsHub`], which forwards a [`SettingChange`] into the main loop's
//! channel only while at least one subscription for that key is alive.
//! Dropping the handle unsubscribes.

pub mod file;
pub mod gsettings;
pub mod memory;
pub mod subscription;

use anyhow::Result;
use std::fmt;

pub use file::FileStore;
pub use gsettings::GSettingsStore;
pub use memory::MemoryStore;
pub use subscription::{SettingsHub, Subscription};

/// Identifies which store a change notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsSource {
    /// nightfall's own settings (`nightfall.toml`)
    Extension,
    /// `org.gnome.desktop.interface`
    Interface,
    /// `org.gnome.settings-daemon.plugins.color`
    NightLight,
    /// The User Themes shell extension settings
    UserThemes,
}

impl SettingsSource {
    pub fn name(&self) -> &'static str {
        match self {
            SettingsSource::Extension => "nightfall",
            SettingsSource::Interface => "interface",
            SettingsSource::NightLight => "night-light",
            SettingsSource::UserThemes => "user-themes",
        }
    }
}

/// A notification that `key` changed in `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingChange {
    pub source: SettingsSource,
    pub key: String,
}

impl SettingChange {
    pub fn new(source: SettingsSource, key: impl Into<String>) -> Self {
        Self {
            source,
            key: key.into(),
        }
    }
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    String(String),
    Uint(u32),
    Boolean(bool),
    Double(f64),
}

impl SettingValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::String(_) => "string",
            SettingValue::Uint(_) => "uint",
            SettingValue::Boolean(_) => "boolean",
            SettingValue::Double(_) => "double",
        }
    }

    /// Render the value as a TOML literal (strings are quoted and escaped).
    pub fn to_toml_literal(&self) -> String {
        match self {
            SettingValue::String(s) => toml::Value::String(s.clone()).to_string(),
            SettingValue::Uint(n) => n.to_string(),
            SettingValue::Boolean(b) => b.to_string(),
            SettingValue::Double(d) => toml::Value::Float(*d).to_string(),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::String(s) => write!(f, "{s}"),
            SettingValue::Uint(n) => write!(f, "{n}"),
            SettingValue::Boolean(b) => write!(f, "{b}"),
            SettingValue::Double(d) => write!(f, "{d}"),
        }
    }
}

/// A key/value configuration source with change notifications.
///
/// Implementations must be cheap to share (`Arc<dyn SettingsStore>`) and safe
/// to call from the main loop thread while monitor threads report changes.
pub trait SettingsStore: Send + Sync {
    /// The source tag attached to this store's change notifications.
    fn source(&self) -> SettingsSource;

    /// Read the current value of `key`.
    fn get(&self, key: &str) -> Result<SettingValue>;

    /// Write `value` to `key`. Subscribers are notified if the value changed.
    fn set(&self, key: &str, value: SettingValue) -> Result<()>;

    /// Start listening for changes of `key`. Dropping the handle stops it.
    fn subscribe(&self, key: &str) -> Result<Subscription>;

    fn get_string(&self, key: &str) -> Result<String> {
        match self.get(key)? {
            SettingValue::String(s) => Ok(s),
            other => type_mismatch(self.source(), key, "string", &other),
        }
    }

    fn get_uint(&self, key: &str) -> Result<u32> {
        match self.get(key)? {
            SettingValue::Uint(n) => Ok(n),
            other => type_mismatch(self.source(), key, "uint", &other),
        }
    }

    fn get_boolean(&self, key: &str) -> Result<bool> {
        match self.get(key)? {
            SettingValue::Boolean(b) => Ok(b),
            other => type_mismatch(self.source(), key, "boolean", &other),
        }
    }

    fn get_double(&self, key: &str) -> Result<f64> {
        match self.get(key)? {
            SettingValue::Double(d) => Ok(d),
            SettingValue::Uint(n) => Ok(f64::from(n)),
            other => type_mismatch(self.source(), key, "double", &other),
        }
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, SettingValue::String(value.to_string()))
    }

    fn set_uint(&self, key: &str, value: u32) -> Result<()> {
        self.set(key, SettingValue::Uint(value))
    }

    fn set_boolean(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, SettingValue::Boolean(value))
    }
}

fn type_mismatch<T>(
    source: SettingsSource,
    key: &str,
    expected: &str,
    found: &SettingValue,
) -> Result<T> {
    anyhow::bail!(
        "{}: key '{}' holds a {} value, expected {}",
        source.name(),
        key,
        found.type_name(),
        expected
    )
}
