//! nightfall's own settings, backed by `nightfall.toml`.

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{SettingValue, SettingsHub, SettingsSource, SettingsStore, Subscription};
use crate::config::validation::validate_config;
use crate::config::{self, Config};

/// The extension settings store.
///
/// Reads are served from the in-memory [`Config`]. Writes are validated,
/// persisted by rewriting only the affected line of the file, and then
/// announced. [`FileStore::reload`] picks up edits made outside the daemon.
pub struct FileStore {
    path: PathBuf,
    hub: SettingsHub,
    config: Mutex<Config>,
}

impl FileStore {
    pub fn new(path: PathBuf, config: Config, hub: SettingsHub) -> Self {
        Self {
            path,
            hub,
            config: Mutex::new(config),
        }
    }

    /// Load the store from the file at `path`.
    pub fn open(path: &Path, hub: SettingsHub) -> Result<Self> {
        let config = config::load_from_path(path)?;
        Ok(Self::new(path.to_path_buf(), config, hub))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and announce every key whose value changed.
    ///
    /// An unreadable or invalid file leaves the current values in place.
    pub fn reload(&self) -> Result<Vec<&'static str>> {
        let fresh = config::load_from_path(&self.path)?;

        let changed = {
            let mut current = self.lock();
            let changed = current.changed_keys(&fresh);
            *current = fresh;
            changed
        };

        for key in &changed {
            self.hub.notify(SettingsSource::Extension, key);
        }
        Ok(changed)
    }

    fn lock(&self) -> MutexGuard<'_, Config> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SettingsStore for FileStore {
    fn source(&self) -> SettingsSource {
        SettingsSource::Extension
    }

    fn get(&self, key: &str) -> Result<SettingValue> {
        self.lock().value(key)
    }

    fn set(&self, key: &str, value: SettingValue) -> Result<()> {
        {
            let mut current = self.lock();
            if current.value(key)? == value {
                return Ok(());
            }

            let mut candidate = current.clone();
            candidate.set_value(key, value.clone())?;
            if let Err(e) = validate_config(&candidate) {
                bail!("Refusing to set {key}: {e}");
            }

            config::write_config_value(&self.path, key, &value)?;
            *current = candidate;
        }

        self.hub.notify(SettingsSource::Extension, key);
        Ok(())
    }

    fn subscribe(&self, key: &str) -> Result<Subscription> {
        config::key_kind(key)?;
        Ok(self.hub.subscribe(SettingsSource::Extension, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::*;
    use crate::io::signals::SignalMessage;
    use crate::settings::SettingChange;
    use std::fs;
    use std::sync::mpsc::channel;
    use tempfile::tempdir;

    fn open_default(dir: &Path, hub: SettingsHub) -> FileStore {
        let path = dir.join(CONFIG_FILE_NAME);
        config::create_default_config(&path).unwrap();
        FileStore::open(&path, hub).unwrap()
    }

    #[test]
    fn test_set_persists_and_notifies() {
        let dir = tempdir().unwrap();
        let (tx, rx) = channel();
        let store = open_default(dir.path(), SettingsHub::new(tx));
        let _sub = store.subscribe(KEY_NIGHT_THEME).unwrap();

        store.set_string(KEY_NIGHT_THEME, "Yaru-dark").unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            SignalMessage::SettingChanged(SettingChange::new(SettingsSource::Extension, KEY_NIGHT_THEME))
        );

        let on_disk = config::load_from_path(store.path()).unwrap();
        assert_eq!(on_disk.night_theme.as_deref(), Some("Yaru-dark"));

        // Same value again: no write, no notification
        store.set_string(KEY_NIGHT_THEME, "Yaru-dark").unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let store = open_default(dir.path(), SettingsHub::detached());

        assert!(store.set_uint(KEY_NIGHTTIME_BEGIN, 1440).is_err());
        assert!(store.set_string(KEY_NIGHTTIME_BEGIN, "late").is_err());
        assert_eq!(store.get_uint(KEY_NIGHTTIME_BEGIN).unwrap(), DEFAULT_NIGHTTIME_BEGIN);
    }

    #[test]
    fn test_reload_announces_changed_keys() {
        let dir = tempdir().unwrap();
        let (tx, rx) = channel();
        let store = open_default(dir.path(), SettingsHub::new(tx));
        let _begin = store.subscribe(KEY_NIGHTTIME_BEGIN).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        let edited = content
            .replace("nighttime-begin = 1200", "nighttime-begin = 1320")
            .replace("time-check-period = 1000", "time-check-period = 500");
        fs::write(store.path(), edited).unwrap();

        let changed = store.reload().unwrap();
        assert_eq!(changed, vec![KEY_NIGHTTIME_BEGIN, KEY_TIME_CHECK_PERIOD]);
        assert_eq!(store.get_uint(KEY_NIGHTTIME_BEGIN).unwrap(), 1320);

        // Only the subscribed key reaches the main loop
        assert!(matches!(rx.try_recv(), Ok(SignalMessage::SettingChanged(c)) if c.key == KEY_NIGHTTIME_BEGIN));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reload_keeps_values_on_invalid_file() {
        let dir = tempdir().unwrap();
        let store = open_default(dir.path(), SettingsHub::detached());

        fs::write(store.path(), "nighttime-end = 9999\n").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.get_uint(KEY_NIGHTTIME_END).unwrap(), DEFAULT_NIGHTTIME_END);
    }
}
