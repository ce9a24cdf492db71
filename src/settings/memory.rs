//! In-process settings store.

use anyhow::{Result, bail};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{SettingValue, SettingsHub, SettingsSource, SettingsStore, Subscription};

#[derive(Default)]
struct Inner {
    values: HashMap<String, SettingValue>,
    writes: HashMap<String, usize>,
}

/// A settings store holding its values in memory.
///
/// Writes through [`SettingsStore::set`] notify subscribers like any other
/// store; [`MemoryStore::insert`] seeds values silently. The store also counts
/// effective writes per key, which tests use to check idempotence.
pub struct MemoryStore {
    source: SettingsSource,
    hub: SettingsHub,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(source: SettingsSource, hub: SettingsHub) -> Self {
        Self {
            source,
            hub,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seed `key` without notifying subscribers.
    pub fn insert(&self, key: &str, value: SettingValue) {
        let mut inner = self.lock();
        inner.values.insert(key.to_string(), value);
    }

    /// Builder-style variant of [`MemoryStore::insert`].
    pub fn with(self, key: &str, value: SettingValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Remove `key`, making subsequent reads fail.
    pub fn remove(&self, key: &str) {
        self.lock().values.remove(key);
    }

    /// Number of writes through `set` that changed the value of `key`.
    pub fn write_count(&self, key: &str) -> usize {
        self.lock().writes.get(key).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SettingsStore for MemoryStore {
    fn source(&self) -> SettingsSource {
        self.source
    }

    fn get(&self, key: &str) -> Result<SettingValue> {
        match self.lock().values.get(key) {
            Some(value) => Ok(value.clone()),
            None => bail!("{}: no such key '{}'", self.source.name(), key),
        }
    }

    fn set(&self, key: &str, value: SettingValue) -> Result<()> {
        let changed = {
            let mut inner = self.lock();
            if inner.values.get(key) == Some(&value) {
                false
            } else {
                inner.values.insert(key.to_string(), value);
                *inner.writes.entry(key.to_string()).or_insert(0) += 1;
                true
            }
        };

        if changed {
            self.hub.notify(self.source, key);
        }
        Ok(())
    }

    fn subscribe(&self, key: &str) -> Result<Subscription> {
        Ok(self.hub.subscribe(self.source, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::signals::SignalMessage;
    use std::sync::mpsc::channel;

    #[test]
    fn test_set_notifies_only_on_change() {
        let (tx, rx) = channel();
        let store = MemoryStore::new(SettingsSource::Interface, SettingsHub::new(tx))
            .with("gtk-theme", SettingValue::String("Adwaita".into()));
        let _subscription = store.subscribe("gtk-theme").unwrap();

        store.set_string("gtk-theme", "Adwaita").unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(store.write_count("gtk-theme"), 0);

        store.set_string("gtk-theme", "Adwaita-dark").unwrap();
        assert!(matches!(rx.try_recv(), Ok(SignalMessage::SettingChanged(_))));
        assert_eq!(store.write_count("gtk-theme"), 1);
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let store = MemoryStore::new(SettingsSource::UserThemes, SettingsHub::detached());
        assert!(store.get("name").is_err());

        store.insert("name", SettingValue::String("Nordic".into()));
        assert_eq!(store.get_string("name").unwrap(), "Nordic");

        store.remove("name");
        assert!(store.get_string("name").is_err());
    }
}
