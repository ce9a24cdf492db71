//! Window configured in minutes in nightfall's own settings.

use anyhow::Result;
use std::sync::Arc;

use super::{KeyedWindow, WindowProvider};
use crate::common::constants::{KEY_NIGHTTIME_BEGIN, KEY_NIGHTTIME_END};
use crate::core::lifecycle::Lifecycle;
use crate::core::window::TimeWindow;
use crate::settings::{SettingChange, SettingsStore};

pub struct ManualWindow {
    inner: KeyedWindow,
}

impl ManualWindow {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            inner: KeyedWindow::new(settings, KEY_NIGHTTIME_BEGIN, KEY_NIGHTTIME_END, |store, key| {
                store.get_uint(key)
            }),
        }
    }
}

impl Lifecycle for ManualWindow {
    fn on_enabled(&mut self) -> Result<()> {
        self.inner.enable()
    }

    fn on_disabled(&mut self) {
        self.inner.disable();
    }
}

impl WindowProvider for ManualWindow {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn window(&self) -> Option<TimeWindow> {
        self.inner.window
    }

    fn on_setting_changed(&mut self, change: &SettingChange) -> bool {
        self.inner.on_setting_changed(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MemoryStore, SettingValue, SettingsHub, SettingsSource};
    use chrono::{Local, TimeZone};

    fn store(hub: &SettingsHub, begin: u32, end: u32) -> Arc<MemoryStore> {
        Arc::new(
            MemoryStore::new(SettingsSource::Extension, hub.clone())
                .with(KEY_NIGHTTIME_BEGIN, SettingValue::Uint(begin))
                .with(KEY_NIGHTTIME_END, SettingValue::Uint(end)),
        )
    }

    #[test]
    fn test_reads_window_on_enable_and_refreshes_on_change() {
        let hub = SettingsHub::detached();
        let settings = store(&hub, 1320, 60);
        let mut provider = ManualWindow::new(settings.clone());
        assert_eq!(provider.window(), None);

        provider.on_enabled().unwrap();
        assert_eq!(provider.window(), Some(TimeWindow::new(1320, 60)));
        assert_eq!(hub.subscription_count(), 2);

        settings.set_uint(KEY_NIGHTTIME_END, 360).unwrap();
        let change = SettingChange::new(SettingsSource::Extension, KEY_NIGHTTIME_END);
        assert!(provider.on_setting_changed(&change));
        assert_eq!(provider.window(), Some(TimeWindow::new(1320, 360)));

        provider.on_disabled();
        assert_eq!(hub.subscription_count(), 0);
        assert_eq!(provider.window(), None);
    }

    #[test]
    fn test_unreadable_window_is_day() {
        let hub = SettingsHub::detached();
        let settings = store(&hub, 0, 0);
        let mut provider = ManualWindow::new(settings.clone());
        provider.on_enabled().unwrap();

        let noon = Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert!(provider.is_nighttime(&noon));

        settings.remove(KEY_NIGHTTIME_BEGIN);
        let change = SettingChange::new(SettingsSource::Extension, KEY_NIGHTTIME_BEGIN);
        assert!(provider.on_setting_changed(&change));
        assert!(!provider.is_nighttime(&noon));
    }

    #[test]
    fn test_failed_enable_keeps_no_subscriptions() {
        let hub = SettingsHub::detached();
        let settings = Arc::new(
            MemoryStore::new(SettingsSource::Extension, hub.clone())
                .with(KEY_NIGHTTIME_BEGIN, SettingValue::Uint(1200)),
        );
        let mut provider = ManualWindow::new(settings);

        assert!(provider.on_enabled().is_err());
        assert_eq!(hub.subscription_count(), 0);
    }
}
