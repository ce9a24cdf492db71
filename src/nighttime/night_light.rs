//! Window following the GNOME Night Light schedule.
//!
//! The color plugin stores the schedule as fractional hours
//! (`night-light-schedule-from = 20.0`), converted here to whole minutes.

use anyhow::Result;
use std::sync::Arc;

use super::{KeyedWindow, WindowProvider};
use crate::common::constants::{NIGHT_LIGHT_FROM_KEY, NIGHT_LIGHT_TO_KEY};
use crate::core::lifecycle::Lifecycle;
use crate::core::window::{TimeWindow, hours_to_minutes};
use crate::settings::{SettingChange, SettingsStore};

pub struct NightLightWindow {
    inner: KeyedWindow,
}

impl NightLightWindow {
    /// `color_settings` is the `org.gnome.settings-daemon.plugins.color` store.
    pub fn new(color_settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            inner: KeyedWindow::new(color_settings, NIGHT_LIGHT_FROM_KEY, NIGHT_LIGHT_TO_KEY, |store, key| {
                store.get_double(key).map(hours_to_minutes)
            }),
        }
    }
}

impl Lifecycle for NightLightWindow {
    fn on_enabled(&mut self) -> Result<()> {
        self.inner.enable()
    }

    fn on_disabled(&mut self) {
        self.inner.disable();
    }
}

impl WindowProvider for NightLightWindow {
    fn name(&self) -> &'static str {
        "night-light"
    }

    fn window(&self) -> Option<TimeWindow> {
        self.inner.window
    }

    fn on_setting_changed(&mut self, change: &SettingChange) -> bool {
        self.inner.on_setting_changed(change)
    }
}
