//! Nighttime window providers.
//!
//! A provider caches the current [`TimeWindow`] and keeps it fresh from
//! change notifications of the settings store it reads. Two providers exist:
//!
//! - [`ManualWindow`]: `nighttime-begin`/`nighttime-end` from nightfall's own
//!   settings, in minutes
//! - [`NightLightWindow`]: the GNOME Night Light schedule, in hours
//!
//! The assembly picks one according to `nighttime-from-night-light` and swaps
//! them at runtime.

pub mod manual;
pub mod night_light;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::sync::Arc;

use crate::core::lifecycle::Lifecycle;
use crate::core::window::TimeWindow;
use crate::settings::{SettingChange, SettingsStore, Subscription};

pub use manual::ManualWindow;
pub use night_light::NightLightWindow;

/// Source of the nighttime window.
pub trait WindowProvider: Lifecycle {
    /// Short name used in logs and `nightfall status`.
    fn name(&self) -> &'static str;

    /// The cached window, `None` if it could not be read.
    fn window(&self) -> Option<TimeWindow>;

    /// Refresh the cache after a change notification.
    ///
    /// Returns `true` if the change concerned this provider.
    fn on_setting_changed(&mut self, change: &SettingChange) -> bool;

    /// Whether `time` lies inside the window. An unreadable window is day.
    fn is_nighttime(&self, time: &DateTime<Local>) -> bool {
        self.window().is_some_and(|window| window.is_nighttime(time))
    }
}

type ReadBound = fn(&dyn SettingsStore, &str) -> Result<u32>;

/// A window read from two keys of one store.
struct KeyedWindow {
    settings: Arc<dyn SettingsStore>,
    begin_key: &'static str,
    end_key: &'static str,
    read: ReadBound,
    window: Option<TimeWindow>,
    subscriptions: Vec<Subscription>,
}

impl KeyedWindow {
    fn new(
        settings: Arc<dyn SettingsStore>,
        begin_key: &'static str,
        end_key: &'static str,
        read: ReadBound,
    ) -> Self {
        Self {
            settings,
            begin_key,
            end_key,
            read,
            window: None,
            subscriptions: Vec::new(),
        }
    }

    fn read_window(&self) -> Result<TimeWindow> {
        let store = self.settings.as_ref();
        let begin = (self.read)(store, self.begin_key)
            .with_context(|| format!("Failed to read {}", self.begin_key))?;
        let end = (self.read)(store, self.end_key)
            .with_context(|| format!("Failed to read {}", self.end_key))?;
        Ok(TimeWindow::new(begin, end))
    }

    fn enable(&mut self) -> Result<()> {
        let window = self.read_window()?;
        let subscriptions = vec![
            self.settings.subscribe(self.begin_key)?,
            self.settings.subscribe(self.end_key)?,
        ];

        self.window = Some(window);
        self.subscriptions = subscriptions;
        Ok(())
    }

    fn disable(&mut self) {
        self.subscriptions.clear();
        self.window = None;
    }

    fn on_setting_changed(&mut self, change: &SettingChange) -> bool {
        if !self.subscriptions.iter().any(|s| s.matches(change)) {
            return false;
        }

        match self.read_window() {
            Ok(window) => self.window = Some(window),
            Err(e) => {
                log_warning!("Nighttime window unavailable: {e:#}");
                self.window = None;
            }
        }
        true
    }
}
