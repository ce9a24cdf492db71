//! GTK theme switching through `org.gnome.desktop.interface`.

use anyhow::{Context, Result};
use std::sync::Arc;

use super::{Reaction, Slots};
use crate::common::constants::{INTERFACE_GTK_THEME_KEY, KEY_DAY_THEME, KEY_NIGHT_THEME};
use crate::core::lifecycle::Lifecycle;
use crate::core::state::State;
use crate::settings::{SettingChange, SettingsStore, Subscription};

/// Applies `day-theme`/`night-theme` to `gtk-theme`.
///
/// A theme picked elsewhere (GNOME Tweaks, `gsettings set`) is written back
/// into the slot of the current state, so the choice sticks.
pub struct GtkTheme {
    settings: Arc<dyn SettingsStore>,
    interface: Arc<dyn SettingsStore>,
    slots: Option<Slots>,
    subscriptions: Vec<Subscription>,
}

impl GtkTheme {
    pub fn new(settings: Arc<dyn SettingsStore>, interface: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            interface,
            slots: None,
            subscriptions: Vec::new(),
        }
    }

    fn apply(&self, state: State) -> Result<()> {
        let Some(theme) = self.slots.as_ref().and_then(|slots| slots.get(state)) else {
            return Ok(());
        };

        let current = self.interface.get_string(INTERFACE_GTK_THEME_KEY).ok();
        if current.as_deref() != Some(theme) {
            self.interface
                .set_string(INTERFACE_GTK_THEME_KEY, theme)
                .context("Failed to set GTK theme")?;
            log_decorated!("GTK theme set to {theme}");
        }
        Ok(())
    }

    fn sync_back(&mut self, state: State) {
        let Some(slots) = self.slots.as_mut() else {
            return;
        };
        let theme = match self.interface.get_string(INTERFACE_GTK_THEME_KEY) {
            Ok(theme) => theme,
            Err(e) => {
                log_warning!("Failed to read GTK theme: {e:#}");
                return;
            }
        };

        match slots.write_back(self.settings.as_ref(), state, &theme) {
            Ok(true) => log_decorated!("Stored {theme} as the {state} GTK theme"),
            Ok(false) => {}
            Err(e) => log_warning!("Failed to store GTK theme: {e:#}"),
        }
    }
}

impl Lifecycle for GtkTheme {
    fn on_enabled(&mut self) -> Result<()> {
        let slots = Slots::read(self.settings.as_ref(), KEY_DAY_THEME, KEY_NIGHT_THEME)?;
        let subscriptions = vec![
            self.settings.subscribe(KEY_DAY_THEME)?,
            self.settings.subscribe(KEY_NIGHT_THEME)?,
            self.interface.subscribe(INTERFACE_GTK_THEME_KEY)?,
        ];

        self.slots = Some(slots);
        self.subscriptions = subscriptions;
        Ok(())
    }

    fn on_disabled(&mut self) {
        self.subscriptions.clear();
        self.slots = None;
    }
}

impl Reaction for GtkTheme {
    fn name(&self) -> &'static str {
        "GTK theme"
    }

    fn on_day(&mut self) -> Result<()> {
        self.apply(State::Day)
    }

    fn on_night(&mut self) -> Result<()> {
        self.apply(State::Night)
    }

    fn on_setting_changed(&mut self, change: &SettingChange, state: State) -> bool {
        if change.source == self.interface.source() && change.key == INTERFACE_GTK_THEME_KEY {
            self.sync_back(state);
            return false;
        }

        if change.source != self.settings.source() {
            return false;
        }
        let Some(slots) = self.slots.as_mut() else {
            return false;
        };
        slots.refresh(self.settings.as_ref(), &change.key) == Some(state)
    }
}
