//! GNOME Shell theme switching through the User Themes extension.
//!
//! User Themes stores the shell theme in its own schema, shipped inside the
//! extension directory. The extension may be missing, disabled, or not yet
//! loaded when nightfall starts, so the reaction never requires it: while
//! the companion settings cannot be located, enabling still succeeds, and
//! every day/night callback looks for them again.

use anyhow::{Context, Result};
use std::sync::Arc;

use super::{Reaction, Slots};
use crate::common::constants::{
    DEFAULT_DAY_SHELL, DEFAULT_NIGHT_SHELL, KEY_DAY_SHELL, KEY_NIGHT_SHELL, USER_THEMES_NAME_KEY,
};
use crate::core::lifecycle::Lifecycle;
use crate::core::state::State;
use crate::settings::{SettingChange, SettingsStore, Subscription};

/// Finds the settings of the User Themes extension.
pub trait CompanionLocator {
    /// `None` while the extension is not installed or not reachable.
    fn locate(&self) -> Option<Arc<dyn SettingsStore>>;
}

/// Announces when the shell is ready to be asked for extensions.
///
/// `request` returns immediately; readiness is delivered later as a
/// `SignalMessage::CompanionReady` on the main loop.
pub trait Readiness {
    fn request(&self);
}

struct Companion {
    settings: Arc<dyn SettingsStore>,
    _subscription: Subscription,
}

pub struct ShellTheme {
    settings: Arc<dyn SettingsStore>,
    locator: Arc<dyn CompanionLocator>,
    first_time: bool,
    slots: Option<Slots>,
    subscriptions: Vec<Subscription>,
    companion: Option<Companion>,
}

impl ShellTheme {
    /// `first_time` requests the one-time import of the current shell theme
    /// into both slots.
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        locator: Arc<dyn CompanionLocator>,
        first_time: bool,
    ) -> Self {
        Self {
            settings,
            locator,
            first_time,
            slots: None,
            subscriptions: Vec::new(),
            companion: None,
        }
    }

    /// The companion settings, locating them if not known yet.
    fn companion(&mut self) -> Option<Arc<dyn SettingsStore>> {
        if let Some(companion) = &self.companion {
            return Some(companion.settings.clone());
        }

        let settings = self.locator.locate()?;
        let subscription = match settings.subscribe(USER_THEMES_NAME_KEY) {
            Ok(subscription) => subscription,
            Err(e) => {
                log_warning!("Failed to watch the shell theme: {e:#}");
                return None;
            }
        };
        log_decorated!("User Themes extension found");

        if self.first_time {
            self.first_time = false;
            if let Err(e) = self.import_current_theme(settings.as_ref()) {
                log_warning!("Failed to import the current shell theme: {e:#}");
            }
        }

        self.companion = Some(Companion {
            settings: settings.clone(),
            _subscription: subscription,
        });
        Some(settings)
    }

    /// Seed both slots with the current shell theme if both are untouched.
    fn import_current_theme(&mut self, companion: &dyn SettingsStore) -> Result<()> {
        let Some(slots) = self.slots.as_mut() else {
            return Ok(());
        };
        if slots.day != DEFAULT_DAY_SHELL || slots.night != DEFAULT_NIGHT_SHELL {
            return Ok(());
        }

        let current = companion.get_string(USER_THEMES_NAME_KEY)?;
        slots.write_back(self.settings.as_ref(), State::Day, &current)?;
        slots.write_back(self.settings.as_ref(), State::Night, &current)?;
        log_decorated!("Using shell theme \"{current}\" for day and night");
        Ok(())
    }

    fn apply(&mut self, state: State) -> Result<()> {
        let companion = self
            .companion()
            .context("User Themes extension is not available")?;
        let Some(theme) = self.slots.as_ref().and_then(|slots| slots.get(state)) else {
            return Ok(());
        };

        let current = companion.get_string(USER_THEMES_NAME_KEY).ok();
        if current.as_deref() != Some(theme) {
            companion
                .set_string(USER_THEMES_NAME_KEY, theme)
                .context("Failed to set shell theme")?;
            log_decorated!("Shell theme set to {}", display_name(theme));
        }
        Ok(())
    }

    fn sync_back(&mut self, state: State) {
        let Some(companion) = self.companion.as_ref().map(|c| c.settings.clone()) else {
            return;
        };
        let Some(slots) = self.slots.as_mut() else {
            return;
        };
        let theme = match companion.get_string(USER_THEMES_NAME_KEY) {
            Ok(theme) => theme,
            Err(e) => {
                log_warning!("Failed to read shell theme: {e:#}");
                return;
            }
        };

        match slots.write_back(self.settings.as_ref(), state, &theme) {
            Ok(true) => log_decorated!("Stored {} as the {state} shell theme", display_name(&theme)),
            Ok(false) => {}
            Err(e) => log_warning!("Failed to store shell theme: {e:#}"),
        }
    }
}

/// User Themes uses the empty name for the default shell theme.
fn display_name(theme: &str) -> &str {
    if theme.is_empty() { "Default" } else { theme }
}

impl Lifecycle for ShellTheme {
    fn on_enabled(&mut self) -> Result<()> {
        let slots = Slots::read(self.settings.as_ref(), KEY_DAY_SHELL, KEY_NIGHT_SHELL)?;
        let subscriptions = slots
            .keys()
            .iter()
            .map(|key| self.settings.subscribe(key))
            .collect::<Result<Vec<_>>>()?;

        self.slots = Some(slots);
        self.subscriptions = subscriptions;

        if self.companion().is_none() {
            log_warning!("User Themes extension not found, shell theme switching is paused");
        }
        Ok(())
    }

    fn on_disabled(&mut self) {
        self.companion = None;
        self.subscriptions.clear();
        self.slots = None;
    }
}

impl Reaction for ShellTheme {
    fn name(&self) -> &'static str {
        "Shell theme"
    }

    fn on_day(&mut self) -> Result<()> {
        self.apply(State::Day)
    }

    fn on_night(&mut self) -> Result<()> {
        self.apply(State::Night)
    }

    fn on_setting_changed(&mut self, change: &SettingChange, state: State) -> bool {
        if let Some(companion) = &self.companion
            && change.source == companion.settings.source()
            && change.key == USER_THEMES_NAME_KEY
        {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactors::Reactor;
    use crate::settings::{MemoryStore, SettingValue, SettingsHub, SettingsSource};
    use std::sync::Mutex;

    /// Hands out the companion store once it was "installed".
    #[derive(Default)]
    struct FakeLocator {
        store: Mutex<Option<Arc<MemoryStore>>>,
        lookups: Mutex<usize>,
    }

    impl FakeLocator {
        fn install(&self, store: Arc<MemoryStore>) {
            *self.store.lock().unwrap() = Some(store);
        }

        fn lookups(&self) -> usize {
            *self.lookups.lock().unwrap()
        }
    }

    impl CompanionLocator for FakeLocator {
        fn locate(&self) -> Option<Arc<dyn SettingsStore>> {
            *self.lookups.lock().unwrap() += 1;
            self.store
                .lock()
                .unwrap()
                .clone()
                .map(|store| store as Arc<dyn SettingsStore>)
        }
    }

    fn settings(hub: &SettingsHub, day: &str, night: &str) -> Arc<MemoryStore> {
        Arc::new(
            MemoryStore::new(SettingsSource::Extension, hub.clone())
                .with(KEY_DAY_SHELL, SettingValue::String(day.into()))
                .with(KEY_NIGHT_SHELL, SettingValue::String(night.into())),
        )
    }

    fn user_themes(hub: &SettingsHub, name: &str) -> Arc<MemoryStore> {
        Arc::new(
            MemoryStore::new(SettingsSource::UserThemes, hub.clone())
                .with(USER_THEMES_NAME_KEY, SettingValue::String(name.into())),
        )
    }

    #[test]
    fn test_missing_companion_is_retried_on_every_call() {
        let hub = SettingsHub::detached();
        let locator = Arc::new(FakeLocator::default());
        let settings = settings(&hub, "Light", "Dark");
        let mut reactor = Reactor::new(Box::new(ShellTheme::new(settings, locator.clone(), false)));

        reactor.enable().unwrap();
        assert!(reactor.is_enabled());
        assert_eq!(locator.lookups(), 1);

        reactor.set_state(State::Night);
        assert_eq!(reactor.state(), State::Unknown);
        assert_eq!(locator.lookups(), 2);

        let companion = user_themes(&hub, "");
        locator.install(companion.clone());
        reactor.set_state(State::Night);
        assert_eq!(reactor.state(), State::Night);
        assert_eq!(companion.get_string(USER_THEMES_NAME_KEY).unwrap(), "Dark");
        assert_eq!(locator.lookups(), 3);

        // Found once, never looked up again
        reactor.set_state(State::Day);
        assert_eq!(locator.lookups(), 3);
    }

    #[test]
    fn test_first_time_setup_imports_current_theme() {
        let hub = SettingsHub::detached();
        let locator = Arc::new(FakeLocator::default());
        locator.install(user_themes(&hub, "Nordic"));
        let settings = settings(&hub, DEFAULT_DAY_SHELL, DEFAULT_NIGHT_SHELL);

        let mut reactor = Reactor::new(Box::new(ShellTheme::new(settings.clone(), locator, true)));
        reactor.enable().unwrap();

        assert_eq!(settings.get_string(KEY_DAY_SHELL).unwrap(), "Nordic");
        assert_eq!(settings.get_string(KEY_NIGHT_SHELL).unwrap(), "Nordic");
    }

    #[test]
    fn test_first_time_setup_keeps_configured_slots() {
        let hub = SettingsHub::detached();
        let locator = Arc::new(FakeLocator::default());
        locator.install(user_themes(&hub, "Nordic"));
        let settings = settings(&hub, "Light", DEFAULT_NIGHT_SHELL);

        let mut reactor = Reactor::new(Box::new(ShellTheme::new(settings.clone(), locator, true)));
        reactor.enable().unwrap();

        assert_eq!(settings.get_string(KEY_DAY_SHELL).unwrap(), "Light");
        assert_eq!(settings.write_count(KEY_NIGHT_SHELL), 0);
    }

    #[test]
    fn test_external_name_change_is_written_back() {
        let hub = SettingsHub::detached();
        let locator = Arc::new(FakeLocator::default());
        let companion = user_themes(&hub, "Light");
        locator.install(companion.clone());
        let settings = settings(&hub, "Light", "Dark");

        let mut reactor = Reactor::new(Box::new(ShellTheme::new(settings.clone(), locator, false)));
        reactor.enable().unwrap();
        reactor.set_state(State::Day);
        assert_eq!(companion.write_count(USER_THEMES_NAME_KEY), 0);

        companion.set_string(USER_THEMES_NAME_KEY, "Orchis").unwrap();
        reactor.on_setting_changed(&SettingChange::new(SettingsSource::UserThemes, USER_THEMES_NAME_KEY));

        assert_eq!(settings.get_string(KEY_DAY_SHELL).unwrap(), "Orchis");
        assert_eq!(settings.get_string(KEY_NIGHT_SHELL).unwrap(), "Dark");
        assert_eq!(reactor.state(), State::Day);
    }

    #[test]
    fn test_disable_releases_companion_subscription() {
        let hub = SettingsHub::detached();
        let locator = Arc::new(FakeLocator::default());
        locator.install(user_themes(&hub, "Light"));
        let mut reactor = Reactor::new(Box::new(ShellTheme::new(
            settings(&hub, "Light", "Dark"),
            locator,
            false,
        )));

        reactor.enable().unwrap();
        assert!(hub.is_subscribed(SettingsSource::UserThemes, USER_THEMES_NAME_KEY));
        assert_eq!(hub.subscription_count(), 3);

        reactor.disable();
        assert_eq!(hub.subscription_count(), 0);
    }
}
