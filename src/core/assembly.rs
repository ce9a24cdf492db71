//! The extension assembly: one provider, one time check, the reactors.
//!
//! Exactly one assembly exists per daemon. `Core` creates it, enables it at
//! startup, feeds it every message of the main loop and disables it on
//! shutdown. Nothing else holds a reference to it.

use anyhow::Result;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::constants::*;
use crate::core::time_check::TimeCheck;
use crate::core::window::TimeWindow;
use crate::nighttime::{ManualWindow, NightLightWindow, WindowProvider};
use crate::reactors::{
    CommandRunner, Commands, CompanionLocator, GtkTheme, Reactor, Readiness, ShellTheme,
};
use crate::settings::{SettingChange, SettingsStore, Subscription};

const GTK: usize = 0;
const SHELL: usize = 1;
const COMMANDS: usize = 2;

/// Everything the assembly talks to outside of its own state.
#[derive(Clone)]
pub struct Collaborators {
    /// nightfall's own settings
    pub settings: Arc<dyn SettingsStore>,
    /// `org.gnome.desktop.interface`
    pub interface: Arc<dyn SettingsStore>,
    /// `org.gnome.settings-daemon.plugins.color`
    pub night_light: Arc<dyn SettingsStore>,
    pub companion: Arc<dyn CompanionLocator>,
    pub readiness: Arc<dyn Readiness>,
    pub runner: Arc<dyn CommandRunner>,
}

pub struct Assembly {
    collaborators: Collaborators,
    provider: Option<Box<dyn WindowProvider>>,
    time_check: TimeCheck,
    /// GTK, shell, commands; in this order
    reactors: Vec<Reactor>,
    subscriptions: Vec<Subscription>,
    enabled: bool,
    debug_enabled: bool,
}

impl Assembly {
    pub fn new(collaborators: Collaborators, debug_enabled: bool) -> Self {
        let time_check = TimeCheck::new(collaborators.settings.clone());
        Self {
            collaborators,
            provider: None,
            time_check,
            reactors: Vec::new(),
            subscriptions: Vec::new(),
            enabled: false,
            debug_enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.name())
    }

    pub fn window(&self) -> Option<TimeWindow> {
        self.provider.as_ref().and_then(|p| p.window())
    }

    pub fn reactors(&self) -> &[Reactor] {
        &self.reactors
    }

    pub fn time_check(&self) -> &TimeCheck {
        &self.time_check
    }

    fn settings(&self) -> &dyn SettingsStore {
        self.collaborators.settings.as_ref()
    }

    fn flag(&self, key: &str) -> bool {
        match self.settings().get_boolean(key) {
            Ok(value) => value,
            Err(e) => {
                log_warning!("Failed to read {key}: {e:#}");
                false
            }
        }
    }

    fn make_provider(&self, from_night_light: bool) -> Box<dyn WindowProvider> {
        if from_night_light {
            Box::new(NightLightWindow::new(self.collaborators.night_light.clone()))
        } else {
            Box::new(ManualWindow::new(self.collaborators.settings.clone()))
        }
    }

    /// Enable the requested provider, falling back to the manual window if
    /// the Night Light schedule cannot be read.
    fn start_provider(&self, from_night_light: bool) -> Result<Box<dyn WindowProvider>> {
        let mut provider = self.make_provider(from_night_light);
        match provider.on_enabled() {
            Ok(()) => Ok(provider),
            Err(e) if from_night_light => {
                log_warning!("Night Light schedule unavailable: {e:#}");
                log_indented!("Using the manual nighttime window instead");
                let mut manual = self.make_provider(false);
                manual.on_enabled()?;
                Ok(manual)
            }
            Err(e) => Err(e),
        }
    }

    /// Bring every part up and apply the current state.
    pub fn enable(&mut self, now: Instant, time: &DateTime<Local>) -> Result<()> {
        if self.enabled {
            return Ok(());
        }

        let first_time = self.flag(KEY_FIRST_TIME_USER);
        if first_time && let Err(e) = self.settings().set_boolean(KEY_FIRST_TIME_USER, false) {
            log_warning!("Failed to clear {KEY_FIRST_TIME_USER}: {e:#}");
        }

        let subscriptions = vec![
            self.settings().subscribe(KEY_COMMANDS_ENABLED)?,
            self.settings().subscribe(KEY_SHELL_ENABLED)?,
            self.settings().subscribe(KEY_NIGHTTIME_FROM_NIGHT_LIGHT)?,
        ];
        let provider = self.start_provider(self.flag(KEY_NIGHTTIME_FROM_NIGHT_LIGHT))?;

        let c = &self.collaborators;
        let mut reactors = vec![
            Reactor::new(Box::new(GtkTheme::new(c.settings.clone(), c.interface.clone()))),
            Reactor::new(Box::new(ShellTheme::new(
                c.settings.clone(),
                c.companion.clone(),
                first_time,
            ))),
            Reactor::new(Box::new(Commands::new(c.settings.clone(), c.runner.clone()))),
        ];

        if let Err(e) = reactors[GTK].enable() {
            log_warning!("{e:#}");
        }
        if let Err(e) = reactors[COMMANDS].set_enabled(self.flag(KEY_COMMANDS_ENABLED)) {
            log_warning!("{e:#}");
        }

        if let Err(e) = self
            .time_check
            .enable(now, time, provider.as_ref(), &mut reactors)
        {
            for reactor in reactors.iter_mut().rev() {
                reactor.disable();
            }
            let mut provider = provider;
            provider.on_disabled();
            return Err(e);
        }

        if self.debug_enabled {
            log_debug!("Nighttime window provider: {}", provider.name());
        }
        self.provider = Some(provider);
        self.reactors = reactors;
        self.subscriptions = subscriptions;
        self.enabled = true;

        // The shell reactor waits for the shell to come up
        if self.flag(KEY_SHELL_ENABLED) {
            self.collaborators.readiness.request();
        }
        Ok(())
    }

    /// Tear everything down. Reactors end in `Unknown`.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;

        self.time_check.disable();
        self.subscriptions.clear();
        for reactor in self.reactors.iter_mut().rev() {
            reactor.disable();
        }
        self.reactors.clear();
        if let Some(mut provider) = self.provider.take() {
            provider.on_disabled();
        }
    }

    /// The shell became reachable after a readiness request.
    pub fn companion_ready(&mut self, time: &DateTime<Local>) {
        if !self.enabled || !self.flag(KEY_SHELL_ENABLED) {
            return;
        }

        match self.reactors[SHELL].enable() {
            Ok(true) => {
                if self.debug_enabled {
                    log_debug!("Shell theme reactor enabled");
                }
                self.apply(time);
            }
            Ok(false) => {}
            Err(e) => log_warning!("{e:#}"),
        }
    }

    /// Replace the provider. The old one keeps serving if the new one fails.
    fn swap_provider(&mut self, from_night_light: bool) {
        let wanted = if from_night_light { "night-light" } else { "manual" };
        if self.provider_name() == Some(wanted) {
            return;
        }

        let mut provider = self.make_provider(from_night_light);
        if let Err(e) = provider.on_enabled() {
            log_warning!("Keeping the current nighttime window: {e:#}");
            return;
        }

        if let Some(mut old) = self.provider.replace(provider) {
            old.on_disabled();
        }
        log_decorated!("Nighttime window now follows the {wanted} schedule");
    }

    /// Route a settings change to whoever subscribed to it.
    pub fn handle_setting_changed(&mut self, change: &SettingChange, now: Instant) {
        if !self.enabled {
            return;
        }

        if self.subscriptions.iter().any(|s| s.matches(change)) {
            let value = self.flag(&change.key);
            match change.key.as_str() {
                KEY_COMMANDS_ENABLED => {
                    if let Err(e) = self.reactors[COMMANDS].set_enabled(value) {
                        log_warning!("{e:#}");
                    }
                }
                KEY_SHELL_ENABLED if value => self.collaborators.readiness.request(),
                KEY_SHELL_ENABLED => {
                    self.reactors[SHELL].disable();
                }
                KEY_NIGHTTIME_FROM_NIGHT_LIGHT => self.swap_provider(value),
                _ => {}
            }
            return;
        }

        if let Some(provider) = self.provider.as_mut() {
            provider.on_setting_changed(change);
        }
        self.time_check.on_setting_changed(change, now);
        for reactor in &mut self.reactors {
            if reactor.on_setting_changed(change) && self.debug_enabled {
                log_debug!("{} will be applied again", reactor.name());
            }
        }
    }

    /// Apply the current state now.
    pub fn apply(&mut self, time: &DateTime<Local>) {
        if let Some(provider) = &self.provider {
            self.time_check
                .apply_current_state(time, provider.as_ref(), &mut self.reactors);
        }
    }

    /// Forget what was applied and apply the current state again.
    pub fn reapply(&mut self, time: &DateTime<Local>) {
        if !self.enabled {
            return;
        }
        for reactor in &mut self.reactors {
            reactor.invalidate();
        }
        self.apply(time);
    }

    /// Run the periodic check if it is due.
    pub fn tick(&mut self, now: Instant, time: &DateTime<Local>) {
        if let Some(provider) = &self.provider {
            self.time_check
                .tick(now, time, provider.as_ref(), &mut self.reactors);
        }
    }

    /// How long the main loop may sleep before the next tick.
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        self.time_check.time_until(now)
    }
}

impl Drop for Assembly {
    fn drop(&mut self) {
        self.disable();
    }
}
