//! User commands run when day or night begins.

use anyhow::Result;
use std::sync::Arc;

use super::{Reaction, Slots};
use crate::common::constants::{KEY_DAY_COMMAND, KEY_NIGHT_COMMAND};
use crate::core::lifecycle::Lifecycle;
use crate::core::state::State;
use crate::settings::{SettingChange, SettingsStore, Subscription};

/// Starts commands in the background.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Spawn `command` without waiting for it. Returns `false` if the
    /// process could not be started.
    fn spawn(&self, command: &str) -> bool;
}

/// Runs `day-command`/`night-command`.
///
/// Editing a command only updates the cached text. The new command runs at
/// the next transition, not immediately.
pub struct Commands {
    settings: Arc<dyn SettingsStore>,
    runner: Arc<dyn CommandRunner>,
    slots: Option<Slots>,
    subscriptions: Vec<Subscription>,
}

impl Commands {
    pub fn new(settings: Arc<dyn SettingsStore>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            runner,
            slots: None,
            subscriptions: Vec::new(),
        }
    }

    fn run(&self, state: State) {
        let Some(command) = self.slots.as_ref().and_then(|slots| slots.get(state)) else {
            return;
        };
        let command = command.trim();
        if command.is_empty() {
            return;
        }

        if self.runner.spawn(command) {
            log_decorated!("Started {state} command: {command}");
        } else {
            log_warning!("Failed to start {state} command: {command}");
        }
    }
}

impl Lifecycle for Commands {
    fn on_enabled(&mut self) -> Result<()> {
        let slots = Slots::read(self.settings.as_ref(), KEY_DAY_COMMAND, KEY_NIGHT_COMMAND)?;
        let subscriptions = vec![
            self.settings.subscribe(KEY_DAY_COMMAND)?,
            self.settings.subscribe(KEY_NIGHT_COMMAND)?,
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

impl Reaction for Commands {
    fn name(&self) -> &'static str {
        "Commands"
    }

    // A command that fails to start is not retried
    fn on_day(&mut self) -> Result<()> {
        self.run(State::Day);
        Ok(())
    }

    fn on_night(&mut self) -> Result<()> {
        self.run(State::Night);
        Ok(())
    }

    fn on_setting_changed(&mut self, change: &SettingChange, _state: State) -> bool {
        if change.source == self.settings.source()
            && let Some(slots) = self.slots.as_mut()
        {
            slots.refresh(self.settings.as_ref(), &change.key);
        }
        false
    }
}
