//! Reactors: components that act when day or night begins.
//!
//! Every reactor is a [`Reactor`] wrapping one [`Reaction`]:
//!
//! - [`GtkTheme`]: switches `org.gnome.desktop.interface gtk-theme`
//! - [`ShellTheme`]: switches the User Themes extension's shell theme
//! - [`Commands`]: runs a user command through `/bin/sh -c`
//!
//! The wrapper owns the enabled flag and the last applied [`State`], and
//! guarantees each transition reaches the reaction at most once. A disabled
//! reactor is always in `State::Unknown` and ignores state assignments.

pub mod commands;
pub mod gtk;
pub mod shell;

use anyhow::{Context, Result};

use crate::core::lifecycle::{Lifecycle, Switch};
use crate::core::state::State;
use crate::settings::{SettingChange, SettingsStore};

pub use commands::{CommandRunner, Commands};
pub use gtk::GtkTheme;
pub use shell::{CompanionLocator, Readiness, ShellTheme};

/// The behaviour behind a reactor.
pub trait Reaction: Lifecycle {
    fn name(&self) -> &'static str;

    /// Day began. An error leaves the reactor in `Unknown` so the next tick
    /// tries again.
    fn on_day(&mut self) -> Result<()>;

    /// Night began.
    fn on_night(&mut self) -> Result<()>;

    /// Handle a change notification while enabled.
    ///
    /// `state` is the reactor's current state. Returns `true` if the
    /// reactor must forget it and apply again on the next tick.
    fn on_setting_changed(&mut self, change: &SettingChange, state: State) -> bool;
}

pub struct Reactor {
    reaction: Switch<Box<dyn Reaction>>,
    state: State,
}

impl Reactor {
    pub fn new(reaction: Box<dyn Reaction>) -> Self {
        Self {
            reaction: Switch::new(reaction),
            state: State::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        self.reaction.get().name()
    }

    pub fn is_enabled(&self) -> bool {
        self.reaction.is_enabled()
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Enable the reaction. A failure leaves the reactor disabled.
    pub fn enable(&mut self) -> Result<bool> {
        self.reaction
            .enable()
            .with_context(|| format!("Failed to enable {}", self.name()))
    }

    /// Disable the reaction and reset the state to `Unknown`.
    pub fn disable(&mut self) -> bool {
        let changed = self.reaction.disable();
        self.state = State::Unknown;
        changed
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<bool> {
        if enabled {
            self.enable()
        } else {
            Ok(self.disable())
        }
    }

    /// Assign `state`.
    ///
    /// Does nothing while disabled or if `state` is already current.
    /// Otherwise stores the state, then runs the matching callback. Returns
    /// `true` if a callback ran.
    pub fn set_state(&mut self, state: State) -> bool {
        if !self.is_enabled() || state == self.state {
            return false;
        }

        self.state = state;
        let reaction = self.reaction.get_mut();
        let result = match state {
            State::Day => reaction.on_day(),
            State::Night => reaction.on_night(),
            State::Unknown => return false,
        };

        if let Err(e) = result {
            log_warning!("{} failed to apply {} state: {e:#}", self.name(), state);
            self.state = State::Unknown;
        }
        true
    }

    /// Forget the current state so the next assignment applies again.
    pub fn invalidate(&mut self) {
        self.state = State::Unknown;
    }

    /// Forward a change notification. Returns `true` if the state was reset.
    pub fn on_setting_changed(&mut self, change: &SettingChange) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let state = self.state;
        if self.reaction.get_mut().on_setting_changed(change, state) {
            self.state = State::Unknown;
            return true;
        }
        false
    }
}

/// A day/night pair of values cached from two settings keys.
pub(crate) struct Slots {
    day_key: &'static str,
    night_key: &'static str,
    pub day: String,
    pub night: String,
}

impl Slots {
    pub fn read(settings: &dyn SettingsStore, day_key: &'static str, night_key: &'static str) -> Result<Self> {
        Ok(Self {
            day_key,
            night_key,
            day: settings.get_string(day_key)?,
            night: settings.get_string(night_key)?,
        })
    }

    pub fn keys(&self) -> [&'static str; 2] {
        [self.day_key, self.night_key]
    }

    pub fn get(&self, state: State) -> Option<&str> {
        match state {
            State::Day => Some(&self.day),
            State::Night => Some(&self.night),
            State::Unknown => None,
        }
    }

    /// Re-read the slot stored under `key`.
    ///
    /// Returns the state whose value actually changed, if any.
    pub fn refresh(&mut self, settings: &dyn SettingsStore, key: &str) -> Option<State> {
        let (state, slot) = if key == self.day_key {
            (State::Day, &mut self.day)
        } else if key == self.night_key {
            (State::Night, &mut self.night)
        } else {
            return None;
        };

        match settings.get_string(key) {
            Ok(value) if value != *slot => {
                *slot = value;
                Some(state)
            }
            Ok(_) => None,
            Err(e) => {
                log_warning!("Failed to read {key}: {e:#}");
                None
            }
        }
    }

    /// Store `value` into the slot of `state`, in the cache and in `settings`.
    ///
    /// Nothing is written while `state` is `Unknown` or if the slot already
    /// holds `value`.
    pub fn write_back(&mut self, settings: &dyn SettingsStore, state: State, value: &str) -> Result<bool> {
        let (key, slot) = match state {
            State::Day => (self.day_key, &mut self.day),
            State::Night => (self.night_key, &mut self.night),
            State::Unknown => return Ok(false),
        };
        if slot == value {
            return Ok(false);
        }

        *slot = value.to_string();
        settings.set_string(key, value)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Calls {
        day: usize,
        night: usize,
        fail: bool,
    }

    struct Recorder(Rc<RefCell<Calls>>);

    impl Lifecycle for Recorder {
        fn on_enabled(&mut self) -> Result<()> {
            Ok(())
        }

        fn on_disabled(&mut self) {}
    }

    impl Reaction for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn on_day(&mut self) -> Result<()> {
            let mut calls = self.0.borrow_mut();
            calls.day += 1;
            if calls.fail {
                anyhow::bail!("unavailable");
            }
            Ok(())
        }

        fn on_night(&mut self) -> Result<()> {
            self.0.borrow_mut().night += 1;
            Ok(())
        }

        fn on_setting_changed(&mut self, _change: &SettingChange, _state: State) -> bool {
            false
        }
    }

    fn reactor() -> (Reactor, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        (Reactor::new(Box::new(Recorder(calls.clone()))), calls)
    }

    #[test]
    fn test_state_assignment_is_idempotent() {
        let (mut reactor, calls) = reactor();
        reactor.enable().unwrap();

        assert!(reactor.set_state(State::Day));
        assert!(!reactor.set_state(State::Day));
        assert!(reactor.set_state(State::Night));
        assert_eq!(calls.borrow().day, 1);
        assert_eq!(calls.borrow().night, 1);
        assert_eq!(reactor.state(), State::Night);
    }

    #[test]
    fn test_disabled_reactor_ignores_states() {
        let (mut reactor, calls) = reactor();
        assert!(!reactor.set_state(State::Night));
        assert_eq!(reactor.state(), State::Unknown);
        assert_eq!(calls.borrow().night, 0);
    }

    #[test]
    fn test_disable_resets_and_reenable_fires_again() {
        let (mut reactor, calls) = reactor();
        reactor.enable().unwrap();
        reactor.set_state(State::Night);

        assert!(reactor.disable());
        assert_eq!(reactor.state(), State::Unknown);

        reactor.enable().unwrap();
        reactor.set_state(State::Night);
        assert_eq!(calls.borrow().night, 2);
    }

    #[test]
    fn test_unknown_never_calls_back() {
        let (mut reactor, calls) = reactor();
        reactor.enable().unwrap();
        reactor.set_state(State::Day);
        assert!(!reactor.set_state(State::Unknown));
        assert_eq!(reactor.state(), State::Unknown);
        assert_eq!(calls.borrow().day, 1);
    }

    #[test]
    fn test_failed_callback_retries_next_time() {
        let (mut reactor, calls) = reactor();
        reactor.enable().unwrap();
        calls.borrow_mut().fail = true;

        reactor.set_state(State::Day);
        assert_eq!(reactor.state(), State::Unknown);

        calls.borrow_mut().fail = false;
        reactor.set_state(State::Day);
        assert_eq!(reactor.state(), State::Day);
        assert_eq!(calls.borrow().day, 2);
    }
}
