//! Periodic day/night evaluation.
//!
//! The time check owns the clock and the `time-check-period` subscription.
//! It borrows the window provider and the reactors on every call instead of
//! owning them, so the assembly can swap the provider between ticks.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::constants::{KEY_TIME_CHECK_PERIOD, MINIMUM_TIME_CHECK_PERIOD};
use crate::core::clock::Clock;
use crate::core::state::State;
use crate::nighttime::WindowProvider;
use crate::reactors::Reactor;
use crate::settings::{SettingChange, SettingsStore, Subscription};

pub struct TimeCheck {
    settings: Arc<dyn SettingsStore>,
    clock: Clock,
    subscription: Option<Subscription>,
}

impl TimeCheck {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            clock: Clock::new(),
            subscription: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    fn read_period(&self) -> Result<Duration> {
        let millis = self
            .settings
            .get_uint(KEY_TIME_CHECK_PERIOD)
            .context("Failed to read the time check period")?;
        Ok(Duration::from_millis(u64::from(
            millis.max(MINIMUM_TIME_CHECK_PERIOD),
        )))
    }

    /// Apply the current state once, then check every period.
    pub fn enable(
        &mut self,
        now: Instant,
        time: &DateTime<Local>,
        provider: &dyn WindowProvider,
        reactors: &mut [Reactor],
    ) -> Result<()> {
        if self.is_enabled() {
            return Ok(());
        }

        let period = self.read_period()?;
        let subscription = self.settings.subscribe(KEY_TIME_CHECK_PERIOD)?;

        self.apply_current_state(time, provider, reactors);
        self.clock.start(now, period);
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Stop checking. Reactors keep their current state.
    pub fn disable(&mut self) {
        self.clock.stop();
        self.subscription = None;
    }

    /// Evaluate the window at `time` and push the result to every reactor.
    pub fn apply_current_state(
        &self,
        time: &DateTime<Local>,
        provider: &dyn WindowProvider,
        reactors: &mut [Reactor],
    ) -> State {
        let state = State::from_nighttime(provider.is_nighttime(time));
        for reactor in reactors.iter_mut() {
            reactor.set_state(state);
        }
        state
    }

    /// Run the check if the clock is due. Returns the evaluated state.
    pub fn tick(
        &mut self,
        now: Instant,
        time: &DateTime<Local>,
        provider: &dyn WindowProvider,
        reactors: &mut [Reactor],
    ) -> Option<State> {
        if !self.clock.fire(now) {
            return None;
        }
        Some(self.apply_current_state(time, provider, reactors))
    }

    /// Restart the clock when the period changes.
    ///
    /// Returns `true` if the change concerned the time check.
    pub fn on_setting_changed(&mut self, change: &SettingChange, now: Instant) -> bool {
        if !self.subscription.as_ref().is_some_and(|s| s.matches(change)) {
            return false;
        }

        match self.read_period() {
            Ok(period) => {
                self.clock.restart(now, period);
                log_decorated!("Checking the time every {} ms", period.as_millis());
            }
            Err(e) => log_warning!("Keeping the previous time check period: {e:#}"),
        }
        true
    }

    /// How long the main loop may wait before the next check.
    pub fn time_until(&self, now: Instant) -> Option<Duration> {
        self.clock.time_until(now)
    }
}
