//! Enable/disable contract shared by providers and reactions.

use anyhow::Result;

/// A component that acquires resources when enabled and releases them when
/// disabled.
///
/// `on_enabled` either succeeds completely or leaves nothing behind:
/// subscriptions are collected locally and only stored once every step
/// succeeded, so an early `?` drops them.
pub trait Lifecycle {
    fn on_enabled(&mut self) -> Result<()>;
    fn on_disabled(&mut self);
}

impl<T: Lifecycle + ?Sized> Lifecycle for Box<T> {
    fn on_enabled(&mut self) -> Result<()> {
        (**self).on_enabled()
    }

    fn on_disabled(&mut self) {
        (**self).on_disabled()
    }
}

/// Wraps a [`Lifecycle`] with an enabled flag.
///
/// Enabling an enabled component and disabling a disabled one are no-ops.
/// A failing `on_enabled` leaves the component disabled.
pub struct Switch<T> {
    inner: T,
    enabled: bool,
}

impl<T: Lifecycle> Switch<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `Ok(true)` if the component transitioned to enabled.
    pub fn enable(&mut self) -> Result<bool> {
        if self.enabled {
            return Ok(false);
        }
        self.inner.on_enabled()?;
        self.enabled = true;
        Ok(true)
    }

    /// Returns `true` if the component transitioned to disabled.
    pub fn disable(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.enabled = false;
        self.inner.on_disabled();
        true
    }

    /// Enable or disable to match `enabled`.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<bool> {
        if enabled {
            self.enable()
        } else {
            Ok(self.disable())
        }
    }

    pub fn get(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        fail: bool,
        enabled_calls: usize,
        disabled_calls: usize,
    }

    impl Lifecycle for Probe {
        fn on_enabled(&mut self) -> Result<()> {
            self.enabled_calls += 1;
            if self.fail {
                anyhow::bail!("settings unavailable");
            }
            Ok(())
        }

        fn on_disabled(&mut self) {
            self.disabled_calls += 1;
        }
    }

    #[test]
    fn test_enable_and_disable_are_idempotent() {
        let mut switch = Switch::new(Probe::default());
        assert!(switch.enable().unwrap());
        assert!(!switch.enable().unwrap());
        assert_eq!(switch.get().enabled_calls, 1);

        assert!(switch.disable());
        assert!(!switch.disable());
        assert_eq!(switch.get().disabled_calls, 1);
    }

    #[test]
    fn test_failed_enable_stays_disabled() {
        let mut switch = Switch::new(Probe {
            fail: true,
            ..Probe::default()
        });
        assert!(switch.enable().is_err());
        assert!(!switch.is_enabled());

        // Nothing to tear down
        assert!(!switch.disable());
        assert_eq!(switch.get().disabled_calls, 0);
    }
}
