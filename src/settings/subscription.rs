//! Subscription bookkeeping shared by all settings stores.
//!
//! The hub counts live [`Subscription`] handles per `(source, key)` and only
//! forwards a change into the main loop when somebody still listens. Handles
//! unregister themselves on drop, so a component that is disabled (or fails
//! half way through its setup) can never leak a listener.

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use super::{SettingChange, SettingsSource};
use crate::io::signals::SignalMessage;

#[derive(Default)]
struct Registry {
    live: HashMap<(SettingsSource, String), usize>,
}

/// Routes change notifications from stores to the main loop.
#[derive(Clone)]
pub struct SettingsHub {
    registry: Arc<Mutex<Registry>>,
    sender: Option<Sender<SignalMessage>>,
}

impl SettingsHub {
    /// Create a hub delivering changes as `SignalMessage::SettingChanged`.
    pub fn new(sender: Sender<SignalMessage>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            sender: Some(sender),
        }
    }

    /// Create a hub that tracks subscriptions but delivers nothing.
    ///
    /// Used by one-shot commands that read settings without a main loop.
    pub fn detached() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            sender: None,
        }
    }

    /// Register interest in `key` of `source`.
    pub fn subscribe(&self, source: SettingsSource, key: &str) -> Subscription {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        *registry.live.entry((source, key.to_string())).or_insert(0) += 1;

        Subscription {
            source,
            key: key.to_string(),
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Whether at least one live subscription exists for `key` of `source`.
    pub fn is_subscribed(&self, source: SettingsSource, key: &str) -> bool {
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry
            .live
            .get(&(source, key.to_string()))
            .is_some_and(|count| *count > 0)
    }

    /// Total number of live subscriptions across all stores.
    pub fn subscription_count(&self) -> usize {
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.live.values().sum()
    }

    /// Report that `key` of `source` changed.
    ///
    /// Returns `true` if the change was forwarded to the main loop.
    pub fn notify(&self, source: SettingsSource, key: &str) -> bool {
        if !self.is_subscribed(source, key) {
            return false;
        }

        match &self.sender {
            Some(sender) => sender
                .send(SignalMessage::SettingChanged(SettingChange::new(source, key)))
                .is_ok(),
            None => false,
        }
    }
}

/// A live interest in one settings key. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    source: SettingsSource,
    key: String,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn source(&self) -> SettingsSource {
        self.source
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether `change` is a notification for this subscription.
    pub fn matches(&self, change: &SettingChange) -> bool {
        self.source == change.source && self.key == change.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = (self.source, std::mem::take(&mut self.key));
        if let Some(count) = registry.live.get_mut(&slot) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                registry.live.remove(&slot);
            }
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("live", &self.live.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_notify_requires_live_subscription() {
        let (tx, rx) = channel();
        let hub = SettingsHub::new(tx);

        assert!(!hub.notify(SettingsSource::Extension, "day-theme"));

        let subscription = hub.subscribe(SettingsSource::Extension, "day-theme");
        assert!(hub.notify(SettingsSource::Extension, "day-theme"));
        match rx.try_recv() {
            Ok(SignalMessage::SettingChanged(change)) => assert!(subscription.matches(&change)),
            other => panic!("unexpected message: {other:?}"),
        }

        drop(subscription);
        assert!(!hub.notify(SettingsSource::Extension, "day-theme"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_drop_releases_only_own_slot() {
        let hub = SettingsHub::detached();
        let first = hub.subscribe(SettingsSource::Interface, "gtk-theme");
        let second = hub.subscribe(SettingsSource::Interface, "gtk-theme");
        assert_eq!(hub.subscription_count(), 2);

        drop(first);
        assert!(hub.is_subscribed(SettingsSource::Interface, "gtk-theme"));
        drop(second);
        assert!(!hub.is_subscribed(SettingsSource::Interface, "gtk-theme"));
        assert_eq!(hub.subscription_count(), 0);
    }

    #[test]
    fn test_matches_checks_source_and_key() {
        let hub = SettingsHub::detached();
        let subscription = hub.subscribe(SettingsSource::Extension, "day-shell");

        assert!(subscription.matches(&SettingChange::new(SettingsSource::Extension, "day-shell")));
        assert!(!subscription.matches(&SettingChange::new(SettingsSource::UserThemes, "day-shell")));
        assert!(!subscription.matches(&SettingChange::new(SettingsSource::Extension, "night-shell")));
    }
}
