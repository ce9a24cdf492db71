//! File watching module for hot config reloading.
//!
//! The watcher observes the directory holding `nightfall.toml` (editors and
//! the daemon's own writes replace the file rather than modifying it in
//! place) and sends `SignalMessage::Reload` once the file has been quiet for
//! the debounce interval.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::common::constants::CONFIG_WATCH_DEBOUNCE_MS;
use crate::common::utils::private_path;
use crate::io::signals::SignalMessage;

/// Configuration file watcher that monitors for changes and triggers reloads.
pub struct ConfigWatcher {
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
    config_path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(
        config_path: PathBuf,
        signal_sender: Sender<SignalMessage>,
        debug_enabled: bool,
    ) -> Self {
        Self {
            signal_sender,
            debug_enabled,
            config_path,
        }
    }

    /// Start watching the configuration file for changes.
    ///
    /// Spawns a background thread owning the `notify` watcher; the thread
    /// exits when the main loop's receiver is dropped.
    pub fn start(self) -> Result<()> {
        let dir = self
            .config_path
            .parent()
            .context("Config path has no parent directory")?
            .to_path_buf();

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Starting config file watcher for hot reload");
            log_indented!("Watching: {}", private_path(&self.config_path));
        }

        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", private_path(&dir)))?;

        thread::Builder::new()
            .name("config-watcher".to_string())
            .spawn(move || {
                let _watcher = watcher;
                watch_loop(
                    &rx,
                    &self.config_path,
                    &self.signal_sender,
                    self.debug_enabled,
                );
            })
            .context("Failed to spawn config watcher thread")?;

        Ok(())
    }
}

fn watch_loop(
    rx: &Receiver<Event>,
    config_path: &Path,
    signal_sender: &Sender<SignalMessage>,
    debug_enabled: bool,
) {
    let debounce = Duration::from_millis(CONFIG_WATCH_DEBOUNCE_MS);

    while let Ok(event) = rx.recv() {
        if !affects_config(&event, config_path) {
            continue;
        }

        // Wait until the file stops changing.
        loop {
            match rx.recv_timeout(debounce) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }

        if debug_enabled {
            log_pipe!();
            log_debug!("Configuration file change detected");
        }

        if signal_sender.send(SignalMessage::Reload).is_err() {
            // Main loop is gone
            return;
        }
    }
}

/// Whether `event` touches the config file itself (directly or via rename).
fn affects_config(event: &Event, config_path: &Path) -> bool {
    let Some(file_name) = config_path.file_name() else {
        return false;
    };
    event
        .paths
        .iter()
        .any(|path| path == config_path || path.file_name() == Some(file_name))
}

/// Start the configuration file watcher.
pub fn start_config_watcher(
    config_path: PathBuf,
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<()> {
    ConfigWatcher::new(config_path, signal_sender, debug_enabled).start()
}
