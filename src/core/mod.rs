//! Core application logic.
//!
//! The daemon is a single-threaded event loop. Helper threads (signals,
//! config watcher, gsettings monitors, D-Bus monitors) only send
//! [`SignalMessage`]s; the loop owns the [`Assembly`] and is the only place
//! that touches theme state. Between messages the loop sleeps until the
//! time check's next deadline.

pub mod assembly;
pub mod clock;
pub mod lifecycle;
pub mod state;
pub mod time_check;
pub mod window;

use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Instant;

use crate::common::utils::{format_minutes, private_path};
use crate::config;
use crate::io::lock::LockFile;
use crate::io::signals::{SignalMessage, SignalState};
use crate::settings::FileStore;
use crate::time_source;

pub use assembly::{Assembly, Collaborators};
pub use state::State;
pub use window::TimeWindow;

/// Parameters for creating a Core instance.
pub(crate) struct CoreParams {
    pub assembly: Assembly,
    pub settings: Arc<FileStore>,
    pub signal_state: SignalState,
    pub debug_enabled: bool,
    pub lock_file: Option<LockFile>,
}

/// Owns the assembly and runs the main loop until shutdown.
pub(crate) struct Core {
    assembly: Assembly,
    settings: Arc<FileStore>,
    signal_state: SignalState,
    debug_enabled: bool,
    lock_file: Option<LockFile>,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        Self {
            assembly: params.assembly,
            settings: params.settings,
            signal_state: params.signal_state,
            debug_enabled: params.debug_enabled,
            lock_file: params.lock_file,
        }
    }

    pub fn execute(mut self) -> Result<()> {
        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!("Base directory: {}", private_path(&custom_dir));
        }

        self.assembly.enable(Instant::now(), &time_source::now())?;
        self.log_status();

        self.main_loop();

        log_block_start!("Shutting down nightfall...");
        self.assembly.disable();
        if let Some(lock_file) = self.lock_file.take() {
            lock_file.release();
        }
        log_end!();
        Ok(())
    }

    fn log_status(&self) {
        log_block_start!(
            "Nighttime window ({})",
            self.assembly.provider_name().unwrap_or("none")
        );
        match self.assembly.window() {
            Some(window) => log_indented!(
                "{} - {}",
                format_minutes(window.begin),
                format_minutes(window.end)
            ),
            None => log_indented!("unavailable, treating it as day"),
        }
        for reactor in self.assembly.reactors() {
            if reactor.is_enabled() {
                log_indented!("{}: {}", reactor.name(), reactor.state());
            }
        }
    }

    fn main_loop(&mut self) {
        while self.signal_state.running.load(Ordering::SeqCst) {
            let received = match self.assembly.next_wakeup(Instant::now()) {
                Some(timeout) => self.signal_state.signal_receiver.recv_timeout(timeout),
                None => self
                    .signal_state
                    .signal_receiver
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(message) => {
                    if !self.handle_message(message) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log_pipe!();
                    log_error!("Message channel disconnected unexpectedly");
                    break;
                }
            }

            self.assembly.tick(Instant::now(), &time_source::now());
        }
    }

    /// Returns `false` when the loop should stop.
    fn handle_message(&mut self, message: SignalMessage) -> bool {
        match message {
            SignalMessage::Shutdown => return false,
            SignalMessage::Reload => match self.settings.reload() {
                Ok(changed) if changed.is_empty() => {
                    if self.debug_enabled {
                        log_debug!("Configuration reloaded, nothing changed");
                    }
                }
                Ok(changed) => {
                    log_block_start!("Configuration reloaded");
                    log_indented!("Changed: {}", changed.join(", "));
                }
                Err(e) => {
                    log_pipe!();
                    log_error!("Keeping the previous configuration: {e:#}");
                }
            },
            SignalMessage::Reapply => {
                self.assembly.reapply(&time_source::now());
            }
            SignalMessage::TimeChange | SignalMessage::Sleep { resuming: true } => {
                self.assembly.apply(&time_source::now());
            }
            SignalMessage::Sleep { resuming: false } => {}
            SignalMessage::SettingChanged(change) => {
                if self.debug_enabled {
                    log_debug!("{} changed in {}", change.key, change.source.name());
                }
                self.assembly.handle_setting_changed(&change, Instant::now());
            }
            SignalMessage::CompanionReady => {
                self.assembly.companion_ready(&time_source::now());
            }
        }
        true
    }
}
