//! Unix signal handling and the main loop's message type.
//!
//! Every helper thread (signal handler, config watcher, gsettings monitors,
//! D-Bus monitors, shell readiness) talks to the main loop exclusively by
//! sending [`SignalMessage`]s over one mpsc channel.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2},
    iterator::Signals,
};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use crate::settings::SettingChange;

/// Unified message type for everything the main loop reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalMessage {
    /// Stop the daemon (SIGTERM, SIGINT, SIGHUP)
    Shutdown,
    /// Re-read nightfall.toml (SIGUSR2, config file watcher)
    Reload,
    /// Forget applied states and apply the current one again (SIGUSR1)
    Reapply,
    /// The wall clock jumped
    TimeChange,
    /// System sleep event from logind
    Sleep { resuming: bool },
    /// A subscribed setting changed in one of the settings stores
    SettingChanged(SettingChange),
    /// The companion shell extension became reachable
    CompanionReady,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Cleared once a shutdown signal arrived
    pub running: Arc<AtomicBool>,
    /// Channel receiver for the main loop
    pub signal_receiver: Receiver<SignalMessage>,
    /// Channel sender cloned into every helper thread
    pub signal_sender: Sender<SignalMessage>,
}

/// Map a received Unix signal to the message the main loop should see.
pub fn message_for_signal(sig: i32) -> Option<SignalMessage> {
    match sig {
        SIGINT | SIGTERM | SIGHUP => Some(SignalMessage::Shutdown),
        SIGUSR1 => Some(SignalMessage::Reapply),
        SIGUSR2 => Some(SignalMessage::Reload),
        _ => None,
    }
}

/// Set up signal handling for the application.
///
/// Spawns a background thread that translates signals into messages on the
/// returned channel.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = channel::<SignalMessage>();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running_clone = running.clone();
    let sender = signal_sender.clone();

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                let Some(message) = message_for_signal(sig) else {
                    continue;
                };

                log_pipe!();
                match (&message, sig) {
                    (SignalMessage::Reload, _) => {
                        log_info!("Received configuration reload signal");
                    }
                    (SignalMessage::Reapply, _) => {
                        log_info!("Received reapply signal");
                    }
                    (_, SIGINT) if debug_enabled => {
                        log_info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                    }
                    (_, SIGHUP) => {
                        log_info!("Received hangup signal, initiating graceful shutdown...");
                    }
                    _ => {
                        log_info!("Received termination request, initiating graceful shutdown...");
                    }
                }

                if message == SignalMessage::Shutdown {
                    running_clone.store(false, Ordering::SeqCst);
                }

                if sender.send(message).is_err() {
                    // Main loop is gone
                    running_clone.store(false, Ordering::SeqCst);
                    break;
                }
            }
        })
        .context("failed to spawn signal handler thread")?;

    Ok(SignalState {
        running,
        signal_receiver,
        signal_sender,
    })
}
