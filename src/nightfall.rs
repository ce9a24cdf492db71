//! Application coordinator that manages the complete lifecycle of nightfall.
//!
//! Acquires the single-instance lock, loads the configuration, starts the
//! helper threads (signals, config watcher, D-Bus monitors) and builds the
//! settings stores and collaborators the [`Assembly`] runs on. `Core` then
//! owns everything until shutdown.
//!
//! The `Nightfall` struct uses a builder pattern:
//! - Normal startup: `Nightfall::new(debug_enabled).run()`
//! - Without the lock (second instance for testing a config dir):
//!   `Nightfall::new(true).without_lock().run()`

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::{
    common::constants::*,
    common::utils::private_path,
    config,
    core::{Assembly, Collaborators, Core, CoreParams},
    io::{dbus, process::ShellRunner, signals::setup_signal_handler},
    settings::{FileStore, GSettingsStore, SettingsHub, SettingsSource},
};

/// Builder for configuring and running the nightfall daemon.
///
/// ```no_run
/// use nightfall::Nightfall;
///
/// # fn main() -> anyhow::Result<()> {
/// Nightfall::new(false).run()?;
/// # Ok(())
/// # }
/// ```
pub struct Nightfall {
    debug_enabled: bool,
    create_lock: bool,
    show_headers: bool,
}

impl Nightfall {
    /// Create a new runner with defaults matching normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
            show_headers: true,
        }
    }

    /// Skip lock file creation
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    /// Skip header display
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Execute the daemon until a shutdown signal arrives.
    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
        }

        // Load and validate configuration first
        let config = match config::load() {
            Ok(config) => config,
            Err(e) => {
                log_error_exit!("Configuration failed");
                eprintln!("{:?}", e);
                std::process::exit(EXIT_FAILURE);
            }
        };
        let config_path = config::get_config_path()?;

        // Handle lock file before any helper thread starts logging
        let lock_file = if self.create_lock {
            Some(crate::io::instance::ensure_single_instance()?)
        } else {
            None
        };

        let signal_state = setup_signal_handler(self.debug_enabled)?;
        let sender = signal_state.signal_sender.clone();

        // Sleep/resume and clock jumps (optional - graceful degradation if D-Bus unavailable)
        if let Err(e) = dbus::start_system_monitors(sender.clone(), self.debug_enabled) {
            log_pipe!();
            log_warning!("System monitoring unavailable: {}", e);
            log_indented!("Resume and clock changes will be noticed on the next time check");
        }

        // Hot reload (optional - graceful degradation if unavailable)
        if let Err(e) =
            config::start_config_watcher(config_path.clone(), sender.clone(), self.debug_enabled)
        {
            log_pipe!();
            log_warning!("Config file watching unavailable: {}", e);
            log_indented!("Hot config reload disabled, use `nightfall reload` instead");
        }

        config.log_config();

        let hub = SettingsHub::new(sender.clone());
        let settings = Arc::new(FileStore::new(config_path.clone(), config, hub.clone()));

        let collaborators = Collaborators {
            settings: settings.clone(),
            interface: Arc::new(GSettingsStore::new(
                SettingsSource::Interface,
                INTERFACE_SCHEMA,
                hub.clone(),
            )),
            night_light: Arc::new(GSettingsStore::new(
                SettingsSource::NightLight,
                COLOR_SCHEMA,
                hub.clone(),
            )),
            companion: Arc::new(dbus::ExtensionLocator::new(hub)),
            readiness: Arc::new(dbus::ShellReadiness::new(sender, self.debug_enabled)),
            runner: Arc::new(ShellRunner),
        };

        if lock_file.is_some() {
            log_block_start!("Lock acquired, starting nightfall...");
        }
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Settings file: {}", private_path(&config_path));
        }

        let core = Core::new(CoreParams {
            assembly: Assembly::new(collaborators, self.debug_enabled),
            settings,
            signal_state,
            debug_enabled: self.debug_enabled,
            lock_file,
        });

        core.execute().context("nightfall stopped with an error")
    }
}
