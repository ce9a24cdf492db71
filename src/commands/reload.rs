//! Implementation of the reload command.
//!
//! Validates the configuration file and signals the running instance
//! (SIGUSR2) to reload it.

use anyhow::Result;

use crate::io::instance;

/// Handle the reload command.
pub fn handle_reload_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    // Restores the instance's config directory before the file is checked
    let pid = instance::get_running_instance_pid();

    // Fail with the parse error here instead of in the daemon's log
    crate::config::load()?;

    match pid {
        Ok(pid) => {
            instance::send_reload_signal(pid)?;
            if debug_enabled {
                log_pipe!();
                log_debug!("SIGUSR2 sent to process {}", pid);
            }
            log_block_start!("Sent reload signal to nightfall (PID: {pid})");
            log_indented!("The running instance will re-read its configuration");
            log_end!();
        }
        Err(_) => {
            log_pipe!();
            log_warning!("nightfall isn't running");
            log_indented!("The configuration is valid and will be used on the next start");
            log_end!();
        }
    }

    Ok(())
}

/// Display usage help for the reload command (--help flag)
pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: nightfall reload");
    log_block_start!("Description:");
    log_indented!("Make the running instance re-read its configuration");
    log_pipe!();
    log_info!("For detailed help with examples, try: nightfall help reload");
    log_end!();
}

/// Display detailed help for the reload command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("reload - Reload the configuration of the running instance");
    log_block_start!("Usage: nightfall reload");
    log_block_start!("Description:");
    log_indented!("Checks nightfall.toml and sends SIGUSR2 to the running instance.");
    log_indented!("Edits to the file are picked up automatically; use this after");
    log_indented!("replacing the file in a way the watcher cannot see.");
    log_block_start!("Examples:");
    log_indented!("# Reload the running instance");
    log_indented!("nightfall reload");
    log_pipe!();
    log_indented!("# Reload an instance started with a custom config directory");
    log_indented!("nightfall --config ~/.config/nightfall-work reload");
    log_end!();
}
