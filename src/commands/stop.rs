//! `nightfall stop`: SIGTERM the running daemon and wait for it to go away.

use anyhow::Result;
use std::time::Duration;

use crate::common::constants::STOP_TIMEOUT_MS;
use crate::io::instance;

pub fn handle_stop_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let Ok(pid) = instance::get_running_instance_pid() else {
        log_error_exit!("nightfall isn't running");
        std::process::exit(1);
    };

    log_block_start!("Stopping nightfall (PID {pid})");

    match instance::terminate_instance(pid, Duration::from_millis(STOP_TIMEOUT_MS)) {
        Ok(true) => {
            if debug_enabled {
                log_pipe!();
                log_debug!("Sent SIGTERM to {pid}");
            }
            log_pipe!();
            log_info!("nightfall stopped");
            log_end!();
        }
        Ok(false) => {
            log_pipe!();
            log_warning!("nightfall is still running {STOP_TIMEOUT_MS} ms after SIGTERM");
            log_indented!("It may still be releasing its subscriptions");
            log_end!();
        }
        Err(e) => {
            log_error_exit!("Could not stop PID {pid}: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: nightfall stop");
    log_block_start!("Description:");
    log_indented!("Stop the running daemon");
    log_pipe!();
    log_info!("See also: nightfall help stop");
    log_end!();
}

pub fn display_help() {
    log_version!();
    log_block_start!("stop - Shut the daemon down");
    log_block_start!("Usage: nightfall stop");
    log_block_start!("Description:");
    log_indented!("Sends SIGTERM to the daemon holding the lock file and waits");
    log_indented!("up to three seconds for it to exit. The themes it applied last");
    log_indented!("stay in place.");
    log_block_start!("Examples:");
    log_indented!("nightfall stop");
    log_pipe!();
    log_indented!("nightfall --debug stop");
    log_end!();
}
