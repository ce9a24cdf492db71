//! Command-line command handlers for nightfall.
//!
//! One-shot commands that inspect or steer the daemon. Each command lives in
//! its own submodule together with its usage and help text.

pub mod get;
pub mod help;
pub mod reload;
pub mod set;
pub mod status;
pub mod stop;

use anyhow::Result;

/// Restore the running instance's config directory unless `--config` was
/// given, so commands read the same file as the daemon.
pub(crate) fn follow_running_instance() -> Result<()> {
    if crate::config::get_custom_config_dir().is_none() {
        let _ = crate::io::instance::get_running_instance()?;
    }
    Ok(())
}
