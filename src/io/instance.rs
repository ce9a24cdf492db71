//! Instance management for nightfall processes.
//!
//! Builds on the lock file in `io::lock`: the running daemon records its PID
//! and custom config directory there, and the CLI commands use it to find
//! and signal the daemon.

use anyhow::{Context, Result};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::common::utils::is_process_running;
use crate::io::lock::{self, LockFile};

/// Information about a running nightfall instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceInfo {
    pub pid: u32,
    /// Custom config directory if set
    pub config_dir: Option<PathBuf>,
}

impl InstanceInfo {
    /// Parse instance info from lock file contents.
    ///
    /// Line 1 holds the PID, line 2 the config directory (empty for the
    /// default one).
    pub fn from_lock_contents(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();

        let pid = lines
            .next()
            .filter(|line| !line.trim().is_empty())
            .context("Lock file is empty")?
            .trim()
            .parse::<u32>()
            .context("Invalid PID format in lock file")?;

        let config_dir = lines
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from);

        if lines.any(|line| !line.trim().is_empty()) {
            anyhow::bail!("Invalid lock file format (expected at most 2 lines)");
        }

        Ok(InstanceInfo { pid, config_dir })
    }

    /// Serialize instance info to lock file format.
    pub fn to_lock_contents(&self) -> String {
        match &self.config_dir {
            Some(dir) => format!("{}\n{}\n", self.pid, dir.display()),
            None => format!("{}\n\n", self.pid),
        }
    }
}

/// Get information about the currently running nightfall instance.
///
/// Restores the instance's custom config directory for this process, so
/// commands like `get` and `set` operate on the same file as the daemon.
pub fn get_running_instance() -> Result<Option<InstanceInfo>> {
    let lock_path = lock::get_main_lock_path();

    let lock_content = match std::fs::read_to_string(&lock_path) {
        Ok(content) => content,
        Err(_) => return Ok(None),
    };

    let info = InstanceInfo::from_lock_contents(&lock_content)?;

    if !is_process_running(info.pid) {
        return Ok(None);
    }

    if let Some(ref config_dir) = info.config_dir
        && crate::config::get_custom_config_dir().is_none()
    {
        let _ = crate::config::set_config_dir(Some(config_dir.display().to_string()));
    }

    Ok(Some(info))
}

/// Get just the PID of the running nightfall instance.
pub fn get_running_instance_pid() -> Result<u32> {
    get_running_instance()?
        .map(|info| info.pid)
        .ok_or_else(|| anyhow::anyhow!("No nightfall instance running"))
}

fn send_signal(pid: u32, signal: Signal) -> Result<()> {
    let raw = i32::try_from(pid).context("PID out of range")?;
    kill(Pid::from_raw(raw), signal)
        .map_err(|e| anyhow::anyhow!("Failed to send {} to process {}: {}", signal, pid, e))
}

/// Send a reload signal (SIGUSR2) to a running instance.
pub fn send_reload_signal(pid: u32) -> Result<()> {
    send_signal(pid, Signal::SIGUSR2)
}

/// Send SIGTERM and wait up to `timeout` for the process to exit.
///
/// Returns `true` if the process is gone.
pub fn terminate_instance(pid: u32, timeout: Duration) -> Result<bool> {
    send_signal(pid, Signal::SIGTERM)?;

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !is_process_running(pid) {
            return Ok(true);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    Ok(!is_process_running(pid))
}

/// Ensure single instance enforcement.
///
/// Stale locks (dead owner, unreadable contents) are cleaned up and the lock
/// is retried once. Fails if a live instance holds the lock.
pub fn ensure_single_instance() -> Result<LockFile> {
    let lock_path = lock::get_main_lock_path();

    if let Some(lock) = acquire_and_record(&lock_path)? {
        return Ok(lock);
    }

    handle_instance_conflict(&lock_path)?;

    acquire_and_record(&lock_path)?
        .ok_or_else(|| anyhow::anyhow!("Failed to acquire lock after conflict resolution"))
}

fn acquire_and_record(lock_path: &Path) -> Result<Option<LockFile>> {
    let Some(mut lock) = LockFile::try_acquire(lock_path)? else {
        return Ok(None);
    };

    let info = InstanceInfo {
        pid: std::process::id(),
        config_dir: crate::config::get_custom_config_dir(),
    };
    lock.write(&info.to_lock_contents())?;
    Ok(Some(lock))
}

/// Handle conflicts when another process holds the lock.
fn handle_instance_conflict(lock_path: &Path) -> Result<()> {
    let lock_content = match std::fs::read_to_string(lock_path) {
        Ok(content) => content,
        Err(_) => return Ok(()),
    };

    let info = match InstanceInfo::from_lock_contents(&lock_content) {
        Ok(info) => info,
        Err(_) => {
            log_warning!("Lock file format invalid, removing");
            let _ = std::fs::remove_file(lock_path);
            return Ok(());
        }
    };

    if !is_process_running(info.pid) {
        log_warning!(
            "Removing stale lock file (process {} no longer running)",
            info.pid
        );
        let _ = std::fs::remove_file(lock_path);
        return Ok(());
    }

    anyhow::bail!("nightfall is already running (PID: {})", info.pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_contents_round_trip() {
        let info = InstanceInfo {
            pid: 4242,
            config_dir: Some(PathBuf::from("/home/user/.config/nightfall-test")),
        };
        let parsed = InstanceInfo::from_lock_contents(&info.to_lock_contents()).unwrap();
        assert_eq!(parsed, info);

        let default_dir = InstanceInfo {
            pid: 7,
            config_dir: None,
        };
        let parsed = InstanceInfo::from_lock_contents(&default_dir.to_lock_contents()).unwrap();
        assert_eq!(parsed, default_dir);
    }

    #[test]
    fn test_invalid_lock_contents() {
        assert!(InstanceInfo::from_lock_contents("").is_err());
        assert!(InstanceInfo::from_lock_contents("not-a-pid\n").is_err());
        assert!(InstanceInfo::from_lock_contents("1\n/a\n/b\n").is_err());
    }
}
