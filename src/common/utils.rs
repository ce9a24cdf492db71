//! Shared helpers used across modules.

use std::path::Path;

/// Replace the home directory prefix of a path with `~` for display.
///
/// Keeps usernames out of logs that users paste into bug reports.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Check whether a process with the given PID is alive.
pub fn is_process_running(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

/// Format a minute of the day (0-1439) as `HH:MM`.
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "00:00");
        assert_eq!(format_minutes(1320), "22:00");
        assert_eq!(format_minutes(1439), "23:59");
        assert_eq!(format_minutes(61), "01:01");
    }

    #[test]
    fn test_private_path_outside_home() {
        assert_eq!(private_path(Path::new("/etc/nightfall")), "/etc/nightfall");
    }

    #[test]
    fn test_current_process_is_running() {
        assert!(is_process_running(std::process::id()));
    }
}
