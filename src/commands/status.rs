//! Implementation of the status command.
//!
//! Evaluates the configuration the way the daemon would: which window
//! provider is in use, the nighttime window, and whether it is night at the
//! current (or a given) time of day.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::Arc;

use crate::common::constants::*;
use crate::common::utils::format_minutes;
use crate::config::Config;
use crate::core::{State, TimeWindow};
use crate::settings::{GSettingsStore, SettingsHub, SettingsSource, SettingsStore};
use crate::time_source::{self, FixedTimeSource, minute_of_day, parse_clock_time};

#[derive(Debug, Serialize)]
struct StatusReport {
    provider: &'static str,
    window: WindowReport,
    time: String,
    state: &'static str,
    running_pid: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WindowReport {
    begin: String,
    end: String,
    begin_minute: u32,
    end_minute: u32,
}

impl From<TimeWindow> for WindowReport {
    fn from(window: TimeWindow) -> Self {
        Self {
            begin: format_minutes(window.begin),
            end: format_minutes(window.end),
            begin_minute: window.begin,
            end_minute: window.end,
        }
    }
}

/// Handle the status command.
///
/// `at` pins the evaluated time to `HH:MM` today.
pub fn handle_status_command(json: bool, at: Option<&str>) -> Result<()> {
    if let Some(at) = at {
        let (hour, minute) = parse_clock_time(at)?;
        time_source::init_time_source(Arc::new(FixedTimeSource::at(hour, minute)?));
    }

    super::follow_running_instance()?;
    let running_pid = crate::io::instance::get_running_instance_pid().ok();

    let config = crate::config::load()?;
    let (provider, window) = resolve_window(&config, || {
        Arc::new(GSettingsStore::new(
            SettingsSource::NightLight,
            COLOR_SCHEMA,
            SettingsHub::detached(),
        ))
    });
    let report = build_report(provider, window, &time_source::now(), running_pid);

    if json {
        println!(
            "{}",
            serde_json::to_string(&report).context("Failed to serialize status")?
        );
        return Ok(());
    }

    log_version!();
    log_block_start!("Nighttime window ({})", report.provider);
    log_indented!("{} - {}", report.window.begin, report.window.end);
    log_block_start!(
        "{} at {}{}",
        capitalize(report.state),
        report.time,
        if time_source::is_fixed() { " (pinned)" } else { "" }
    );
    match report.running_pid {
        Some(pid) => log_block_start!("nightfall is running (PID: {})", pid),
        None => log_block_start!("nightfall isn't running"),
    }
    log_end!();

    Ok(())
}

/// Pick the provider the daemon would use and read its window.
///
/// The Night Light schedule falls back to the manual window when it cannot
/// be read, like the daemon does at startup.
fn resolve_window<F>(config: &Config, color_settings: F) -> (&'static str, TimeWindow)
where
    F: FnOnce() -> Arc<dyn SettingsStore>,
{
    if config
        .nighttime_from_night_light
        .unwrap_or(DEFAULT_NIGHTTIME_FROM_NIGHT_LIGHT)
    {
        let store = color_settings();
        let schedule = store
            .get_double(NIGHT_LIGHT_FROM_KEY)
            .and_then(|from| Ok((from, store.get_double(NIGHT_LIGHT_TO_KEY)?)));
        match schedule {
            Ok((from, to)) => return ("night-light", TimeWindow::from_hours(from, to)),
            Err(e) => {
                log_warning!("Night Light schedule unavailable, using the manual window: {e:#}");
            }
        }
    }

    let window = TimeWindow::new(
        config.nighttime_begin.unwrap_or(DEFAULT_NIGHTTIME_BEGIN),
        config.nighttime_end.unwrap_or(DEFAULT_NIGHTTIME_END),
    );
    ("manual", window)
}

fn build_report(
    provider: &'static str,
    window: TimeWindow,
    time: &DateTime<Local>,
    running_pid: Option<u32>,
) -> StatusReport {
    StatusReport {
        provider,
        window: WindowReport::from(window),
        time: format_minutes(minute_of_day(time)),
        state: State::from_nighttime(window.is_nighttime(time)).as_str(),
        running_pid,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Display usage help for the status command (--help flag)
pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: nightfall status [--json] [--at HH:MM]");
    log_block_start!("Description:");
    log_indented!("Show the nighttime window and whether it is night");
    log_pipe!();
    log_info!("For detailed help with examples, try: nightfall help status");
    log_end!();
}

/// Display detailed help for the status command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("status - Show the nighttime window and current state");
    log_block_start!("Usage: nightfall status [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("-j, --json    Output as a JSON object");
    log_indented!("--at HH:MM    Evaluate at this time of day instead of now");
    log_block_start!("Description:");
    log_indented!("Reads nightfall.toml (and the Night Light schedule when");
    log_indented!("nighttime-from-night-light is on) and reports the window the");
    log_indented!("daemon uses, whether that time is day or night, and whether");
    log_indented!("an instance is running.");
    log_block_start!("Examples:");
    log_indented!("# Is it night now?");
    log_indented!("nightfall status");
    log_pipe!();
    log_indented!("# Check the window just before midnight");
    log_indented!("nightfall status --at 23:59 --json");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MemoryStore, SettingValue};
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 12, hour, minute, 0).unwrap()
    }

    fn color(from: f64, to: f64) -> Arc<dyn SettingsStore> {
        Arc::new(
            MemoryStore::new(SettingsSource::NightLight, SettingsHub::detached())
                .with(NIGHT_LIGHT_FROM_KEY, SettingValue::Double(from))
                .with(NIGHT_LIGHT_TO_KEY, SettingValue::Double(to)),
        )
    }

    #[test]
    fn test_manual_window_from_config() {
        let mut config = Config::with_defaults();
        config.nighttime_begin = Some(1320);
        config.nighttime_end = Some(60);

        let (provider, window) = resolve_window(&config, || unreachable!());
        assert_eq!(provider, "manual");
        assert_eq!(window, TimeWindow::new(1320, 60));
    }

    #[test]
    fn test_night_light_window() {
        let mut config = Config::with_defaults();
        config.nighttime_from_night_light = Some(true);

        let (provider, window) = resolve_window(&config, || color(21.5, 6.0));
        assert_eq!(provider, "night-light");
        assert_eq!(window, TimeWindow::new(1290, 360));
    }

    #[test]
    fn test_night_light_falls_back_to_manual() {
        crate::common::logger::Log::set_enabled(false);
        let mut config = Config::with_defaults();
        config.nighttime_from_night_light = Some(true);

        let empty: Arc<dyn SettingsStore> = Arc::new(MemoryStore::new(
            SettingsSource::NightLight,
            SettingsHub::detached(),
        ));
        let (provider, window) = resolve_window(&config, || empty);
        assert_eq!(provider, "manual");
        assert_eq!(
            window,
            TimeWindow::new(DEFAULT_NIGHTTIME_BEGIN, DEFAULT_NIGHTTIME_END)
        );
    }

    #[test]
    fn test_report_state() {
        let window = TimeWindow::new(1320, 60);
        let night = build_report("manual", window, &at(23, 15), Some(42));
        assert_eq!(night.state, "night");
        assert_eq!(night.time, "23:15");

        let day = build_report("manual", window, &at(1, 0), None);
        assert_eq!(day.state, "day");

        let json = serde_json::to_value(&night).unwrap();
        assert_eq!(json["window"]["begin"], "22:00");
        assert_eq!(json["running_pid"], 42);
    }

    #[test]
    fn test_equal_bounds_report_night() {
        let report = build_report("manual", TimeWindow::new(600, 600), &at(12, 0), None);
        assert_eq!(report.state, "night");
        assert_eq!(report.window.begin_minute, 600);
    }
}
