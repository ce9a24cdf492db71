//! Configuration validation functionality.
//!
//! Rejects values the daemon cannot act on: minutes outside the day, time
//! check periods that would spin or stall the loop, and empty GTK theme names.

use anyhow::Result;

use super::Config;
use crate::common::constants::*;

/// Validate every field of `config` that is set.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(begin) = config.nighttime_begin {
        validate_minute_of_day(begin, KEY_NIGHTTIME_BEGIN)?;
    }

    if let Some(end) = config.nighttime_end {
        validate_minute_of_day(end, KEY_NIGHTTIME_END)?;
    }

    if let Some(period) = config.time_check_period
        && !(MINIMUM_TIME_CHECK_PERIOD..=MAXIMUM_TIME_CHECK_PERIOD).contains(&period)
    {
        anyhow::bail!(
            "{} ({} ms) must be between {} and {} milliseconds",
            KEY_TIME_CHECK_PERIOD,
            period,
            MINIMUM_TIME_CHECK_PERIOD,
            MAXIMUM_TIME_CHECK_PERIOD
        );
    }

    for (key, theme) in [
        (KEY_DAY_THEME, &config.day_theme),
        (KEY_NIGHT_THEME, &config.night_theme),
    ] {
        if let Some(theme) = theme
            && theme.trim().is_empty()
        {
            anyhow::bail!("{} must name a GTK theme", key);
        }
    }

    for (key, value) in [
        (KEY_DAY_THEME, &config.day_theme),
        (KEY_NIGHT_THEME, &config.night_theme),
        (KEY_DAY_SHELL, &config.day_shell),
        (KEY_NIGHT_SHELL, &config.night_shell),
    ] {
        if let Some(value) = value
            && value.chars().any(char::is_control)
        {
            anyhow::bail!("{} must not contain control characters", key);
        }
    }

    Ok(())
}

fn validate_minute_of_day(minute: u32, key: &str) -> Result<()> {
    if minute > MAXIMUM_MINUTE_OF_DAY {
        anyhow::bail!(
            "{} ({}) must be a minute of the day between 0 and {}",
            key,
            minute,
            MAXIMUM_MINUTE_OF_DAY
        );
    }
    Ok(())
}
