//! Time source abstraction for real and pinned time.
//!
//! The daemon reads "now" through a process-wide [`TimeSource`]. It defaults
//! to the system clock; `nightfall status --at HH:MM` installs a
//! [`FixedTimeSource`] to evaluate the configuration at another time of day.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveTime, TimeZone, Timelike};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, PoisonError};

/// Global time source instance, defaults to RealTimeSource
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current local time
    fn now(&self) -> DateTime<Local>;

    /// Whether this source is pinned rather than following the system clock
    fn is_fixed(&self) -> bool {
        false
    }
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
pub struct FixedTimeSource {
    current: Mutex<DateTime<Local>>,
}

impl FixedTimeSource {
    pub fn new(at: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(at),
        }
    }

    /// Today's date at `hour:minute` local time.
    pub fn at(hour: u32, minute: u32) -> Result<Self> {
        Ok(Self::new(today_at(hour, minute)?))
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current += by;
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fixed(&self) -> bool {
        true
    }
}

/// Initialize the global time source (call once at startup)
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

/// Get the current time from the global time source
pub fn now() -> DateTime<Local> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource)).now()
}

/// Check if the global time source is pinned
pub fn is_fixed() -> bool {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .is_fixed()
}

/// Minutes since local midnight (`hour * 60 + minute`).
pub fn minute_of_day<T: Timelike>(time: &T) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Today's date at `hour:minute` in the local time zone.
pub fn today_at(hour: u32, minute: u32) -> Result<DateTime<Local>> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .with_context(|| format!("Invalid time of day {hour:02}:{minute:02}"))?;
    let naive = Local::now().date_naive().and_time(time);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .with_context(|| format!("{hour:02}:{minute:02} does not exist today in the local time zone"))
}

/// Parse `HH:MM` into (hour, minute).
pub fn parse_clock_time(s: &str) -> Result<(u32, u32)> {
    let time = NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .with_context(|| format!("Invalid time '{s}' (use HH:MM)"))?;
    Ok((time.hour(), time.minute()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minute_of_day() {
        let t = NaiveTime::from_hms_opt(22, 30, 59).unwrap();
        assert_eq!(minute_of_day(&t), 1350);
        assert_eq!(minute_of_day(&NaiveTime::MIN), 0);
    }

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(parse_clock_time("06:05").unwrap(), (6, 5));
        assert_eq!(parse_clock_time("23:59").unwrap(), (23, 59));
        assert!(parse_clock_time("24:00").is_err());
        assert!(parse_clock_time("noon").is_err());
    }

    #[test]
    fn test_fixed_time_source_advances() {
        let source = FixedTimeSource::at(21, 59).unwrap();
        assert_eq!(minute_of_day(&source.now()), 1319);
        source.advance(chrono::Duration::minutes(2));
        assert_eq!(minute_of_day(&source.now()), 1321);
        assert!(source.is_fixed());
    }
}
