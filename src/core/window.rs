//! Nighttime window arithmetic.
//!
//! A window is a pair of minutes of the day. It may wrap past midnight and
//! carries no ordering constraint between `begin` and `end`:
//!
//! - `begin < end`: night is `[begin, end)`
//! - `begin >= end`: night is `[begin, 1440) ∪ [0, end)`
//!
//! The second rule means a window with `begin == end` covers the whole day.

use chrono::Timelike;
use serde::Serialize;

use crate::common::constants::MAXIMUM_MINUTE_OF_DAY;
use crate::time_source::minute_of_day;

/// A nighttime window in minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub begin: u32,
    pub end: u32,
}

impl TimeWindow {
    pub fn new(begin: u32, end: u32) -> Self {
        Self { begin, end }
    }

    /// Build a window from Night Light schedule hours (e.g. `20.5` = 20:30).
    pub fn from_hours(from: f64, to: f64) -> Self {
        Self {
            begin: hours_to_minutes(from),
            end: hours_to_minutes(to),
        }
    }

    /// Whether `minute` (0-1439) falls inside the window.
    pub fn contains(&self, minute: u32) -> bool {
        if self.begin < self.end {
            self.begin <= minute && minute < self.end
        } else {
            minute < self.end || self.begin <= minute
        }
    }

    /// Whether the wall-clock `time` is nighttime. Seconds are ignored.
    pub fn is_nighttime<T: Timelike>(&self, time: &T) -> bool {
        self.contains(minute_of_day(time))
    }
}

/// Convert fractional hours to whole minutes of the day.
///
/// Night Light stores `hh:mm` as `hh + mm / 60`, which is often a hair
/// below the exact minute, so the result is rounded to the nearest minute.
/// Clamped to 0..=1439 so out-of-range schedules (Night Light allows 24.0)
/// still produce a usable window.
pub fn hours_to_minutes(hours: f64) -> u32 {
    if !hours.is_finite() || hours <= 0.0 {
        return 0;
    }
    let minutes = (hours * 60.0).round();
    if minutes >= f64::from(MAXIMUM_MINUTE_OF_DAY) {
        MAXIMUM_MINUTE_OF_DAY
    } else {
        minutes as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_wrapping_window() {
        let window = TimeWindow::new(1320, 60);
        assert!(!window.contains(1319));
        assert!(window.contains(1320));
        assert!(window.contains(0));
        assert!(window.contains(59));
        assert!(!window.contains(60));
        assert!(!window.contains(720));
    }

    #[test]
    fn test_plain_window() {
        let window = TimeWindow::new(360, 1320);
        assert!(!window.contains(359));
        assert!(window.contains(360));
        assert!(window.contains(1319));
        assert!(!window.contains(1320));
    }

    #[test]
    fn test_equal_bounds_are_always_night() {
        let window = TimeWindow::new(600, 600);
        assert!((0..1440).all(|m| window.contains(m)));
    }

    #[test]
    fn test_is_nighttime_ignores_seconds() {
        let window = TimeWindow::new(1320, 60);
        let just_before = NaiveTime::from_hms_opt(21, 59, 59).unwrap();
        let at_begin = NaiveTime::from_hms_opt(22, 0, 0).unwrap();
        assert!(!window.is_nighttime(&just_before));
        assert!(window.is_nighttime(&at_begin));
    }

    #[test]
    fn test_hours_to_minutes() {
        assert_eq!(hours_to_minutes(20.0), 1200);
        assert_eq!(hours_to_minutes(6.5), 390);
        assert_eq!(hours_to_minutes(7.999), 480);
        assert_eq!(hours_to_minutes(7.99), 479);
        assert_eq!(hours_to_minutes(24.0), 1439);
        assert_eq!(hours_to_minutes(-1.0), 0);
        assert_eq!(hours_to_minutes(f64::NAN), 0);
        assert_eq!(TimeWindow::from_hours(20.0, 6.0), TimeWindow::new(1200, 360));
    }

    #[test]
    fn test_hours_to_minutes_recovers_every_schedule_minute() {
        for minute in 0..1440u32 {
            assert_eq!(hours_to_minutes(f64::from(minute) / 60.0), minute);
        }
    }

    #[test]
    fn test_night_light_schedule_starts_on_its_minute() {
        // 16:50 is stored as 16.8333..., which times 60 lands below 1010
        let window = TimeWindow::from_hours(1010.0 / 60.0, 6.0);
        assert_eq!(window.begin, 1010);
        assert!(!window.contains(1009));
        assert!(window.contains(1010));
    }
}
