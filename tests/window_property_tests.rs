use chrono::NaiveTime;
use proptest::prelude::*;
use nightfall::core::window::{TimeWindow, hours_to_minutes};

/// Generate valid minutes of the day
fn minute_strategy() -> impl Strategy<Value = u32> {
    0u32..1440
}

fn time_at(minute: u32, second: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minute / 60, minute % 60, second).unwrap()
}

/// Reference predicate: walk forward from `begin` and see whether `minute`
/// is reached before `end`.
fn reference_contains(begin: u32, end: u32, minute: u32) -> bool {
    if begin == end {
        return true;
    }
    let mut m = begin;
    while m != end {
        if m == minute {
            return true;
        }
        m = (m + 1) % 1440;
    }
    false
}

proptest! {
    /// The window matches a minute-by-minute walk from begin to end
    #[test]
    fn test_window_matches_reference(
        begin in minute_strategy(),
        end in minute_strategy(),
        minute in minute_strategy(),
    ) {
        let window = TimeWindow::new(begin, end);
        prop_assert_eq!(window.contains(minute), reference_contains(begin, end, minute));
    }

    /// Swapping the bounds gives the complementary window
    #[test]
    fn test_swapped_bounds_complement(
        begin in minute_strategy(),
        end in minute_strategy(),
        minute in minute_strategy(),
    ) {
        prop_assume!(begin != end);
        let night = TimeWindow::new(begin, end);
        let day = TimeWindow::new(end, begin);
        prop_assert_ne!(night.contains(minute), day.contains(minute));
    }

    /// Seconds never change the result
    #[test]
    fn test_seconds_are_ignored(
        begin in minute_strategy(),
        end in minute_strategy(),
        minute in minute_strategy(),
        second in 0u32..60,
    ) {
        let window = TimeWindow::new(begin, end);
        prop_assert_eq!(
            window.is_nighttime(&time_at(minute, second)),
            window.is_nighttime(&time_at(minute, 0))
        );
    }

    /// Night Light hours always map to a valid minute of the day
    #[test]
    fn test_hours_map_into_day(hours in -48.0f64..48.0) {
        prop_assert!(hours_to_minutes(hours) <= 1439);
    }
}

#[test]
fn test_wrapping_window_every_minute() {
    // 22:00 - 01:00
    let window = TimeWindow::new(1320, 60);
    let nights = (0..1440).filter(|m| window.contains(*m)).count();
    assert_eq!(nights, 180);
    assert!(window.contains(1320));
    assert!(window.contains(0));
    assert!(window.contains(59));
    assert!(!window.contains(60));
    assert!(!window.contains(1319));
}

#[test]
fn test_plain_window_every_minute() {
    // 06:00 - 22:00
    let window = TimeWindow::new(360, 1320);
    for minute in 0..1440 {
        assert_eq!(
            window.contains(minute),
            (360..1320).contains(&minute),
            "minute {minute}"
        );
    }
}
