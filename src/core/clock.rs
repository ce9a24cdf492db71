//! A single restartable periodic deadline.
//!
//! The clock does not own a thread. The main loop asks it how long it may
//! block (`time_until`) and calls `fire` once the deadline passed. Starting
//! an already running clock replaces its deadline, so at most one deadline
//! exists at any time.

use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct Clock {
    period: Duration,
    deadline: Option<Instant>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the next tick `period` after `now`, replacing any pending one.
    pub fn start(&mut self, now: Instant, period: Duration) {
        self.period = period;
        self.deadline = Some(now + period);
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }

    /// Stop and start again from `now` with a new period.
    pub fn restart(&mut self, now: Instant, period: Duration) {
        self.stop();
        self.start(now, period);
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, `None` while stopped.
    pub fn time_until(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Consume a due tick and schedule the next one.
    ///
    /// Returns `false` if the clock is stopped or not yet due. The next
    /// deadline keeps the period cadence unless the loop fell more than a
    /// period behind, in which case it restarts from `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if deadline > now {
            return false;
        }

        let next = deadline + self.period;
        self.deadline = Some(if next > now { next } else { now + self.period });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_reschedules_at_period() {
        let t0 = Instant::now();
        let period = Duration::from_millis(1000);
        let mut clock = Clock::new();
        clock.start(t0, period);

        assert!(!clock.fire(t0 + Duration::from_millis(999)));
        assert!(clock.fire(t0 + Duration::from_millis(1000)));
        assert_eq!(clock.deadline(), Some(t0 + Duration::from_millis(2000)));

        // Late by more than a period: restart from now
        assert!(clock.fire(t0 + Duration::from_millis(5500)));
        assert_eq!(clock.deadline(), Some(t0 + Duration::from_millis(6500)));
    }

    #[test]
    fn test_restart_replaces_deadline() {
        let t0 = Instant::now();
        let mut clock = Clock::new();
        clock.start(t0, Duration::from_secs(60));
        clock.restart(t0 + Duration::from_secs(1), Duration::from_millis(10));

        assert_eq!(clock.period(), Duration::from_millis(10));
        assert_eq!(
            clock.deadline(),
            Some(t0 + Duration::from_secs(1) + Duration::from_millis(10))
        );
    }

    #[test]
    fn test_stopped_clock_never_fires() {
        let t0 = Instant::now();
        let mut clock = Clock::new();
        clock.start(t0, Duration::from_millis(10));
        clock.stop();

        assert!(!clock.is_running());
        assert!(!clock.fire(t0 + Duration::from_secs(10)));
        assert_eq!(clock.time_until(t0), None);
    }
}
