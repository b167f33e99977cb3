use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::lock;

/// Remaining-cooldown view over the last attempt time.
///
/// Uses [`Instant`], so wall-clock adjustments never shorten or stretch a
/// cooldown.
#[derive(Debug)]
pub struct AvailabilityTracker {
    cooldown: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl AvailabilityTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_attempt: Mutex::new(None),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn record_attempt(&self, at: Instant) {
        *lock(&self.last_attempt) = Some(at);
    }

    pub fn last_attempt(&self) -> Option<Instant> {
        *lock(&self.last_attempt)
    }

    /// `max(0, cooldown - (now - last_attempt))`, zero if never attempted.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        match self.last_attempt() {
            Some(at) => self
                .cooldown
                .saturating_sub(now.saturating_duration_since(at)),
            None => Duration::ZERO,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    /// True while the last attempt is younger than the cooldown.
    pub fn is_busy_at(&self, now: Instant) -> bool {
        !self.remaining_at(now).is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_attempted_has_no_remaining() {
        let tracker = AvailabilityTracker::new(Duration::from_secs(5));
        assert_eq!(tracker.remaining(), Duration::ZERO);
        assert!(!tracker.is_busy_at(Instant::now()));
    }

    #[test]
    fn test_remaining_counts_down_from_attempt() {
        let tracker = AvailabilityTracker::new(Duration::from_secs(5));
        let t0 = Instant::now();
        tracker.record_attempt(t0);

        assert_eq!(tracker.remaining_at(t0), Duration::from_secs(5));
        assert_eq!(
            tracker.remaining_at(t0 + Duration::from_millis(200)),
            Duration::from_millis(4800)
        );
        assert!(tracker.is_busy_at(t0 + Duration::from_millis(4999)));
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        let tracker = AvailabilityTracker::new(Duration::from_secs(5));
        let t0 = Instant::now();
        tracker.record_attempt(t0);

        assert_eq!(tracker.remaining_at(t0 + Duration::from_secs(5)), Duration::ZERO);
        assert_eq!(tracker.remaining_at(t0 + Duration::from_secs(60)), Duration::ZERO);
        assert!(!tracker.is_busy_at(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn test_zero_cooldown_is_never_busy() {
        let tracker = AvailabilityTracker::new(Duration::ZERO);
        let t0 = Instant::now();
        tracker.record_attempt(t0);
        assert!(!tracker.is_busy_at(t0));
    }

    #[test]
    fn test_now_before_attempt_saturates() {
        let tracker = AvailabilityTracker::new(Duration::from_secs(1));
        let t0 = Instant::now();
        tracker.record_attempt(t0 + Duration::from_millis(500));
        assert_eq!(tracker.remaining_at(t0), Duration::from_secs(1));
    }
}
