//! Clock abstraction.
//!
//! Liveness is judged against wall-clock time. The aggregator takes the clock
//! as a dependency so tests can move time forward without sleeping.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: std::time::Duration) {
        // Saturates at the end of chrono's range.
        let mut now = self.now.write();
        let next = Duration::from_std(by)
            .ok()
            .and_then(|by| now.checked_add_signed(by))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        *now = next;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::epoch;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(epoch());
        assert_eq!(clock.now(), epoch());

        clock.advance(std::time::Duration::from_secs(41));
        assert_eq!(clock.now(), epoch() + Duration::seconds(41));

        clock.set(epoch());
        assert_eq!(clock.now(), epoch());
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
