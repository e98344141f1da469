//! Monotonic id allocation.
//!
//! Ids track wall-clock milliseconds like the browser pages did, but
//! never repeat: two creations in the same millisecond (or a clock that
//! steps backwards) get consecutive ids instead of colliding.

use chrono::{DateTime, Utc};

/// Allocates strictly increasing ids, shared by posts, circles and moments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    /// Start above `floor`, typically the largest id already in use.
    pub const fn starting_after(floor: u64) -> Self {
        Self { last: floor }
    }

    /// Next id: `now` in epoch milliseconds, or `last + 1` if that is not
    /// strictly greater than the previous id.
    pub fn next(&mut self, now: DateTime<Utc>) -> u64 {
        let candidate = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = candidate.max(self.last.saturating_add(1));
        self.last = id;
        id
    }

    /// The most recently issued id (or the floor).
    pub const fn last(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn follows_wall_clock() {
        let mut ids = IdGenerator::default();
        assert_eq!(ids.next(at(1_000)), 1_000);
        assert_eq!(ids.next(at(2_000)), 2_000);
    }

    #[test]
    fn same_millisecond_gets_next_integer() {
        let mut ids = IdGenerator::default();
        assert_eq!(ids.next(at(5_000)), 5_000);
        assert_eq!(ids.next(at(5_000)), 5_001);
        assert_eq!(ids.next(at(5_000)), 5_002);
    }

    #[test]
    fn clock_going_backwards_stays_monotonic() {
        let mut ids = IdGenerator::starting_after(10_000);
        assert_eq!(ids.next(at(9_000)), 10_001);
        assert_eq!(ids.last(), 10_001);
    }
}
