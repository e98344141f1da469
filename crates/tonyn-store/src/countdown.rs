//! Remaining-time labels for posts and moments.
//!
//! Both label styles share [`Countdown::between`], so they agree exactly on
//! every boundary: minutes are rounded up, sixty whole minutes is the hour
//! boundary, and zero remaining is expired.

use core::fmt;

use chrono::{DateTime, Utc};

const MILLIS_PER_MINUTE: i64 = 60_000;
const MINUTES_PER_HOUR: u64 = 60;

/// Remaining time, normalized to whole minutes (rounded up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// Nothing remains.
    Expired,
    /// Under one hour remains.
    Minutes(u64),
    /// One hour or more remains.
    Hours {
        /// Whole hours.
        hours: u64,
        /// Leftover minutes (0..60).
        minutes: u64,
    },
}

/// Label style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStyle {
    /// Post labels: `"Expired"`, `"5m left"`, `"1h 30m left"`.
    Long,
    /// Moment labels: `"Ended"`, `"5m"`, `"1h 30m"`.
    Short,
}

impl Countdown {
    /// Compute the countdown to `expires_at` as seen at `now`.
    pub fn between(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining_ms = expires_at
            .signed_duration_since(now)
            .num_milliseconds()
            .max(0);
        let total_minutes = ceil_minutes(remaining_ms);

        if total_minutes == 0 {
            return Self::Expired;
        }
        if total_minutes < MINUTES_PER_HOUR {
            return Self::Minutes(total_minutes);
        }
        Self::Hours {
            hours: total_minutes.checked_div(MINUTES_PER_HOUR).unwrap_or(0),
            minutes: total_minutes.checked_rem(MINUTES_PER_HOUR).unwrap_or(0),
        }
    }

    /// Render in the given style.
    pub fn label(self, style: CountdownStyle) -> String {
        Labelled(self, style).to_string()
    }
}

/// `ceil(ms / 60000)` for non-negative `ms`.
fn ceil_minutes(remaining_ms: i64) -> u64 {
    let whole = remaining_ms.checked_div(MILLIS_PER_MINUTE).unwrap_or(0);
    let partial = remaining_ms.checked_rem(MILLIS_PER_MINUTE).unwrap_or(0);
    let minutes = if partial > 0 {
        whole.saturating_add(1)
    } else {
        whole
    };
    u64::try_from(minutes).unwrap_or(0)
}

struct Labelled(Countdown, CountdownStyle);

impl fmt::Display for Labelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.1 {
            CountdownStyle::Long => " left",
            CountdownStyle::Short => "",
        };
        match self.0 {
            Countdown::Expired => match self.1 {
                CountdownStyle::Long => f.write_str("Expired"),
                CountdownStyle::Short => f.write_str("Ended"),
            },
            Countdown::Minutes(m) => write!(f, "{m}m{suffix}"),
            Countdown::Hours { hours, minutes: 0 } => write!(f, "{hours}h{suffix}"),
            Countdown::Hours { hours, minutes } => write!(f, "{hours}h {minutes}m{suffix}"),
        }
    }
}

/// Post-style label, e.g. `"1h 30m left"`.
pub fn format_countdown(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    Countdown::between(expires_at, now).label(CountdownStyle::Long)
}

/// Moment-style label, e.g. `"1h 30m"`.
pub fn format_short_countdown(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    Countdown::between(ends_at, now).label(CountdownStyle::Short)
}
