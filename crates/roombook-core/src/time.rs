//! Time arithmetic for reservations.
//!
//! This module provides the buffer-shifting helpers and [`TimeWindow`],
//! the half-open interval `[start, end)` every other component reasons
//! about. All instants are UTC; the engine runs against a single
//! reference clock.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::BookingPolicy;

/// Shifts an instant forward by the given number of minutes.
pub fn add_buffer(t: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    t + Duration::minutes(minutes)
}

/// Shifts an instant backward by the given number of minutes.
pub fn subtract_buffer(t: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    t - Duration::minutes(minutes)
}

/// A half-open time interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a time window from a start time and duration.
    pub fn from_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(start, start + duration)
    }

    /// Creates the window covering a whole calendar day, midnight to
    /// midnight UTC.
    pub fn for_day(day: NaiveDate) -> Self {
        let start = day.and_hms_opt(0, 0, 0).expect("valid time").and_utc();
        let end = day
            .succ_opt()
            .expect("valid successor date")
            .and_hms_opt(0, 0, 0)
            .expect("valid time")
            .and_utc();
        Self { start, end }
    }

    /// Creates the bookable window for a calendar day under the given
    /// policy's business hours.
    pub fn business_hours(day: NaiveDate, policy: &BookingPolicy) -> Self {
        Self {
            start: day.and_time(policy.business_open).and_utc(),
            end: day.and_time(policy.business_close).and_utc(),
        }
    }

    /// Returns the duration of this window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns the duration of this window in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Checks if an instant falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// Checks whether two half-open windows overlap.
    ///
    /// Adjacent windows (one ending exactly where the other starts) do
    /// not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Extends the window by the given number of minutes on both ends.
    ///
    /// This is the buffered view of a booking: the interval during which
    /// the resource is considered occupied, turnover time included.
    pub fn extend(&self, minutes: i64) -> Self {
        Self {
            start: subtract_buffer(self.start, minutes),
            end: add_buffer(self.end, minutes),
        }
    }
}
