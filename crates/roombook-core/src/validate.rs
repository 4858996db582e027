//! Booking duration validation.

use chrono::{DateTime, Utc};

use crate::error::{SchedulingError, SchedulingResult};
use crate::policy::BookingPolicy;

/// Validates a candidate `[start, end)` pair against the duration and
/// lead-time policy.
///
/// Rules are checked in order and the first failure wins:
/// 1. the start must not be in the past,
/// 2. the end must be after the start,
/// 3. the duration must reach the policy minimum,
/// 4. the duration must not exceed the policy maximum.
///
/// Pure function of its inputs; the caller injects `now`.
pub fn validate_duration(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    policy: &BookingPolicy,
) -> SchedulingResult<()> {
    if start < now {
        return Err(SchedulingError::policy("Start time must be in the future"));
    }

    if end <= start {
        return Err(SchedulingError::policy(
            "End time must be after start time",
        ));
    }

    let duration_minutes = (end - start).num_minutes();

    if duration_minutes < policy.min_booking_minutes {
        return Err(SchedulingError::policy(format!(
            "Minimum booking duration is {} minutes",
            policy.min_booking_minutes
        )));
    }

    if duration_minutes > policy.max_booking_minutes() {
        return Err(SchedulingError::policy(format!(
            "Maximum booking duration is {} hours",
            policy.max_booking_hours
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn policy() -> BookingPolicy {
        BookingPolicy::default()
    }

    #[test]
    fn accepts_valid_interval() {
        let now = utc(2025, 6, 1, 12, 0, 0);
        let start = utc(2025, 6, 2, 10, 0, 0);
        let end = utc(2025, 6, 2, 11, 0, 0);
        assert!(validate_duration(start, end, now, &policy()).is_ok());
    }

    #[test]
    fn rejects_start_in_past() {
        let now = utc(2025, 6, 2, 10, 30, 0);
        let start = utc(2025, 6, 2, 10, 0, 0);
        let end = utc(2025, 6, 2, 11, 0, 0);
        let err = validate_duration(start, end, now, &policy()).unwrap_err();
        assert_eq!(err.to_string(), "Start time must be in the future");
    }

    #[test]
    fn rejects_inverted_interval() {
        let now = utc(2025, 6, 1, 12, 0, 0);
        let start = utc(2025, 6, 2, 11, 0, 0);
        let end = utc(2025, 6, 2, 10, 0, 0);
        let err = validate_duration(start, end, now, &policy()).unwrap_err();
        assert_eq!(err.to_string(), "End time must be after start time");
    }

    #[test]
    fn rejects_empty_interval() {
        let now = utc(2025, 6, 1, 12, 0, 0);
        let start = utc(2025, 6, 2, 10, 0, 0);
        let err = validate_duration(start, start, now, &policy()).unwrap_err();
        assert_eq!(err.to_string(), "End time must be after start time");
    }

    #[test]
    fn rejects_below_minimum() {
        let now = utc(2025, 6, 1, 12, 0, 0);
        let start = utc(2025, 6, 2, 10, 0, 0);
        let end = utc(2025, 6, 2, 10, 14, 0);
        let err = validate_duration(start, end, now, &policy()).unwrap_err();
        assert_eq!(err.to_string(), "Minimum booking duration is 15 minutes");
    }

    #[test]
    fn accepts_exact_minimum() {
        let now = utc(2025, 6, 1, 12, 0, 0);
        let start = utc(2025, 6, 2, 10, 0, 0);
        let end = utc(2025, 6, 2, 10, 15, 0);
        assert!(validate_duration(start, end, now, &policy()).is_ok());
    }

    #[test]
    fn rejects_above_maximum() {
        let now = utc(2025, 6, 1, 12, 0, 0);
        let start = utc(2025, 6, 2, 10, 0, 0);
        let end = utc(2025, 6, 2, 12, 1, 0);
        let err = validate_duration(start, end, now, &policy()).unwrap_err();
        assert_eq!(err.to_string(), "Maximum booking duration is 2 hours");
    }

    #[test]
    fn accepts_exact_maximum() {
        let now = utc(2025, 6, 1, 12, 0, 0);
        let start = utc(2025, 6, 2, 10, 0, 0);
        let end = utc(2025, 6, 2, 12, 0, 0);
        assert!(validate_duration(start, end, now, &policy()).is_ok());
    }

    #[test]
    fn past_start_wins_over_inverted_interval() {
        // First failure wins: both rules are violated, the past-start
        // message is the one reported.
        let now = utc(2025, 6, 2, 12, 0, 0);
        let start = utc(2025, 6, 2, 11, 0, 0);
        let end = utc(2025, 6, 2, 10, 0, 0);
        let err = validate_duration(start, end, now, &policy()).unwrap_err();
        assert_eq!(err.to_string(), "Start time must be in the future");
    }

    #[test]
    fn custom_policy_bounds() {
        let policy = BookingPolicy::default()
            .with_min_booking_minutes(30)
            .with_max_booking_hours(1);
        let now = utc(2025, 6, 1, 12, 0, 0);
        let start = utc(2025, 6, 2, 10, 0, 0);

        let err =
            validate_duration(start, utc(2025, 6, 2, 10, 20, 0), now, &policy).unwrap_err();
        assert_eq!(err.to_string(), "Minimum booking duration is 30 minutes");

        let err =
            validate_duration(start, utc(2025, 6, 2, 11, 30, 0), now, &policy).unwrap_err();
        assert_eq!(err.to_string(), "Maximum booking duration is 1 hours");
    }
}
