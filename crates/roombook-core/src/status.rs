//! Time-based status resolution and the transition state machine.

use chrono::{DateTime, Utc};

use crate::booking::BookingStatus;

/// Derives the status a booking should have at `now`.
///
/// `now < start` is upcoming, `start <= now <= end` is ongoing, anything
/// later is past. The end instant counts as still ongoing, matching the
/// behavior callers of the listing API rely on, even though the booked
/// interval itself is half-open.
pub fn time_based_status(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> BookingStatus {
    if now < start {
        BookingStatus::Upcoming
    } else if now <= end {
        BookingStatus::Ongoing
    } else {
        BookingStatus::Past
    }
}

/// Decides whether a status transition is permitted.
///
/// The rules, applied uniformly to explicit updates and reconciliation:
/// - `past` and `cancelled` are terminal; nothing leaves them.
/// - `cancelled` is reachable from any non-terminal state.
/// - Otherwise only the single forward step along
///   `upcoming -> ongoing -> past` is allowed. Reverting, repeating, or
///   skipping a step is rejected.
pub fn is_transition_allowed(current: BookingStatus, candidate: BookingStatus) -> bool {
    if current.is_terminal() {
        return false;
    }
    if candidate == BookingStatus::Cancelled {
        return true;
    }
    match (current.position(), candidate.position()) {
        (Some(from), Some(to)) => to == from + 1,
        _ => false,
    }
}

/// The audit wording for an applied transition.
pub fn transition_reason(old: BookingStatus, new: BookingStatus) -> String {
    format!("status transition {old} -> {new} per current time")
}
