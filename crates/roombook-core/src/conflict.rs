//! Buffered conflict detection.
//!
//! A candidate interval conflicts with an existing booking when it
//! overlaps the booking's *buffered* interval: the reserved window
//! extended by the policy buffer on both ends. The buffer guarantees
//! turnover time between consecutive occupancies of the same resource
//! and is a hard constraint, not a warning.

use serde::Serialize;

use crate::booking::Booking;
use crate::policy::BookingPolicy;
use crate::time::TimeWindow;

/// The outcome of a conflict check.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictReport {
    /// True iff at least one existing booking conflicts.
    pub has_conflict: bool,
    /// Every existing booking whose buffered interval overlaps the
    /// candidate, in the order they were supplied.
    pub conflicting: Vec<Booking>,
    /// Human-readable summary, present only when a conflict exists.
    pub message: Option<String>,
}

/// Checks a candidate interval against the existing bookings of one
/// resource.
///
/// The candidate conflicts with a booking iff it overlaps the booking's
/// window extended by `policy.buffer_minutes` on both ends (half-open
/// overlap test). All conflicting bookings are collected, not just the
/// first.
///
/// Callers must exclude cancelled bookings from `existing` before
/// invoking this check; the detector does not filter by status.
pub fn detect_conflicts(
    candidate: &TimeWindow,
    existing: &[Booking],
    policy: &BookingPolicy,
) -> ConflictReport {
    let conflicting: Vec<Booking> = existing
        .iter()
        .filter(|booking| {
            let buffered = booking.window().extend(policy.buffer_minutes);
            candidate.overlaps(&buffered)
        })
        .cloned()
        .collect();

    let message = if conflicting.is_empty() {
        None
    } else {
        Some(format!(
            "Conflicts with {} existing booking(s). Note: {}-minute buffer time is applied before and after each booking.",
            conflicting.len(),
            policy.buffer_minutes
        ))
    };

    ConflictReport {
        has_conflict: !conflicting.is_empty(),
        conflicting,
        message,
    }
}
