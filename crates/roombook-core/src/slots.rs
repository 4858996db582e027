//! Free-slot discovery.
//!
//! Walks a cursor across the business-hours window of a calendar day,
//! emitting the maximal gaps left between buffered bookings. A gap is
//! only reported when it satisfies the requested minimum duration.

use chrono::NaiveDate;

use crate::booking::{AvailableSlot, Booking};
use crate::policy::BookingPolicy;
use crate::time::{TimeWindow, add_buffer, subtract_buffer};

/// Computes the free slots of one resource on one calendar day.
///
/// `bookings` is the day's candidate set as supplied by the caller
/// (cancelled bookings should already be excluded). Bookings whose start
/// does not fall on `day` are ignored; the rest are processed in start
/// order. Each booking blocks its own interval extended by the policy
/// buffer on both ends, and the gaps between blocked intervals inside
/// `[business_open, business_close)` become slots when they reach
/// `min_duration_minutes`.
///
/// Overlapping or out-of-order input is tolerated: the cursor only ever
/// moves forward. Results are in chronological order.
pub fn find_available_slots(
    bookings: &[Booking],
    day: NaiveDate,
    min_duration_minutes: i64,
    policy: &BookingPolicy,
) -> Vec<AvailableSlot> {
    let window = TimeWindow::business_hours(day, policy);

    let mut on_day: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.start_time.date_naive() == day)
        .collect();
    on_day.sort_by_key(|b| b.start_time);

    let mut slots = Vec::new();
    let mut cursor = window.start;

    for booking in on_day {
        let buffered_start = subtract_buffer(booking.start_time, policy.buffer_minutes);
        // Clamp to the window so a booking past closing time cannot
        // produce a slot outside business hours.
        let gap_end = buffered_start.min(window.end);
        if cursor < gap_end {
            let gap = TimeWindow::new(cursor, gap_end);
            if gap.duration_minutes() >= min_duration_minutes {
                slots.push(AvailableSlot::from_window(gap));
            }
        }

        let buffered_end = add_buffer(booking.end_time, policy.buffer_minutes);
        cursor = cursor.max(buffered_end);
    }

    if cursor < window.end {
        let gap = TimeWindow::new(cursor, window.end);
        if gap.duration_minutes() >= min_duration_minutes {
            slots.push(AvailableSlot::from_window(gap));
        }
    }

    slots
}
