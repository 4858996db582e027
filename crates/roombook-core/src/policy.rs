//! Booking policy configuration.
//!
//! All scheduling constants live here rather than being hardcoded in the
//! algorithms: the buffer between bookings, the duration bounds, and the
//! business-hours window used for slot discovery.

use chrono::NaiveTime;

/// Policy knobs for booking validation, conflict detection, and slot
/// discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Mandatory idle gap before and after every booking, in minutes.
    pub buffer_minutes: i64,
    /// Shortest bookable duration, in minutes.
    pub min_booking_minutes: i64,
    /// Longest bookable duration, in hours.
    pub max_booking_hours: i64,
    /// Start of the bookable day.
    pub business_open: NaiveTime,
    /// End of the bookable day (exclusive).
    pub business_close: NaiveTime,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            buffer_minutes: 10,
            min_booking_minutes: 15,
            max_booking_hours: 2,
            business_open: NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
            business_close: NaiveTime::from_hms_opt(20, 0, 0).expect("valid time"),
        }
    }
}

impl BookingPolicy {
    /// Builder: set the buffer width in minutes.
    pub fn with_buffer_minutes(mut self, minutes: i64) -> Self {
        self.buffer_minutes = minutes;
        self
    }

    /// Builder: set the minimum booking duration in minutes.
    pub fn with_min_booking_minutes(mut self, minutes: i64) -> Self {
        self.min_booking_minutes = minutes;
        self
    }

    /// Builder: set the maximum booking duration in hours.
    pub fn with_max_booking_hours(mut self, hours: i64) -> Self {
        self.max_booking_hours = hours;
        self
    }

    /// Builder: set the business-hours window.
    pub fn with_business_hours(mut self, open: NaiveTime, close: NaiveTime) -> Self {
        self.business_open = open;
        self.business_close = close;
        self
    }

    /// Maximum booking duration expressed in minutes.
    pub fn max_booking_minutes(&self) -> i64 {
        self.max_booking_hours * 60
    }
}
