//! Domain types for resources and reservations.
//!
//! This module provides the core entities:
//! - [`Resource`]: an exclusively-bookable unit (a room, a projector)
//! - [`Booking`]: a reservation of one resource for a half-open interval
//! - [`BookingStatus`]: the booking lifecycle state
//! - [`AvailableSlot`]: a derived free interval, never stored
//! - [`BookingStatusUpdate`]: the audit record emitted by reconciliation

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::TimeWindow;

/// An exclusively-bookable unit identified by a unique name.
///
/// Each resource is a single unit; there is no capacity or quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier.
    pub id: Uuid,
    /// Unique human-facing name.
    pub name: String,
    /// When the resource was created.
    pub created_at: DateTime<Utc>,
    /// When the resource was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Creates a new resource with a fresh identifier.
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The lifecycle state of a booking.
///
/// Progression is strictly forward along `Upcoming -> Ongoing -> Past`;
/// `Cancelled` is reachable from any non-terminal state. `Past` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// The booking has not started yet.
    Upcoming,
    /// The booking is currently in progress.
    Ongoing,
    /// The booking window has elapsed.
    Past,
    /// The booking was cancelled before completion.
    Cancelled,
}

impl BookingStatus {
    /// Position in the forward progression, or `None` for `Cancelled`
    /// which sits outside the sequence.
    pub fn position(&self) -> Option<u8> {
        match self {
            Self::Upcoming => Some(0),
            Self::Ongoing => Some(1),
            Self::Past => Some(2),
            Self::Cancelled => None,
        }
    }

    /// Returns true if no transition may leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Past | Self::Cancelled)
    }

    /// Returns the lowercase name used in messages and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Past => "past",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation of one resource for the half-open interval
/// `[start_time, end_time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier.
    pub id: Uuid,
    /// The reserved resource.
    pub resource_id: Uuid,
    /// Start of the reservation (inclusive).
    pub start_time: DateTime<Utc>,
    /// End of the reservation (exclusive).
    pub end_time: DateTime<Utc>,
    /// Free-text requester name.
    pub requested_by: String,
    /// Stored lifecycle status. The authoritative value; listings may
    /// additionally derive a time-based view from the clock.
    pub status: BookingStatus,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// When the booking was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a new booking in the initial `Upcoming` state.
    pub fn new(
        resource_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        requested_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_id,
            start_time,
            end_time,
            requested_by: requested_by.into(),
            status: BookingStatus::Upcoming,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the reserved interval as a [`TimeWindow`].
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }

    /// Returns the booking duration in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        self.window().duration_minutes()
    }

    /// Returns true if the booking has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }
}

/// The fields required to request a new booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    /// The resource to reserve.
    pub resource_id: Uuid,
    /// Requested start (inclusive).
    pub start_time: DateTime<Utc>,
    /// Requested end (exclusive).
    pub end_time: DateTime<Utc>,
    /// Free-text requester name.
    pub requested_by: String,
}

/// A contiguous free interval within business hours.
///
/// Derived on demand by slot discovery; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    /// Start of the free interval (inclusive).
    pub start: DateTime<Utc>,
    /// End of the free interval (exclusive).
    pub end: DateTime<Utc>,
    /// Length of the interval in whole minutes.
    pub duration_minutes: i64,
}

impl AvailableSlot {
    /// Creates a slot from a window, computing the minute duration.
    pub fn from_window(window: TimeWindow) -> Self {
        Self {
            start: window.start,
            end: window.end,
            duration_minutes: window.duration_minutes(),
        }
    }
}

/// Audit record for one status change applied by a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStatusUpdate {
    /// The booking that changed.
    pub id: Uuid,
    /// Status before the change.
    pub old_status: BookingStatus,
    /// Status after the change.
    pub new_status: BookingStatus,
    /// Human-readable explanation of why the change was applied.
    pub reason: String,
}
