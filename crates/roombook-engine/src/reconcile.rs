//! Status reconciliation sweeps.
//!
//! The general pass applies the single forward step the clock implies
//! to every live booking. Two narrower sweeps act as the escape hatch
//! for bookings the general pass cannot move: "overdue" bookings still
//! marked upcoming after their start, and "expired" bookings still
//! marked ongoing after their end. Each applied change produces an
//! audit record; a failure on one booking never aborts the rest of a
//! sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use roombook_core::{
    Booking, BookingStatus, BookingStatusUpdate, is_transition_allowed, time_based_status,
    transition_reason,
};

use crate::error::EngineResult;
use crate::store::BookingStore;

/// Counts of stored bookings per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BookingStatistics {
    pub upcoming: usize,
    pub ongoing: usize,
    pub past: usize,
    pub cancelled: usize,
}

impl BookingStatistics {
    /// Total number of stored bookings.
    pub fn total(&self) -> usize {
        self.upcoming + self.ongoing + self.past + self.cancelled
    }
}

/// Runs the reconciliation sweeps against a store.
pub struct Reconciler<S> {
    store: Arc<S>,
}

impl<S: BookingStore> Reconciler<S> {
    /// Creates a reconciler over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The general pass: recompute each live booking's time-based
    /// status and apply it where the state machine permits the step.
    ///
    /// A booking whose clock-implied status is more than one step ahead
    /// (upcoming while its whole window has already elapsed) is left
    /// alone here; the overdue sweep handles it.
    pub async fn run_pass(&self, now: DateTime<Utc>) -> EngineResult<Vec<BookingStatusUpdate>> {
        let mut updates = Vec::new();
        for status in [BookingStatus::Upcoming, BookingStatus::Ongoing] {
            for booking in self.store.find_bookings_by_status(status).await? {
                let candidate = time_based_status(booking.start_time, booking.end_time, now);
                if candidate == booking.status {
                    continue;
                }
                if !is_transition_allowed(booking.status, candidate) {
                    debug!(
                        booking_id = %booking.id,
                        from = %booking.status,
                        to = %candidate,
                        "transition outside the single-step rule, leaving for sweep"
                    );
                    continue;
                }
                let reason = transition_reason(booking.status, candidate);
                self.apply(&booking, candidate, reason, now, &mut updates)
                    .await;
            }
        }
        Ok(updates)
    }

    /// Forces bookings still marked upcoming after their start to the
    /// status the clock implies.
    pub async fn sweep_overdue(
        &self,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<BookingStatusUpdate>> {
        let mut updates = Vec::new();
        for booking in self
            .store
            .find_bookings_by_status(BookingStatus::Upcoming)
            .await?
        {
            if booking.start_time >= now {
                continue;
            }
            let forced = time_based_status(booking.start_time, booking.end_time, now);
            if forced == BookingStatus::Upcoming {
                continue;
            }
            let reason = format!(
                "overdue: booking started at {} but was still upcoming, forced to {}",
                booking.start_time, forced
            );
            self.apply(&booking, forced, reason, now, &mut updates).await;
        }
        Ok(updates)
    }

    /// Forces bookings still marked ongoing after their end to past.
    pub async fn sweep_expired(
        &self,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<BookingStatusUpdate>> {
        let mut updates = Vec::new();
        for booking in self
            .store
            .find_bookings_by_status(BookingStatus::Ongoing)
            .await?
        {
            if booking.end_time >= now {
                continue;
            }
            let reason = format!(
                "expired: booking ended at {} but was still ongoing, forced to past",
                booking.end_time
            );
            self.apply(&booking, BookingStatus::Past, reason, now, &mut updates)
                .await;
        }
        Ok(updates)
    }

    /// Counts stored bookings per status, for the periodic stats log.
    pub async fn statistics(&self) -> EngineResult<BookingStatistics> {
        Ok(BookingStatistics {
            upcoming: self
                .store
                .find_bookings_by_status(BookingStatus::Upcoming)
                .await?
                .len(),
            ongoing: self
                .store
                .find_bookings_by_status(BookingStatus::Ongoing)
                .await?
                .len(),
            past: self
                .store
                .find_bookings_by_status(BookingStatus::Past)
                .await?
                .len(),
            cancelled: self
                .store
                .find_bookings_by_status(BookingStatus::Cancelled)
                .await?
                .len(),
        })
    }

    /// Applies one status change, isolating failures to the booking.
    async fn apply(
        &self,
        booking: &Booking,
        new_status: BookingStatus,
        reason: String,
        now: DateTime<Utc>,
        updates: &mut Vec<BookingStatusUpdate>,
    ) {
        match self
            .store
            .update_booking_status(booking.id, new_status, now)
            .await
        {
            Ok(_) => {
                info!(
                    booking_id = %booking.id,
                    from = %booking.status,
                    to = %new_status,
                    reason = %reason,
                    "reconciled booking status"
                );
                updates.push(BookingStatusUpdate {
                    id: booking.id,
                    old_status: booking.status,
                    new_status,
                    reason,
                });
            }
            Err(err) => {
                warn!(
                    booking_id = %booking.id,
                    error = %err,
                    "failed to update booking status, continuing sweep"
                );
            }
        }
    }
}
