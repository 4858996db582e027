//! The booking service.
//!
//! These are the operations an HTTP or CLI layer calls: the
//! validate-then-check-then-create pipeline for new bookings, slot
//! discovery, explicit status transitions, and the resource CRUD that
//! guards name uniqueness. The service owns no state beyond the policy;
//! everything it knows comes from the store and the injected clock.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use roombook_core::{
    AvailableSlot, Booking, BookingPolicy, BookingStatus, NewBooking, Resource, SchedulingError,
    TimeWindow, detect_conflicts, find_available_slots, is_transition_allowed, time_based_status,
    validate_duration,
};

use crate::error::{EngineError, EngineResult};
use crate::store::{BookingQuery, BookingStore};

/// The availability answer for one resource on one day.
#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    /// The resource the slots belong to.
    pub resource: Resource,
    /// The day that was searched.
    pub date: NaiveDate,
    /// Number of slots found.
    pub total_slots: usize,
    /// The free slots, in chronological order.
    pub available_slots: Vec<AvailableSlot>,
}

/// A booking enriched for listings: the owning resource's name and the
/// status the clock currently implies.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    /// Name of the booked resource.
    pub resource_name: String,
    /// Derived status: the stored value for cancelled bookings, the
    /// time-based status for everything else.
    pub effective_status: BookingStatus,
    /// The stored booking.
    #[serde(flatten)]
    pub booking: Booking,
}

/// A booking listing, flat and grouped by resource name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookingList {
    /// All matching bookings in start order.
    pub bookings: Vec<BookingView>,
    /// The same bookings grouped by resource name.
    pub grouped: BTreeMap<String, Vec<BookingView>>,
}

/// The operations exposed to the engine's callers.
pub struct BookingService<S> {
    store: Arc<S>,
    policy: BookingPolicy,
}

impl<S: BookingStore> BookingService<S> {
    /// Creates a service with the default policy.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_policy(store, BookingPolicy::default())
    }

    /// Creates a service with a custom policy.
    pub fn with_policy(store: Arc<S>, policy: BookingPolicy) -> Self {
        Self { store, policy }
    }

    /// Returns the active policy.
    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Runs the full admission check for a candidate booking without
    /// persisting anything: duration rules, resource existence, then
    /// the buffered conflict test against the store's coarse prefilter.
    pub async fn validate_and_detect_conflicts(
        &self,
        resource_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        validate_duration(start, end, now, &self.policy)?;
        let resource = self.require_resource(resource_id).await?;

        let candidate = TimeWindow::new(start, end);
        // Widen the query window by the buffer so bookings whose
        // buffered interval reaches into the candidate are fetched.
        let search = candidate.extend(self.policy.buffer_minutes);
        let existing = self
            .store
            .find_bookings_overlapping_window(resource_id, search, true)
            .await?;

        let report = detect_conflicts(&candidate, &existing, &self.policy);
        if report.has_conflict {
            debug!(
                resource = %resource.name,
                conflicts = report.conflicting.len(),
                "booking request conflicts with existing bookings"
            );
            let message = report
                .message
                .unwrap_or_else(|| "Conflicts with an existing booking".to_string());
            return Err(SchedulingError::policy(message).into());
        }
        Ok(())
    }

    /// Admits and persists a new booking in the `Upcoming` state.
    pub async fn create_booking(
        &self,
        request: NewBooking,
        now: DateTime<Utc>,
    ) -> EngineResult<Booking> {
        if request.requested_by.trim().is_empty() {
            return Err(SchedulingError::invalid_input("requester name is required").into());
        }

        self.validate_and_detect_conflicts(
            request.resource_id,
            request.start_time,
            request.end_time,
            now,
        )
        .await?;

        let booking = Booking::new(
            request.resource_id,
            request.start_time,
            request.end_time,
            request.requested_by,
            now,
        );
        let created = self.store.create_booking(booking).await?;
        info!(
            booking_id = %created.id,
            resource_id = %created.resource_id,
            requested_by = %created.requested_by,
            "booking created"
        );
        Ok(created)
    }

    /// Computes the free slots of a resource on a calendar day.
    pub async fn compute_available_slots(
        &self,
        resource_id: Uuid,
        day: NaiveDate,
        min_duration_minutes: i64,
    ) -> EngineResult<DayAvailability> {
        if min_duration_minutes <= 0 {
            return Err(
                SchedulingError::invalid_input("minimum duration must be positive").into(),
            );
        }
        let resource = self.require_resource(resource_id).await?;

        let bookings = self.store.find_bookings_on_day(resource_id, day).await?;
        let active: Vec<Booking> = bookings.into_iter().filter(|b| !b.is_cancelled()).collect();

        let slots = find_available_slots(&active, day, min_duration_minutes, &self.policy);
        debug!(
            resource = %resource.name,
            date = %day,
            slots = slots.len(),
            "computed availability"
        );
        Ok(DayAvailability {
            resource,
            date: day,
            total_slots: slots.len(),
            available_slots: slots,
        })
    }

    /// Applies an explicit status transition if the state machine
    /// permits it.
    pub async fn resolve_status_transition(
        &self,
        booking_id: Uuid,
        requested: BookingStatus,
        now: DateTime<Utc>,
    ) -> EngineResult<Booking> {
        let booking = self.require_booking(booking_id).await?;
        if !is_transition_allowed(booking.status, requested) {
            return Err(SchedulingError::illegal_transition(format!(
                "cannot move booking from {} to {}",
                booking.status, requested
            ))
            .into());
        }
        let updated = self
            .store
            .update_booking_status(booking_id, requested, now)
            .await?;
        info!(
            booking_id = %booking_id,
            from = %booking.status,
            to = %requested,
            "booking status updated"
        );
        Ok(updated)
    }

    /// Cancels a booking. Allowed from any non-terminal state.
    pub async fn cancel_booking(&self, id: Uuid, now: DateTime<Utc>) -> EngineResult<Booking> {
        self.resolve_status_transition(id, BookingStatus::Cancelled, now)
            .await
    }

    /// Looks up one booking.
    pub async fn get_booking(&self, id: Uuid) -> EngineResult<Booking> {
        self.require_booking(id).await
    }

    /// Removes a booking entirely.
    pub async fn delete_booking(&self, id: Uuid) -> EngineResult<()> {
        self.require_booking(id).await?;
        self.store.delete_booking(id).await?;
        info!(booking_id = %id, "booking deleted");
        Ok(())
    }

    /// Lists bookings with their clock-derived status, flat and grouped
    /// by resource name.
    pub async fn list_bookings(
        &self,
        query: BookingQuery,
        now: DateTime<Utc>,
    ) -> EngineResult<BookingList> {
        let names: HashMap<Uuid, String> = self
            .store
            .list_resources()
            .await?
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect();

        let mut views = Vec::new();
        for booking in self.store.list_bookings(query).await? {
            let resource_name = names
                .get(&booking.resource_id)
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
            let effective_status = if booking.is_cancelled() {
                BookingStatus::Cancelled
            } else {
                time_based_status(booking.start_time, booking.end_time, now)
            };
            views.push(BookingView {
                resource_name,
                effective_status,
                booking,
            });
        }

        let mut grouped: BTreeMap<String, Vec<BookingView>> = BTreeMap::new();
        for view in &views {
            grouped
                .entry(view.resource_name.clone())
                .or_default()
                .push(view.clone());
        }
        Ok(BookingList {
            bookings: views,
            grouped,
        })
    }

    /// Creates a resource, enforcing name uniqueness.
    pub async fn create_resource(
        &self,
        name: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Resource> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SchedulingError::invalid_input("resource name is required").into());
        }
        if self.store.find_resource_by_name(name).await?.is_some() {
            return Err(
                SchedulingError::policy(format!("Resource \"{name}\" already exists")).into(),
            );
        }
        let created = self.store.create_resource(Resource::new(name, now)).await?;
        info!(resource_id = %created.id, name = %created.name, "resource created");
        Ok(created)
    }

    /// Renames a resource. The collision check only fires when the name
    /// actually changes, so renaming a resource to its current name is
    /// a no-op rather than an error.
    pub async fn rename_resource(
        &self,
        id: Uuid,
        name: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Resource> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SchedulingError::invalid_input("resource name is required").into());
        }
        let resource = self.require_resource(id).await?;
        if name != resource.name
            && self.store.find_resource_by_name(name).await?.is_some()
        {
            return Err(
                SchedulingError::policy(format!("Resource \"{name}\" already exists")).into(),
            );
        }
        let renamed = self.store.rename_resource(id, name, now).await?;
        info!(resource_id = %id, name = %renamed.name, "resource renamed");
        Ok(renamed)
    }

    /// Deletes a resource. The store refuses while bookings still
    /// reference it.
    pub async fn delete_resource(&self, id: Uuid) -> EngineResult<()> {
        self.require_resource(id).await?;
        self.store.delete_resource(id).await?;
        info!(resource_id = %id, "resource deleted");
        Ok(())
    }

    /// Looks up one resource.
    pub async fn get_resource(&self, id: Uuid) -> EngineResult<Resource> {
        self.require_resource(id).await
    }

    /// Lists all resources.
    pub async fn list_resources(&self) -> EngineResult<Vec<Resource>> {
        Ok(self.store.list_resources().await?)
    }

    async fn require_resource(&self, id: Uuid) -> EngineResult<Resource> {
        self.store
            .find_resource_by_id(id)
            .await?
            .ok_or_else(|| EngineError::from(SchedulingError::not_found("Resource")))
    }

    async fn require_booking(&self, id: Uuid) -> EngineResult<Booking> {
        self.store
            .find_booking(id)
            .await?
            .ok_or_else(|| EngineError::from(SchedulingError::not_found("Booking")))
    }
}
