//! The booking store boundary.
//!
//! [`BookingStore`] is the contract a persistence layer must satisfy.
//! The engine performs the authoritative policy checks in-core; the
//! store is only asked for coarse time-range prefilters and atomic
//! per-booking writes. [`MemoryStore`] is the reference implementation
//! used by the demo daemon and the tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use roombook_core::{Booking, BookingStatus, Resource, TimeWindow};

/// Errors reported by a booking store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested entity does not exist.
    #[error("{what} not found")]
    NotFound { what: String },

    /// A resource with the same name already exists.
    #[error("resource name already exists: {name}")]
    DuplicateName { name: String },

    /// The resource still has bookings referencing it.
    #[error("resource has bookings and cannot be deleted")]
    HasBookings,

    /// The store itself failed (I/O, connection loss, ...).
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates a duplicate name error.
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Filter for booking listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingQuery {
    /// Restrict to one resource.
    pub resource_id: Option<Uuid>,
    /// Restrict to bookings starting on one calendar day.
    pub day: Option<NaiveDate>,
}

impl BookingQuery {
    /// Builder: restrict to one resource.
    pub fn for_resource(mut self, id: Uuid) -> Self {
        self.resource_id = Some(id);
        self
    }

    /// Builder: restrict to one calendar day.
    pub fn on_day(mut self, day: NaiveDate) -> Self {
        self.day = Some(day);
        self
    }
}

/// The persistence contract of the scheduling engine.
///
/// The conflict-check-then-create sequence is a check-then-act race
/// under concurrent writers. Real implementations must back the engine
/// with either a serializable transaction wrapping read-check-write, or
/// a storage-level exclusion constraint on overlapping buffered
/// intervals per resource. Each `update_booking_status` call must be an
/// independent atomic unit keyed by booking id: concurrent passes may
/// lose an update (the next pass self-corrects) but must never observe
/// a torn status value.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Looks up a resource by id.
    async fn find_resource_by_id(&self, id: Uuid) -> Result<Option<Resource>, StoreError>;

    /// Looks up a resource by its unique name.
    async fn find_resource_by_name(&self, name: &str) -> Result<Option<Resource>, StoreError>;

    /// Lists all resources, sorted by name.
    async fn list_resources(&self) -> Result<Vec<Resource>, StoreError>;

    /// Persists a new resource. Fails on a duplicate name.
    async fn create_resource(&self, resource: Resource) -> Result<Resource, StoreError>;

    /// Renames a resource. Fails if another resource holds the name.
    async fn rename_resource(
        &self,
        id: Uuid,
        name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Resource, StoreError>;

    /// Deletes a resource. Fails while bookings still reference it.
    async fn delete_resource(&self, id: Uuid) -> Result<(), StoreError>;

    /// Looks up a booking by id.
    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    /// Returns the bookings of a resource whose raw interval overlaps
    /// the given window, sorted by start time. This is the coarse
    /// prefilter; the buffered conflict test happens in-core.
    async fn find_bookings_overlapping_window(
        &self,
        resource_id: Uuid,
        window: TimeWindow,
        exclude_cancelled: bool,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Returns the bookings of a resource starting on the given
    /// calendar day, sorted by start time.
    async fn find_bookings_on_day(
        &self,
        resource_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Returns every booking currently stored with the given status.
    async fn find_bookings_by_status(
        &self,
        status: BookingStatus,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Lists bookings matching the query, sorted by start time.
    async fn list_bookings(&self, query: BookingQuery) -> Result<Vec<Booking>, StoreError>;

    /// Persists a new booking.
    async fn create_booking(&self, booking: Booking) -> Result<Booking, StoreError>;

    /// Atomically replaces the stored status of one booking.
    async fn update_booking_status(
        &self,
        id: Uuid,
        new_status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Booking, StoreError>;

    /// Removes a booking.
    async fn delete_booking(&self, id: Uuid) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct StoreInner {
    resources: HashMap<Uuid, Resource>,
    bookings: HashMap<Uuid, Booking>,
}

/// In-memory reference store.
///
/// All mutations happen under a single write lock, which trivially
/// satisfies the atomicity contract of [`BookingStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_start(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by_key(|b| b.start_time);
    bookings
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_resource_by_id(&self, id: Uuid) -> Result<Option<Resource>, StoreError> {
        Ok(self.inner.read().await.resources.get(&id).cloned())
    }

    async fn find_resource_by_name(&self, name: &str) -> Result<Option<Resource>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.resources.values().find(|r| r.name == name).cloned())
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, StoreError> {
        let inner = self.inner.read().await;
        let mut resources: Vec<Resource> = inner.resources.values().cloned().collect();
        resources.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(resources)
    }

    async fn create_resource(&self, resource: Resource) -> Result<Resource, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.resources.values().any(|r| r.name == resource.name) {
            return Err(StoreError::duplicate_name(&resource.name));
        }
        debug!(resource_id = %resource.id, name = %resource.name, "created resource");
        inner.resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn rename_resource(
        &self,
        id: Uuid,
        name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Resource, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .resources
            .values()
            .any(|r| r.name == name && r.id != id)
        {
            return Err(StoreError::duplicate_name(name));
        }
        let resource = inner
            .resources
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Resource"))?;
        resource.name = name.to_string();
        resource.updated_at = updated_at;
        Ok(resource.clone())
    }

    async fn delete_resource(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.resources.contains_key(&id) {
            return Err(StoreError::not_found("Resource"));
        }
        if inner.bookings.values().any(|b| b.resource_id == id) {
            return Err(StoreError::HasBookings);
        }
        inner.resources.remove(&id);
        debug!(resource_id = %id, "deleted resource");
        Ok(())
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.inner.read().await.bookings.get(&id).cloned())
    }

    async fn find_bookings_overlapping_window(
        &self,
        resource_id: Uuid,
        window: TimeWindow,
        exclude_cancelled: bool,
    ) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.read().await;
        let hits = inner
            .bookings
            .values()
            .filter(|b| b.resource_id == resource_id)
            .filter(|b| !(exclude_cancelled && b.is_cancelled()))
            .filter(|b| b.window().overlaps(&window))
            .cloned()
            .collect();
        Ok(sorted_by_start(hits))
    }

    async fn find_bookings_on_day(
        &self,
        resource_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.read().await;
        let hits = inner
            .bookings
            .values()
            .filter(|b| b.resource_id == resource_id)
            .filter(|b| b.start_time.date_naive() == day)
            .cloned()
            .collect();
        Ok(sorted_by_start(hits))
    }

    async fn find_bookings_by_status(
        &self,
        status: BookingStatus,
    ) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.read().await;
        let hits = inner
            .bookings
            .values()
            .filter(|b| b.status == status)
            .cloned()
            .collect();
        Ok(sorted_by_start(hits))
    }

    async fn list_bookings(&self, query: BookingQuery) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.read().await;
        let hits = inner
            .bookings
            .values()
            .filter(|b| query.resource_id.is_none_or(|id| b.resource_id == id))
            .filter(|b| query.day.is_none_or(|d| b.start_time.date_naive() == d))
            .cloned()
            .collect();
        Ok(sorted_by_start(hits))
    }

    async fn create_booking(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut inner = self.inner.write().await;
        debug!(booking_id = %booking.id, resource_id = %booking.resource_id, "created booking");
        inner.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        new_status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Booking, StoreError> {
        let mut inner = self.inner.write().await;
        let booking = inner
            .bookings
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Booking"))?;
        booking.status = new_status;
        booking.updated_at = updated_at;
        Ok(booking.clone())
    }

    async fn delete_booking(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .bookings
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Booking"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn booking(resource_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Booking {
        Booking::new(resource_id, start, end, "Someone", utc(2025, 6, 1, 0, 0, 0))
    }

    #[tokio::test]
    async fn resource_roundtrip() {
        let store = MemoryStore::new();
        let now = utc(2025, 6, 1, 12, 0, 0);
        let created = store
            .create_resource(Resource::new("Conference Room A", now))
            .await
            .unwrap();

        let by_id = store.find_resource_by_id(created.id).await.unwrap();
        assert_eq!(by_id.as_ref(), Some(&created));

        let by_name = store.find_resource_by_name("Conference Room A").await.unwrap();
        assert_eq!(by_name, Some(created));

        assert!(store.find_resource_by_name("Missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_resource_name_rejected() {
        let store = MemoryStore::new();
        let now = utc(2025, 6, 1, 12, 0, 0);
        store
            .create_resource(Resource::new("Projector Unit 1", now))
            .await
            .unwrap();

        let err = store
            .create_resource(Resource::new("Projector Unit 1", now))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::duplicate_name("Projector Unit 1")
        );
    }

    #[tokio::test]
    async fn rename_allows_own_name_but_not_anothers() {
        let store = MemoryStore::new();
        let now = utc(2025, 6, 1, 12, 0, 0);
        let a = store
            .create_resource(Resource::new("Room A", now))
            .await
            .unwrap();
        store
            .create_resource(Resource::new("Room B", now))
            .await
            .unwrap();

        // Renaming to its own current name is a no-op, not a collision.
        let later = utc(2025, 6, 1, 13, 0, 0);
        let renamed = store.rename_resource(a.id, "Room A", later).await.unwrap();
        assert_eq!(renamed.name, "Room A");
        assert_eq!(renamed.updated_at, later);

        let err = store.rename_resource(a.id, "Room B", later).await.unwrap_err();
        assert_eq!(err, StoreError::duplicate_name("Room B"));
    }

    #[tokio::test]
    async fn list_resources_sorted_by_name() {
        let store = MemoryStore::new();
        let now = utc(2025, 6, 1, 12, 0, 0);
        store.create_resource(Resource::new("Laptop Cart", now)).await.unwrap();
        store.create_resource(Resource::new("Conference Room A", now)).await.unwrap();

        let names: Vec<String> = store
            .list_resources()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Conference Room A", "Laptop Cart"]);
    }

    #[tokio::test]
    async fn delete_resource_blocked_by_bookings() {
        let store = MemoryStore::new();
        let now = utc(2025, 6, 1, 12, 0, 0);
        let resource = store
            .create_resource(Resource::new("Room A", now))
            .await
            .unwrap();
        store
            .create_booking(booking(
                resource.id,
                utc(2025, 6, 2, 10, 0, 0),
                utc(2025, 6, 2, 11, 0, 0),
            ))
            .await
            .unwrap();

        let err = store.delete_resource(resource.id).await.unwrap_err();
        assert_eq!(err, StoreError::HasBookings);
        assert!(store.find_resource_by_id(resource.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn overlap_query_uses_half_open_raw_intervals() {
        let store = MemoryStore::new();
        let resource_id = Uuid::new_v4();
        store
            .create_booking(booking(
                resource_id,
                utc(2025, 6, 2, 10, 0, 0),
                utc(2025, 6, 2, 11, 0, 0),
            ))
            .await
            .unwrap();

        // Adjacent window: no overlap under half-open semantics.
        let adjacent = TimeWindow::new(utc(2025, 6, 2, 11, 0, 0), utc(2025, 6, 2, 12, 0, 0));
        assert!(store
            .find_bookings_overlapping_window(resource_id, adjacent, true)
            .await
            .unwrap()
            .is_empty());

        let overlapping = TimeWindow::new(utc(2025, 6, 2, 10, 30, 0), utc(2025, 6, 2, 12, 0, 0));
        assert_eq!(
            store
                .find_bookings_overlapping_window(resource_id, overlapping, true)
                .await
                .unwrap()
                .len(),
            1
        );

        // A different resource sees nothing.
        assert!(store
            .find_bookings_overlapping_window(Uuid::new_v4(), overlapping, true)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn overlap_query_can_exclude_cancelled() {
        let store = MemoryStore::new();
        let resource_id = Uuid::new_v4();
        let mut cancelled = booking(
            resource_id,
            utc(2025, 6, 2, 10, 0, 0),
            utc(2025, 6, 2, 11, 0, 0),
        );
        cancelled.status = BookingStatus::Cancelled;
        store.create_booking(cancelled).await.unwrap();

        let window = TimeWindow::new(utc(2025, 6, 2, 9, 0, 0), utc(2025, 6, 2, 12, 0, 0));
        assert!(store
            .find_bookings_overlapping_window(resource_id, window, true)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .find_bookings_overlapping_window(resource_id, window, false)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn on_day_query_sorted_by_start() {
        let store = MemoryStore::new();
        let resource_id = Uuid::new_v4();
        store
            .create_booking(booking(
                resource_id,
                utc(2025, 6, 2, 14, 0, 0),
                utc(2025, 6, 2, 15, 0, 0),
            ))
            .await
            .unwrap();
        store
            .create_booking(booking(
                resource_id,
                utc(2025, 6, 2, 9, 0, 0),
                utc(2025, 6, 2, 10, 0, 0),
            ))
            .await
            .unwrap();
        store
            .create_booking(booking(
                resource_id,
                utc(2025, 6, 3, 9, 0, 0),
                utc(2025, 6, 3, 10, 0, 0),
            ))
            .await
            .unwrap();

        let hits = store
            .find_bookings_on_day(resource_id, date(2025, 6, 2))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].start_time < hits[1].start_time);
    }

    #[tokio::test]
    async fn status_update_is_persisted_with_timestamp() {
        let store = MemoryStore::new();
        let created = store
            .create_booking(booking(
                Uuid::new_v4(),
                utc(2025, 6, 2, 10, 0, 0),
                utc(2025, 6, 2, 11, 0, 0),
            ))
            .await
            .unwrap();

        let later = utc(2025, 6, 2, 10, 5, 0);
        let updated = store
            .update_booking_status(created.id, BookingStatus::Ongoing, later)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Ongoing);
        assert_eq!(updated.updated_at, later);

        let fetched = store.find_booking(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, BookingStatus::Ongoing);

        let by_status = store
            .find_bookings_by_status(BookingStatus::Ongoing)
            .await
            .unwrap();
        assert_eq!(by_status.len(), 1);
    }

    #[tokio::test]
    async fn update_missing_booking_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_booking_status(Uuid::new_v4(), BookingStatus::Past, utc(2025, 6, 2, 0, 0, 0))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::not_found("Booking"));
    }

    #[tokio::test]
    async fn list_bookings_applies_query_filters() {
        let store = MemoryStore::new();
        let room_a = Uuid::new_v4();
        let room_b = Uuid::new_v4();
        store
            .create_booking(booking(room_a, utc(2025, 6, 2, 9, 0, 0), utc(2025, 6, 2, 10, 0, 0)))
            .await
            .unwrap();
        store
            .create_booking(booking(room_b, utc(2025, 6, 2, 11, 0, 0), utc(2025, 6, 2, 12, 0, 0)))
            .await
            .unwrap();
        store
            .create_booking(booking(room_a, utc(2025, 6, 3, 9, 0, 0), utc(2025, 6, 3, 10, 0, 0)))
            .await
            .unwrap();

        let all = store.list_bookings(BookingQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let only_a = store
            .list_bookings(BookingQuery::default().for_resource(room_a))
            .await
            .unwrap();
        assert_eq!(only_a.len(), 2);

        let on_day = store
            .list_bookings(BookingQuery::default().on_day(date(2025, 6, 2)))
            .await
            .unwrap();
        assert_eq!(on_day.len(), 2);

        let both = store
            .list_bookings(BookingQuery::default().for_resource(room_a).on_day(date(2025, 6, 2)))
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
    }

    #[tokio::test]
    async fn delete_booking_roundtrip() {
        let store = MemoryStore::new();
        let created = store
            .create_booking(booking(
                Uuid::new_v4(),
                utc(2025, 6, 2, 10, 0, 0),
                utc(2025, 6, 2, 11, 0, 0),
            ))
            .await
            .unwrap();

        store.delete_booking(created.id).await.unwrap();
        assert!(store.find_booking(created.id).await.unwrap().is_none());

        let err = store.delete_booking(created.id).await.unwrap_err();
        assert_eq!(err, StoreError::not_found("Booking"));
    }
}
