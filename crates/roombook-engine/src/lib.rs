//! Engine: booking store boundary, service, reconciliation scheduler.
//!
//! This crate wires the pure scheduling core to its collaborators:
//! - the [`BookingStore`] trait, the contract a persistence layer must
//!   satisfy, with [`MemoryStore`] as the reference implementation
//! - the [`BookingService`], the operations an HTTP/CLI layer calls
//! - the [`Reconciler`], the sweeps that bring stored statuses into
//!   agreement with the clock
//! - the [`Scheduler`], the periodic driver for those sweeps

mod error;
mod reconcile;
mod scheduler;
mod service;
mod store;

pub use error::{EngineError, EngineResult};
pub use reconcile::{BookingStatistics, Reconciler};
pub use scheduler::{
    PassKind, Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState,
    SharedSchedulerState, new_scheduler_state,
};
pub use service::{BookingList, BookingService, BookingView, DayAvailability};
pub use store::{BookingQuery, BookingStore, MemoryStore, StoreError};
