//! Core types: time windows, bookings, policy, conflicts, slots, status

pub mod booking;
pub mod conflict;
pub mod error;
pub mod policy;
pub mod slots;
pub mod status;
pub mod time;
pub mod tracing;
pub mod validate;

pub use booking::{
    AvailableSlot, Booking, BookingStatus, BookingStatusUpdate, NewBooking, Resource,
};
pub use conflict::{ConflictReport, detect_conflicts};
pub use error::{SchedulingError, SchedulingResult};
pub use policy::BookingPolicy;
pub use slots::find_available_slots;
pub use status::{is_transition_allowed, time_based_status, transition_reason};
pub use time::{TimeWindow, add_buffer, subtract_buffer};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use validate::validate_duration;
