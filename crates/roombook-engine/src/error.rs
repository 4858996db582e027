//! Engine error types.

use thiserror::Error;

use roombook_core::SchedulingError;

use crate::store::StoreError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur at the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A refusal from the scheduling core (policy, state machine,
    /// missing entity, bad input).
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    /// A failure reported by the booking store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Returns true if this error means a referenced entity is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Scheduling(SchedulingError::NotFound { .. })
                | Self::Store(StoreError::NotFound { .. })
        )
    }
}
