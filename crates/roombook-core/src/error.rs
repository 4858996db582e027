//! Scheduling error types.
//!
//! Every failure the engine can report is one of four kinds, all
//! recoverable by the caller: bad input, a policy refusal, a missing
//! entity, or a state-machine refusal. Each carries a human-readable
//! reason suitable for surfacing to an end user.

use thiserror::Error;

/// Result type for scheduling operations.
pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Errors produced by the scheduling core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    /// Missing or malformed fields, unparseable timestamps.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A duration-rule or conflict-rule refusal. Distinct from malformed
    /// input: the request was well-formed but not permitted.
    #[error("{message}")]
    PolicyViolation { message: String },

    /// A referenced resource or booking does not exist.
    #[error("{what} not found")]
    NotFound { what: String },

    /// A booking status transition the state machine forbids.
    #[error("illegal status transition: {message}")]
    IllegalTransition { message: String },
}

impl SchedulingError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a policy violation error.
    pub fn policy(message: impl Into<String>) -> Self {
        Self::PolicyViolation {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates an illegal transition error.
    pub fn illegal_transition(message: impl Into<String>) -> Self {
        Self::IllegalTransition {
            message: message.into(),
        }
    }
}
