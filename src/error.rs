//! Error types for envelope configuration.

use crate::envelope::Phase;
use thiserror::Error;

/// Error returned when an envelope cannot be configured.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvelopeError {
    /// A phase duration was zero.
    #[error("{phase} duration must be greater than zero")]
    ZeroDuration { phase: Phase },

    /// A millisecond value was negative, zero, NaN or infinite.
    #[error("{phase} duration must be a finite, positive number of milliseconds, got {value}")]
    InvalidMillis { phase: Phase, value: f64 },

    /// A timing string could not be parsed.
    #[error("invalid envelope timing '{input}': {reason}")]
    InvalidTiming { input: String, reason: String },
}
