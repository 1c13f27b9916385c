//! Error types for neurotransmitter mapping and cascade simulation.
//!
//! Absent data (no receptor profile, no edge, no production site) is not an
//! error anywhere in this crate: it resolves to zero effect and zero
//! confidence. Errors are reserved for malformed input that would otherwise
//! push NaN or out-of-range values through the arithmetic.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for fallible crate operations.
pub type NeurotransmitterResult<T> = Result<T, NeurotransmitterError>;

/// Rejected input value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value outside its documented closed range.
    #[error("{field} out of range: {value} (must be in [{min}, {max}])")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// NaN or infinite value.
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// Cascade step count above the configured ceiling.
    #[error("Cascade steps out of range: {steps} (max {max})")]
    StepsOutOfRange { steps: usize, max: usize },

    /// Label that names no variant of a domain enum.
    #[error("Unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

impl ValidationError {
    /// Check that `value` is finite and inside `[min, max]`.
    pub fn check_range(
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<f64, ValidationError> {
        Self::check_finite(field, value)?;
        if value < min || value > max {
            return Err(ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
        Ok(value)
    }

    /// Check that `value` is neither NaN nor infinite.
    pub fn check_finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite { field, value });
        }
        Ok(value)
    }
}

/// Top-level error for mapping storage, configuration and serialization.
#[derive(Error, Debug)]
pub enum NeurotransmitterError {
    /// Input validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No mapping stored for the patient.
    #[error("No neurotransmitter mapping for patient {0}")]
    PatientNotFound(Uuid),

    /// A per-patient lock was poisoned by a panicking holder.
    #[error("Mapping lock poisoned for patient {0}")]
    LockPoisoned(Uuid),

    /// Invalid or unreadable configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for NeurotransmitterError {
    fn from(err: serde_json::Error) -> Self {
        NeurotransmitterError::Serialization(err.to_string())
    }
}
