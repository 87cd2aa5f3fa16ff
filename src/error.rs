//! Crate error type.

use crate::Phase;

#[derive(Debug, thiserror::Error)]
pub enum LabError {
    /// Event not allowed in the current phase (e.g. `act` before `start`).
    #[error("cannot {action} while {phase}")]
    Phase { action: &'static str, phase: Phase },

    /// Choice of the wrong kind for the current trial (e.g. an offer while responding).
    #[error("invalid choice: {0}")]
    InvalidChoice(String),

    /// Numeric input outside its interface bounds.
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unknown experiment: {0}")]
    UnknownExperiment(String),

    #[error("experiment {0} not found in catalog")]
    NotFound(u32),

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type LabResult<T> = Result<T, LabError>;

/// Reject `value` unless it lies in `[min, max]` and is finite.
pub(crate) fn ensure_range(field: &'static str, value: f64, min: f64, max: f64) -> LabResult<f64> {
    if value.is_finite() && value >= min && value <= max {
        Ok(value)
    } else {
        Err(LabError::OutOfRange { field, value, min, max })
    }
}
