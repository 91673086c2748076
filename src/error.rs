//! Configuration errors
//!
//! Gameplay itself never fails: the tick loop handles every recoverable
//! condition locally. Errors only surface when loading or validating tuning.

use thiserror::Error;

/// Failure while loading or validating a [`crate::Tuning`]
#[derive(Debug, Error)]
pub enum TuningError {
    /// Tuning file could not be read
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    /// Tuning JSON is malformed or has the wrong shape
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    /// A tuning value is outside its playable range
    #[error("tuning value '{name}' = {value} is out of range (expected {expected})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
}

/// Convenience alias for tuning results
pub type TuningResult<T> = Result<T, TuningError>;
