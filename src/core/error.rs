use std::time::Duration;

use thiserror::Error;

/// This is the configuration error type for the library. Every driver
/// validates its configuration before any simulation state is created, so
/// these errors never leave partial state behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown game id {0:?}, expected one of rps, mp, pd")]
    UnknownGame(String),
    #[error("Unknown algorithm {0:?}, expected one of hedge, regret, fp")]
    UnknownAlgorithm(String),
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: usize },
    #[error("Learning rate must be a positive finite number, got {0}")]
    NonPositiveLearningRate(f64),
    #[error("Worker count must be between 1 and 16, got {0}")]
    WorkersOutOfRange(usize),
    #[error("At least one seed is required")]
    NoSeeds,
}

/// Reject zero counts for the named field.
pub(crate) fn require_positive(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::NonPositive { field, value })
    } else {
        Ok(())
    }
}

/// Reject a zero duration for the named field.
pub(crate) fn require_nonzero_duration(
    field: &'static str,
    value: Duration,
) -> Result<(), ConfigError> {
    if value.is_zero() {
        Err(ConfigError::NonPositive { field, value: 0 })
    } else {
        Ok(())
    }
}

/// Reject learning rates that are not strictly positive and finite.
pub(crate) fn require_learning_rate(lr: f64) -> Result<(), ConfigError> {
    if lr.is_finite() && lr > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveLearningRate(lr))
    }
}
