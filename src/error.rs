//! Error types for polarization-map

use thiserror::Error;

use crate::Measurement;

/// Result type for polarization-map operations
pub type Result<T> = std::result::Result<T, PolarizationError>;

/// Errors raised at the boundary of each pipeline component.
///
/// The two fail-open policies (tolerance substitution in weighted statistics and
/// the unfiltered fallback of sigma clipping) are not errors and never surface here.
#[derive(Error, Debug)]
pub enum PolarizationError {
    /// Zero records where at least one is required
    #[error("{operation}: input is empty")]
    EmptyInput { operation: &'static str },

    /// Parallel sequences of unequal length
    #[error("parallel sequences differ in length (expected {expected}, got {actual})")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A configuration value outside its valid range
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidConfig {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A record whose position or angle is not a finite number
    #[error("record {index}: {reason}")]
    InvalidRecord { index: usize, reason: &'static str },

    /// Catalog header is missing a required column
    #[error("catalog has no column named '{0}'")]
    MissingColumn(String),

    /// A catalog field could not be parsed as a number
    #[error("line {line}: column '{column}' has non-numeric value '{value}'")]
    InvalidField {
        line: u64,
        column: String,
        value: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PolarizationError {
    pub(crate) fn empty(operation: &'static str) -> Self {
        Self::EmptyInput { operation }
    }

    pub(crate) fn invalid(parameter: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidConfig {
            parameter,
            value,
            reason,
        }
    }
}

/// Fail with [`PolarizationError::ShapeMismatch`] unless both lengths agree.
pub(crate) fn ensure_same_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(PolarizationError::ShapeMismatch { expected, actual })
    }
}

/// Fail with [`PolarizationError::InvalidRecord`] at the first record that has a
/// non-finite longitude, latitude or angle.
pub(crate) fn ensure_finite_records(records: &[Measurement]) -> Result<()> {
    for (index, r) in records.iter().enumerate() {
        if !(r.longitude.is_finite() && r.latitude.is_finite()) {
            return Err(PolarizationError::InvalidRecord {
                index,
                reason: "position is not finite",
            });
        }
        if !r.angle.is_finite() {
            return Err(PolarizationError::InvalidRecord {
                index,
                reason: "angle is not finite",
            });
        }
    }
    Ok(())
}
