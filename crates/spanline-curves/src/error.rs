//! Error types for span calibration and curve queries.

use spanline_core::{CoreError, Date};
use spanline_math::MathError;
use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error types for curve operations.
#[derive(Error, Debug, Clone)]
pub enum CurveError {
    /// A calibration instrument is malformed or unusable for the curve.
    #[error("Invalid instrument {id}: {reason}")]
    InvalidInstrument {
        /// Instrument identifier.
        id: String,
        /// Description of what's wrong with the instrument.
        reason: String,
    },

    /// An instrument could not produce its calibration constraint.
    #[error("Constraint generation failed for {id}: {reason}")]
    ConstraintGeneration {
        /// Instrument identifier.
        id: String,
        /// Description of the failure.
        reason: String,
    },

    /// A stretch of the span failed to calibrate.
    #[error("Calibration of stretch '{stretch}' failed: {reason}")]
    CalibrationFailure {
        /// Name of the failing stretch.
        stretch: String,
        /// Description of failure.
        reason: String,
    },

    /// A query date lies before the curve epoch.
    #[error("Date {date} precedes curve epoch {epoch}")]
    BeforeEpoch {
        /// Requested date.
        date: Date,
        /// Curve epoch.
        epoch: Date,
    },

    /// A query ordinate lies outside the calibrated span.
    #[error("Ordinate {ordinate:.1} outside span [{min:.1}, {max:.1}]")]
    OutOfSpan {
        /// Requested ordinate.
        ordinate: f64,
        /// First span ordinate.
        min: f64,
        /// Last span ordinate.
        max: f64,
    },

    /// The requested quantity does not exist for the curve's latent state.
    #[error("Incompatible latent state: {operation} is not defined on a {state} curve")]
    IncompatibleState {
        /// Operation that was requested.
        operation: String,
        /// Latent state of the curve.
        state: String,
    },

    /// The curve was calibrated without quote Jacobians.
    #[error("Quote Jacobians are not available: {reason}")]
    JacobianUnavailable {
        /// Why no Jacobian can be produced.
        reason: String,
    },

    /// Unknown instrument or stretch identifier.
    #[error("Not found: {name}")]
    NotFound {
        /// Missing identifier.
        name: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration problem.
        reason: String,
    },

    /// Invalid value (NaN, Inf, or domain error).
    #[error("Invalid value: {reason}")]
    InvalidValue {
        /// Description of why value is invalid.
        reason: String,
    },

    /// Mathematical error from the spline layer.
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Date or ordinate error.
    #[error("Date error: {0}")]
    Core(#[from] CoreError),
}

impl CurveError {
    /// Creates an invalid instrument error.
    #[must_use]
    pub fn invalid_instrument(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInstrument {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a constraint generation error.
    #[must_use]
    pub fn constraint_generation(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConstraintGeneration {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a calibration failure error.
    #[must_use]
    pub fn calibration_failed(stretch: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CalibrationFailure {
            stretch: stretch.into(),
            reason: reason.into(),
        }
    }

    /// Creates an incompatible latent state error.
    #[must_use]
    pub fn incompatible_state(operation: impl Into<String>, state: impl ToString) -> Self {
        Self::IncompatibleState {
            operation: operation.into(),
            state: state.to_string(),
        }
    }

    /// Creates a missing Jacobian error.
    #[must_use]
    pub fn jacobian_unavailable(reason: impl Into<String>) -> Self {
        Self::JacobianUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }
}
