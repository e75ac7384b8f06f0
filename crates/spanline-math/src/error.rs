//! Error types for spline and numerical operations.

use thiserror::Error;

/// A specialized Result type for mathematical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during spline construction and calibration.
#[derive(Error, Debug, Clone)]
pub enum MathError {
    /// Root-finding algorithm failed to converge.
    #[error("Convergence failed after {iterations} iterations (residual: {residual:.2e})")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: u32,
        /// Final residual value.
        residual: f64,
    },

    /// Invalid bracket for root-finding.
    #[error("Invalid bracket: f({a}) = {fa:.2e} and f({b}) = {fb:.2e} have same sign")]
    InvalidBracket {
        /// Lower bound of bracket.
        a: f64,
        /// Upper bound of bracket.
        b: f64,
        /// Function value at a.
        fa: f64,
        /// Function value at b.
        fb: f64,
    },

    /// Matrix is singular (not invertible).
    #[error("Singular matrix: cannot solve {size}x{size} system")]
    SingularMatrix {
        /// Dimension of the square system.
        size: usize,
    },

    /// Matrix dimensions are incompatible.
    #[error("Incompatible matrix dimensions: ({rows1}x{cols1}) and ({rows2}x{cols2})")]
    DimensionMismatch {
        /// Rows in first matrix.
        rows1: usize,
        /// Columns in first matrix.
        cols1: usize,
        /// Rows in second matrix.
        rows2: usize,
        /// Columns in second matrix.
        cols2: usize,
    },

    /// The number of calibration rows does not match the number of basis functions.
    #[error("Constraint count {constraints} does not match basis count {basis}")]
    ConstraintCountMismatch {
        /// Number of assembled constraint rows.
        constraints: usize,
        /// Number of basis functions.
        basis: usize,
    },

    /// Ordinates are not strictly increasing.
    #[error("Non-increasing ordinates at index {index}: {prev} >= {current}")]
    NonIncreasingOrdinates {
        /// Index where the violation occurred.
        index: usize,
        /// Previous ordinate.
        prev: f64,
        /// Current ordinate.
        current: f64,
    },

    /// A query or constraint ordinate lies outside the covered range.
    #[error("Ordinate {x} is outside [{min}, {max}]")]
    OutOfRange {
        /// The query ordinate.
        x: f64,
        /// Left edge.
        min: f64,
        /// Right edge.
        max: f64,
    },

    /// A segment was queried before being calibrated.
    #[error("Segment [{left}, {right}] is not calibrated")]
    NotCalibrated {
        /// Segment left ordinate.
        left: f64,
        /// Segment right ordinate.
        right: f64,
    },

    /// Segment calibration failed inside a stretch.
    #[error("Segment {index} failed to calibrate: {reason}")]
    SegmentCalibration {
        /// Index of the failing segment.
        index: usize,
        /// Underlying failure.
        reason: String,
    },

    /// Insufficient data points for operation.
    #[error("Insufficient data: need at least {required}, got {actual}")]
    InsufficientData {
        /// Minimum required points.
        required: usize,
        /// Actual number of points.
        actual: usize,
    },

    /// NaN or infinite input.
    #[error("Non-finite value in {context}")]
    NonFinite {
        /// Where the value was found.
        context: String,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },
}

impl MathError {
    /// Creates a convergence failed error.
    #[must_use]
    pub fn convergence_failed(iterations: u32, residual: f64) -> Self {
        Self::ConvergenceFailed {
            iterations,
            residual,
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates an insufficient data error.
    #[must_use]
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Creates a non-finite value error.
    #[must_use]
    pub fn non_finite(context: impl Into<String>) -> Self {
        Self::NonFinite {
            context: context.into(),
        }
    }

    /// Wraps a failure raised while calibrating segment `index`.
    #[must_use]
    pub fn segment_calibration(index: usize, source: &MathError) -> Self {
        Self::SegmentCalibration {
            index,
            reason: source.to_string(),
        }
    }
}

/// Checks that every ordinate is finite and strictly greater than its predecessor.
pub fn validate_ordinates(ordinates: &[f64]) -> MathResult<()> {
    if let Some(bad) = ordinates.iter().position(|x| !x.is_finite()) {
        return Err(MathError::non_finite(format!("ordinate {bad}")));
    }
    for i in 1..ordinates.len() {
        if ordinates[i] <= ordinates[i - 1] {
            return Err(MathError::NonIncreasingOrdinates {
                index: i,
                prev: ordinates[i - 1],
                current: ordinates[i],
            });
        }
    }
    Ok(())
}
