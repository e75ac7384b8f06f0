//! Error types for core date and ordinate handling.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while constructing or converting core types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Error in date calculations or invalid date.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// An ordinate that cannot be mapped to a calendar date.
    #[error("Invalid ordinate: {ordinate}")]
    InvalidOrdinate {
        /// The offending ordinate.
        ordinate: f64,
    },
}

impl CoreError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an invalid ordinate error.
    #[must_use]
    pub fn invalid_ordinate(ordinate: f64) -> Self {
        Self::InvalidOrdinate { ordinate }
    }
}
