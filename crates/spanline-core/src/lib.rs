//! # Spanline Core
//!
//! Core types shared by the Spanline curve calibration crates.
//!
//! This crate provides:
//!
//! - **Dates**: A [`Date`] newtype over `chrono::NaiveDate`
//! - **Ordinates**: Julian day numbers used as spline knot positions
//! - **Currencies**: ISO 4217 tags carried by calibrated curves
//! - **Frequencies**: Coupon frequencies used by calibration instruments
//!
//! ## Example
//!
//! ```rust
//! use spanline_core::prelude::*;
//!
//! let epoch = Date::from_ymd(2025, 1, 15).unwrap();
//! let ordinate = epoch.ordinate();
//! assert_eq!(Date::from_ordinate(ordinate).unwrap(), epoch);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]

pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::{Currency, Date, Frequency, DAYS_PER_YEAR};
}

pub use error::{CoreError, CoreResult};
pub use types::{Currency, Date, Frequency};
