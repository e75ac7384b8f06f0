//! Domain types for curve calibration.
//!
//! - [`Date`]: Calendar date with Julian-day ordinate conversion
//! - [`Currency`]: ISO currency codes
//! - [`Frequency`]: Coupon payment frequency

mod currency;
mod date;
mod frequency;

pub use currency::Currency;
pub use date::{Date, DAYS_PER_YEAR};
pub use frequency::Frequency;
