//! # Spanline Curves
//!
//! Span calibration of discount, rate and credit curves on basis-spline
//! stretches.
//!
//! This crate provides:
//!
//! - **Linear constraints**: Instruments state "price me to this quote" as a
//!   weighted sum of spline responses
//! - **Instruments**: Deposits, FRAs, swaps and credit spread points
//! - **Span calibration**: Named stretches calibrated in order, each one
//!   starting where the previous one ends, with quote Jacobians
//! - **Curves**: Discount factors, zero and forward rates, survival and
//!   hazard rates with flat extrapolation
//! - **Scenarios**: Parallel, tenor and single-quote bumps by recalibration
//! - **Repricing**: Validation that every input instrument is repriced
//!
//! ## Latent states
//!
//! | State                 | Epoch response       | Instruments          |
//! |-----------------------|----------------------|----------------------|
//! | `DiscountFactor`      | 1                    | Deposit, FRA, Swap   |
//! | `ZeroRate`            | configured short rate| Deposit, FRA         |
//! | `ForwardRate`         | configured short rate| Deposit, FRA         |
//! | `SurvivalProbability` | 1                    | CreditPoint          |
//!
//! ## Example
//!
//! ```rust
//! use spanline_core::{Currency, Date, Frequency};
//! use spanline_curves::prelude::*;
//!
//! let spot = Date::from_ymd(2025, 1, 2).unwrap();
//! let context = ValuationContext::new(spot, Currency::USD);
//!
//! let cash = StretchSpec::new("cash")
//!     .with_instrument(Deposit::from_days("DEP-3M", spot, 91).unwrap(), 0.045)
//!     .with_instrument(Deposit::from_days("DEP-6M", spot, 182).unwrap(), 0.046);
//! let swaps = StretchSpec::new("swaps")
//!     .with_instrument(Swap::regular("SWP-2Y", spot, 2, Frequency::Annual).unwrap(), 0.044)
//!     .with_instrument(Swap::regular("SWP-5Y", spot, 5, Frequency::Annual).unwrap(), 0.042);
//!
//! let curve = CalibratedCurve::calibrate(CurveConfig::default(), context, vec![cash, swaps]).unwrap();
//! assert!(curve.repricing_report().unwrap().is_valid());
//!
//! let five_years = spot.add_years(5).unwrap();
//! let dv01 = curve.jacobian_df_to_quote(five_years, "SWP-5Y").unwrap();
//! assert!(dv01 < 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::float_cmp)]

pub mod bumping;
pub mod calibrator;
pub mod config;
pub mod constraint;
pub mod curve;
pub mod error;
pub mod instruments;
pub mod repricing;
pub mod span;
pub mod term_structure;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bumping::{CurveBump, ParallelBump, TenorBump};
    pub use crate::calibrator::{SpanCalibrator, StretchSpec, ValuationContext};
    pub use crate::config::{CurveConfig, Extrapolation, LatentState};
    pub use crate::constraint::LinearConstraint;
    pub use crate::curve::{CalibratedCurve, QuoteJacobian};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::instruments::{
        CalibrationInstrument, Compounding, ConstraintContext, CreditPoint, Deposit, Fra,
        InstrumentType, Swap,
    };
    pub use crate::repricing::{RepricingCheck, RepricingReport};
    pub use crate::span::{NamedStretch, Span};
    pub use crate::term_structure::TermStructure;
}

pub use curve::CalibratedCurve;
pub use error::{CurveError, CurveResult};
