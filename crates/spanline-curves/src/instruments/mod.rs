//! Calibration instruments.
//!
//! An instrument is the external collaborator of span calibration: given a
//! quote, it states "price me to this quote" as one [`LinearConstraint`] on
//! the latent response. The calibrator never inspects cash flows itself.
//!
//! # Available Instruments
//!
//! - [`Deposit`]: Money market deposit, simple or continuous compounding
//! - [`Fra`]: Forward rate agreement
//! - [`Swap`]: Fixed leg against par on discount factors
//! - [`CreditPoint`]: Flat-hazard credit spread point
//!
//! # Supported latent states
//!
//! | Instrument    | Discount | Zero rate | Forward rate | Survival |
//! |---------------|----------|-----------|--------------|----------|
//! | `Deposit`     | ✓        | ✓         | ✓            |          |
//! | `Fra`         | ✓        | ✓         | ✓            |          |
//! | `Swap`        | ✓        |           |              |          |
//! | `CreditPoint` |          |           |              | ✓        |

mod credit;
mod deposit;
mod fra;
mod swap;

pub use credit::CreditPoint;
pub use deposit::Deposit;
pub use fra::Fra;
pub use swap::Swap;

use std::fmt;

use serde::{Deserialize, Serialize};
use spanline_core::types::DAYS_PER_YEAR;
use spanline_core::Date;
use spanline_math::quadrature::GaussLegendre;

use crate::config::LatentState;
use crate::constraint::LinearConstraint;
use crate::error::{CurveError, CurveResult};
use crate::span::Span;
use crate::term_structure::{positive_log, TermStructure};

/// Instrument type for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstrumentType {
    /// Money market deposit
    Deposit,
    /// Forward Rate Agreement
    Fra,
    /// Interest Rate Swap
    Swap,
    /// Credit spread point
    CreditPoint,
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "Deposit"),
            Self::Fra => write!(f, "FRA"),
            Self::Swap => write!(f, "Swap"),
            Self::CreditPoint => write!(f, "CreditPoint"),
        }
    }
}

/// Interest compounding of a quoted rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Compounding {
    /// `1 + r·τ`
    #[default]
    Simple,
    /// `exp(r·τ)`
    Continuous,
}

impl Compounding {
    /// `ln` of the growth factor over `tau` years.
    pub fn log_growth(&self, rate: f64, tau: f64) -> CurveResult<f64> {
        match self {
            Self::Simple => positive_log(1.0 + rate * tau, "simple growth factor"),
            Self::Continuous => Ok(rate * tau),
        }
    }

    /// `∂ log_growth / ∂rate`.
    #[must_use]
    pub fn log_growth_derivative(&self, rate: f64, tau: f64) -> f64 {
        match self {
            Self::Simple => tau / (1.0 + rate * tau),
            Self::Continuous => tau,
        }
    }

    /// Rate that grows by `exp(log_growth)` over `tau` years.
    #[must_use]
    pub fn rate_from_log_growth(&self, log_growth: f64, tau: f64) -> f64 {
        match self {
            Self::Simple => (log_growth.exp() - 1.0) / tau,
            Self::Continuous => log_growth / tau,
        }
    }
}

/// What an instrument sees while its constraint is generated.
///
/// Holds the epoch, the latent state, the stretches calibrated so far and
/// the knots of the stretch under construction.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintContext<'a> {
    epoch: Date,
    latent_state: LatentState,
    span: &'a Span,
    knots: &'a [f64],
}

impl<'a> ConstraintContext<'a> {
    /// Creates a context.
    #[must_use]
    pub fn new(epoch: Date, latent_state: LatentState, span: &'a Span, knots: &'a [f64]) -> Self {
        Self {
            epoch,
            latent_state,
            span,
            knots,
        }
    }

    /// Curve epoch.
    #[must_use]
    pub fn epoch(&self) -> Date {
        self.epoch
    }

    /// Latent state of the curve under construction.
    #[must_use]
    pub fn latent_state(&self) -> LatentState {
        self.latent_state
    }

    /// Stretches calibrated before the current one.
    #[must_use]
    pub fn span(&self) -> &Span {
        self.span
    }

    /// Knots of the stretch under construction.
    #[must_use]
    pub fn knots(&self) -> &[f64] {
        self.knots
    }

    /// ACT/365F year fraction from the epoch.
    #[must_use]
    pub fn tenor(&self, date: Date) -> f64 {
        self.epoch.year_fraction(&date)
    }

    /// Gauss-Legendre points for `∫ R dt` over `[a, b]` in years.
    ///
    /// The interval is split at every known knot so each piece lies in one
    /// segment.
    pub fn integration_points(&self, a: f64, b: f64) -> Vec<(f64, f64)> {
        let mut breaks: Vec<f64> = self
            .span
            .ordinates()
            .into_iter()
            .chain(self.knots.iter().copied())
            .filter(|&x| x > a && x < b)
            .collect();
        breaks.push(a);
        breaks.push(b);
        breaks.sort_by(f64::total_cmp);
        breaks.dedup();

        let rule = GaussLegendre::default();
        breaks
            .windows(2)
            .flat_map(|w| rule.points(w[0], w[1]))
            .map(|(x, weight)| (x, weight / DAYS_PER_YEAR))
            .collect()
    }

    /// Constraint `ln(P(start) / P(end)) = log_growth` in the latent state.
    pub fn growth_constraint(
        &self,
        id: &str,
        start: Date,
        end: Date,
        log_growth: f64,
    ) -> CurveResult<LinearConstraint> {
        self.check_period(id, start, end)?;
        let (s, e) = (start.ordinate(), end.ordinate());
        match self.latent_state {
            LatentState::DiscountFactor => Ok(LinearConstraint::new(0.0)
                .with_term(e, log_growth.exp())
                .with_term(s, -1.0)),
            LatentState::ZeroRate => {
                let mut constraint = LinearConstraint::new(log_growth).with_term(e, self.tenor(end));
                if start > self.epoch {
                    constraint.add_term(s, -self.tenor(start));
                }
                Ok(constraint)
            }
            LatentState::ForwardRate => {
                let mut constraint = LinearConstraint::new(log_growth);
                for (x, w) in self.integration_points(s, e) {
                    constraint.add_term(x, w);
                }
                Ok(constraint)
            }
            LatentState::SurvivalProbability => Err(CurveError::invalid_instrument(
                id,
                "rate instruments cannot calibrate a survival curve",
            )),
        }
    }

    /// Quote derivative of [`growth_constraint`](Self::growth_constraint)
    /// given `∂ log_growth / ∂q`.
    pub fn growth_constraint_derivative(
        &self,
        id: &str,
        start: Date,
        end: Date,
        log_growth: f64,
        d_log_growth: f64,
    ) -> CurveResult<LinearConstraint> {
        self.check_period(id, start, end)?;
        match self.latent_state {
            LatentState::DiscountFactor => Ok(LinearConstraint::new(0.0)
                .with_term(end.ordinate(), log_growth.exp() * d_log_growth)),
            LatentState::ZeroRate | LatentState::ForwardRate => {
                Ok(LinearConstraint::new(d_log_growth))
            }
            LatentState::SurvivalProbability => Err(CurveError::invalid_instrument(
                id,
                "rate instruments cannot calibrate a survival curve",
            )),
        }
    }

    fn check_period(&self, id: &str, start: Date, end: Date) -> CurveResult<()> {
        if start < self.epoch {
            return Err(CurveError::constraint_generation(
                id,
                format!("start {start} precedes the epoch {}", self.epoch),
            ));
        }
        if end <= start {
            return Err(CurveError::constraint_generation(
                id,
                format!("end {end} is not after start {start}"),
            ));
        }
        Ok(())
    }
}

/// An instrument that can be calibrated to a quote.
pub trait CalibrationInstrument: Send + Sync + fmt::Debug {
    /// Unique identifier within a curve.
    fn id(&self) -> &str;

    /// Instrument type for reporting.
    fn instrument_type(&self) -> InstrumentType;

    /// Name of the quoted measure.
    fn measure(&self) -> &'static str;

    /// Maturity; becomes a knot of the stretch.
    fn maturity(&self) -> Date;

    /// Maturity as a spline ordinate.
    fn maturity_ordinate(&self) -> f64 {
        self.maturity().ordinate()
    }

    /// Whether the instrument can calibrate a curve of `state`.
    fn supports(&self, state: LatentState) -> bool;

    /// Constraint pricing the instrument to `quote`.
    fn calibration_constraint(
        &self,
        ctx: &ConstraintContext<'_>,
        quote: f64,
    ) -> CurveResult<LinearConstraint>;

    /// `∂/∂quote` of every weight and of the target of
    /// [`calibration_constraint`](Self::calibration_constraint).
    fn constraint_quote_derivative(
        &self,
        ctx: &ConstraintContext<'_>,
        quote: f64,
    ) -> CurveResult<LinearConstraint>;

    /// Quote implied by a finished curve.
    fn implied_quote(&self, curve: &dyn TermStructure) -> CurveResult<f64>;

    /// Returns a description string for reports.
    fn description(&self) -> String {
        format!("{} {} maturing {}", self.instrument_type(), self.id(), self.maturity())
    }
}
