//! Forward Rate Agreement instrument.

use spanline_core::Date;

use super::{CalibrationInstrument, Compounding, ConstraintContext, InstrumentType};
use crate::config::LatentState;
use crate::constraint::LinearConstraint;
use crate::error::{CurveError, CurveResult};
use crate::term_structure::TermStructure;

/// A forward rate agreement on a simply compounded ACT/365F rate.
///
/// Prices at par when `P(start) / P(end) = 1 + rate·τ`. On a zero-rate
/// curve the constraint is `τₑ·z(end) - τₛ·z(start) = ln(1 + rate·τ)`; on
/// a forward-rate curve it integrates the instantaneous forward over the
/// accrual period.
#[derive(Debug, Clone, PartialEq)]
pub struct Fra {
    id: String,
    start: Date,
    end: Date,
}

impl Fra {
    /// Creates a FRA accruing from `start` to `end`.
    pub fn new(id: impl Into<String>, start: Date, end: Date) -> CurveResult<Self> {
        let id = id.into();
        if end <= start {
            return Err(CurveError::invalid_instrument(
                id,
                format!("end {end} is not after start {start}"),
            ));
        }
        Ok(Self { id, start, end })
    }

    /// FRA in "start x end" month notation from a spot date, e.g. 3x6.
    pub fn from_months(
        id: impl Into<String>,
        spot: Date,
        start_months: i32,
        end_months: i32,
    ) -> CurveResult<Self> {
        Self::new(id, spot.add_months(start_months)?, spot.add_months(end_months)?)
    }

    /// Accrual start.
    #[must_use]
    pub fn start_date(&self) -> Date {
        self.start
    }

    /// ACT/365F accrual period.
    #[must_use]
    pub fn year_fraction(&self) -> f64 {
        self.start.year_fraction(&self.end)
    }
}

impl CalibrationInstrument for Fra {
    fn id(&self) -> &str {
        &self.id
    }

    fn instrument_type(&self) -> InstrumentType {
        InstrumentType::Fra
    }

    fn measure(&self) -> &'static str {
        "ForwardRate"
    }

    fn maturity(&self) -> Date {
        self.end
    }

    fn supports(&self, state: LatentState) -> bool {
        !matches!(state, LatentState::SurvivalProbability)
    }

    fn calibration_constraint(
        &self,
        ctx: &ConstraintContext<'_>,
        quote: f64,
    ) -> CurveResult<LinearConstraint> {
        let log_growth = Compounding::Simple.log_growth(quote, self.year_fraction())?;
        ctx.growth_constraint(&self.id, self.start, self.end, log_growth)
    }

    fn constraint_quote_derivative(
        &self,
        ctx: &ConstraintContext<'_>,
        quote: f64,
    ) -> CurveResult<LinearConstraint> {
        let tau = self.year_fraction();
        let log_growth = Compounding::Simple.log_growth(quote, tau)?;
        let d_log_growth = Compounding::Simple.log_growth_derivative(quote, tau);
        ctx.growth_constraint_derivative(&self.id, self.start, self.end, log_growth, d_log_growth)
    }

    fn implied_quote(&self, curve: &dyn TermStructure) -> CurveResult<f64> {
        curve.simple_forward_rate(self.start, self.end)
    }
}
