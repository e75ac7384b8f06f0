//! Money market deposit instrument.
//!
//! A deposit is the simplest instrument for the short end of a curve.

use spanline_core::Date;

use super::{CalibrationInstrument, Compounding, ConstraintContext, InstrumentType};
use crate::config::LatentState;
use crate::constraint::LinearConstraint;
use crate::error::{CurveError, CurveResult};
use crate::term_structure::TermStructure;

/// A money market deposit quoted as a rate.
///
/// # Pricing Formula
///
/// The deposit prices at par when:
/// ```text
/// P(end) = P(start) / growth(rate, τ)
/// ```
/// with `growth = 1 + rate·τ` (simple) or `exp(rate·τ)` (continuous) and
/// τ the ACT/365F year fraction.
///
/// # Example
///
/// ```rust
/// use spanline_core::Date;
/// use spanline_curves::instruments::{CalibrationInstrument, Deposit};
///
/// let spot = Date::from_ymd(2025, 1, 2).unwrap();
/// let deposit = Deposit::new("DEP-3M", spot, spot.add_months(3).unwrap()).unwrap();
/// assert_eq!(deposit.measure(), "Rate");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Deposit {
    id: String,
    start: Date,
    end: Date,
    compounding: Compounding,
}

impl Deposit {
    /// Creates a simply compounded deposit.
    pub fn new(id: impl Into<String>, start: Date, end: Date) -> CurveResult<Self> {
        let id = id.into();
        if end <= start {
            return Err(CurveError::invalid_instrument(
                id,
                format!("maturity {end} is not after start {start}"),
            ));
        }
        Ok(Self {
            id,
            start,
            end,
            compounding: Compounding::Simple,
        })
    }

    /// Deposit from `start` over a number of days.
    pub fn from_days(id: impl Into<String>, start: Date, days: i64) -> CurveResult<Self> {
        Self::new(id, start, start.add_days(days))
    }

    /// Sets the compounding of the quoted rate.
    #[must_use]
    pub fn with_compounding(mut self, compounding: Compounding) -> Self {
        self.compounding = compounding;
        self
    }

    /// Start date.
    #[must_use]
    pub fn start_date(&self) -> Date {
        self.start
    }

    /// Compounding of the quoted rate.
    #[must_use]
    pub fn compounding(&self) -> Compounding {
        self.compounding
    }

    /// ACT/365F accrual period.
    #[must_use]
    pub fn year_fraction(&self) -> f64 {
        self.start.year_fraction(&self.end)
    }
}

impl CalibrationInstrument for Deposit {
    fn id(&self) -> &str {
        &self.id
    }

    fn instrument_type(&self) -> InstrumentType {
        InstrumentType::Deposit
    }

    fn measure(&self) -> &'static str {
        "Rate"
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
        let log_growth = self.compounding.log_growth(quote, self.year_fraction())?;
        ctx.growth_constraint(&self.id, self.start, self.end, log_growth)
    }

    fn constraint_quote_derivative(
        &self,
        ctx: &ConstraintContext<'_>,
        quote: f64,
    ) -> CurveResult<LinearConstraint> {
        let tau = self.year_fraction();
        let log_growth = self.compounding.log_growth(quote, tau)?;
        let d_log_growth = self.compounding.log_growth_derivative(quote, tau);
        ctx.growth_constraint_derivative(&self.id, self.start, self.end, log_growth, d_log_growth)
    }

    fn implied_quote(&self, curve: &dyn TermStructure) -> CurveResult<f64> {
        let tau = self.year_fraction();
        let log_growth = tau * curve.implied_rate(self.start, self.end)?;
        Ok(self.compounding.rate_from_log_growth(log_growth, tau))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{epoch, FlatCurve};
    use super::*;
    use crate::span::Span;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_inverted_dates() {
        assert!(Deposit::new("D", epoch(), epoch()).is_err());
        assert!(Deposit::from_days("D", epoch(), 1).is_ok());
    }

    #[test]
    fn test_discount_constraint() {
        let deposit = Deposit::from_days("DEP-6M", epoch(), 182).unwrap();
        let span = Span::new(0);
        let knots = [epoch().ordinate(), deposit.maturity_ordinate()];
        let ctx = ConstraintContext::new(epoch(), LatentState::DiscountFactor, &span, &knots);
        let c = deposit.calibration_constraint(&ctx, 0.05).unwrap();
        let tau = 182.0 / 365.0;
        assert_eq!(c.terms().len(), 2);
        assert_relative_eq!(c.terms()[1].1, 1.0 + 0.05 * tau, epsilon = 1e-14);

        let d = deposit.constraint_quote_derivative(&ctx, 0.05).unwrap();
        assert_relative_eq!(d.terms()[0].1, tau, epsilon = 1e-14);
    }

    #[test]
    fn test_implied_quote_on_flat_curve() {
        let curve = FlatCurve {
            reference: epoch(),
            rate: 0.03,
            hazard: 0.0,
        };
        let continuous = Deposit::from_days("C", epoch(), 91)
            .unwrap()
            .with_compounding(Compounding::Continuous);
        assert_relative_eq!(continuous.implied_quote(&curve).unwrap(), 0.03, epsilon = 1e-13);

        let simple = Deposit::from_days("S", epoch(), 365).unwrap();
        assert_relative_eq!(
            simple.implied_quote(&curve).unwrap(),
            0.03_f64.exp() - 1.0,
            epsilon = 1e-13
        );
    }

    #[test]
    fn test_survival_state_unsupported() {
        let deposit = Deposit::from_days("D", epoch(), 30).unwrap();
        assert!(!deposit.supports(LatentState::SurvivalProbability));
        assert!(deposit.supports(LatentState::ForwardRate));
    }
}
