//! Credit spread point on a survival curve.

use spanline_core::Date;

use super::{CalibrationInstrument, ConstraintContext, InstrumentType};
use crate::config::LatentState;
use crate::constraint::LinearConstraint;
use crate::error::{CurveError, CurveResult};
use crate::term_structure::{positive_log, TermStructure};

/// A par credit spread converted to survival under a flat hazard rate.
///
/// `Q(T) = exp(-s/(1 - R) · τ)` with `s` the quoted spread and `R` the
/// recovery rate.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditPoint {
    id: String,
    maturity: Date,
    recovery: f64,
}

impl CreditPoint {
    /// Default recovery assumption for senior unsecured debt.
    pub const DEFAULT_RECOVERY: f64 = 0.4;

    /// Creates a credit point with the default recovery.
    pub fn new(id: impl Into<String>, maturity: Date) -> CurveResult<Self> {
        Self::with_recovery(id, maturity, Self::DEFAULT_RECOVERY)
    }

    /// Creates a credit point with an explicit recovery in `[0, 1)`.
    pub fn with_recovery(id: impl Into<String>, maturity: Date, recovery: f64) -> CurveResult<Self> {
        let id = id.into();
        if !(0.0..1.0).contains(&recovery) {
            return Err(CurveError::invalid_instrument(
                id,
                format!("recovery {recovery} outside [0, 1)"),
            ));
        }
        Ok(Self {
            id,
            maturity,
            recovery,
        })
    }

    /// Recovery rate.
    #[must_use]
    pub fn recovery(&self) -> f64 {
        self.recovery
    }

    fn tenor(&self, epoch: Date) -> CurveResult<f64> {
        let tau = epoch.year_fraction(&self.maturity);
        if tau <= 0.0 {
            return Err(CurveError::constraint_generation(
                &self.id,
                format!("maturity {} is not after the epoch {epoch}", self.maturity),
            ));
        }
        Ok(tau)
    }

    fn loss_given_default(&self) -> f64 {
        1.0 - self.recovery
    }
}

impl CalibrationInstrument for CreditPoint {
    fn id(&self) -> &str {
        &self.id
    }

    fn instrument_type(&self) -> InstrumentType {
        InstrumentType::CreditPoint
    }

    fn measure(&self) -> &'static str {
        "ParSpread"
    }

    fn maturity(&self) -> Date {
        self.maturity
    }

    fn supports(&self, state: LatentState) -> bool {
        state == LatentState::SurvivalProbability
    }

    fn calibration_constraint(
        &self,
        ctx: &ConstraintContext<'_>,
        quote: f64,
    ) -> CurveResult<LinearConstraint> {
        let tau = self.tenor(ctx.epoch())?;
        let survival = (-quote / self.loss_given_default() * tau).exp();
        Ok(LinearConstraint::point(self.maturity.ordinate(), survival))
    }

    fn constraint_quote_derivative(
        &self,
        ctx: &ConstraintContext<'_>,
        quote: f64,
    ) -> CurveResult<LinearConstraint> {
        let tau = self.tenor(ctx.epoch())?;
        let lgd = self.loss_given_default();
        let survival = (-quote / lgd * tau).exp();
        Ok(LinearConstraint::new(-tau / lgd * survival))
    }

    fn implied_quote(&self, curve: &dyn TermStructure) -> CurveResult<f64> {
        let tau = self.tenor(curve.reference_date())?;
        let log_survival = positive_log(
            curve.survival_probability(self.maturity)?,
            "survival probability",
        )?;
        Ok(-log_survival / tau * self.loss_given_default())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{epoch, FlatCurve};
    use super::*;
    use crate::span::Span;
    use approx::assert_relative_eq;

    #[test]
    fn test_recovery_bounds() {
        let maturity = epoch().add_days(365);
        assert!(CreditPoint::with_recovery("C", maturity, 1.0).is_err());
        assert!(CreditPoint::with_recovery("C", maturity, -0.1).is_err());
        assert_eq!(CreditPoint::new("C", maturity).unwrap().recovery(), 0.4);
    }

    #[test]
    fn test_constraint_and_derivative() {
        let point = CreditPoint::new("CDS-1Y", epoch().add_days(365)).unwrap();
        let span = Span::new(0);
        let knots = [epoch().ordinate(), point.maturity_ordinate()];
        let ctx = ConstraintContext::new(epoch(), LatentState::SurvivalProbability, &span, &knots);
        let c = point.calibration_constraint(&ctx, 0.012).unwrap();
        assert_relative_eq!(c.target(), (-0.02_f64).exp(), epsilon = 1e-15);
        let d = point.constraint_quote_derivative(&ctx, 0.012).unwrap();
        assert!(d.is_empty());
        assert_relative_eq!(d.target(), -(-0.02_f64).exp() / 0.6, epsilon = 1e-14);
    }

    #[test]
    fn test_implied_quote() {
        let curve = FlatCurve {
            reference: epoch(),
            rate: 0.0,
            hazard: 0.025,
        };
        let point = CreditPoint::new("CDS-5Y", epoch().add_days(1826)).unwrap();
        assert_relative_eq!(point.implied_quote(&curve).unwrap(), 0.015, epsilon = 1e-14);
        assert!(!point.supports(LatentState::DiscountFactor));
    }
}
