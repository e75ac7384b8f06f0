//! Interest rate swap instrument.
//!
//! The swap is valued on a single discount curve: the floating leg is worth
//! `P(effective) - P(maturity)`, so the par condition is linear in the
//! discount factors.

use spanline_core::{Date, Frequency};

use super::{CalibrationInstrument, ConstraintContext, InstrumentType};
use crate::config::LatentState;
use crate::constraint::LinearConstraint;
use crate::error::{CurveError, CurveResult};
use crate::term_structure::TermStructure;

/// A par swap quoted by its fixed rate.
///
/// # Pricing Formula
///
/// ```text
/// q · Σ τᵢ·P(tᵢ) + P(tₙ) - P(t₀) = 0
/// ```
/// with `t₀` the effective date, `tᵢ` the fixed payment dates and `τᵢ` the
/// ACT/365F accrual of period `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Swap {
    id: String,
    effective: Date,
    payments: Vec<Date>,
}

impl Swap {
    /// Creates a swap from its fixed payment dates.
    pub fn new(id: impl Into<String>, effective: Date, payments: Vec<Date>) -> CurveResult<Self> {
        let id = id.into();
        if payments.is_empty() {
            return Err(CurveError::invalid_instrument(id, "swap has no payment dates"));
        }
        let mut previous = effective;
        for &date in &payments {
            if date <= previous {
                return Err(CurveError::invalid_instrument(
                    id,
                    format!("payment {date} does not follow {previous}"),
                ));
            }
            previous = date;
        }
        Ok(Self {
            id,
            effective,
            payments,
        })
    }

    /// Swap with unadjusted regular periods rolled forward from `effective`.
    pub fn regular(
        id: impl Into<String>,
        effective: Date,
        years: i32,
        frequency: Frequency,
    ) -> CurveResult<Self> {
        let id = id.into();
        if years <= 0 {
            return Err(CurveError::invalid_instrument(id, "swap tenor must be positive"));
        }
        let step = frequency.months_per_period();
        let periods = 12 * years / step;
        let payments = (1..=periods)
            .map(|k| effective.add_months(k * step))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(id, effective, payments)
    }

    /// Effective date.
    #[must_use]
    pub fn effective_date(&self) -> Date {
        self.effective
    }

    /// Fixed payment dates.
    #[must_use]
    pub fn payment_dates(&self) -> &[Date] {
        &self.payments
    }

    /// `(payment date, accrual)` for every fixed period.
    fn periods(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        std::iter::once(self.effective)
            .chain(self.payments.iter().copied())
            .zip(self.payments.iter().copied())
            .map(|(start, end)| (end, start.year_fraction(&end)))
    }
}

impl CalibrationInstrument for Swap {
    fn id(&self) -> &str {
        &self.id
    }

    fn instrument_type(&self) -> InstrumentType {
        InstrumentType::Swap
    }

    fn measure(&self) -> &'static str {
        "SwapRate"
    }

    fn maturity(&self) -> Date {
        self.payments[self.payments.len() - 1]
    }

    fn supports(&self, state: LatentState) -> bool {
        state == LatentState::DiscountFactor
    }

    fn calibration_constraint(
        &self,
        ctx: &ConstraintContext<'_>,
        quote: f64,
    ) -> CurveResult<LinearConstraint> {
        if self.effective < ctx.epoch() {
            return Err(CurveError::constraint_generation(
                &self.id,
                format!("effective date {} precedes the epoch", self.effective),
            ));
        }
        let mut constraint = LinearConstraint::new(0.0).with_term(self.effective.ordinate(), -1.0);
        for (date, tau) in self.periods() {
            constraint.add_term(date.ordinate(), quote * tau);
        }
        constraint.add_term(self.maturity().ordinate(), 1.0);
        Ok(constraint)
    }

    fn constraint_quote_derivative(
        &self,
        _ctx: &ConstraintContext<'_>,
        _quote: f64,
    ) -> CurveResult<LinearConstraint> {
        let mut derivative = LinearConstraint::new(0.0);
        for (date, tau) in self.periods() {
            derivative.add_term(date.ordinate(), tau);
        }
        Ok(derivative)
    }

    fn implied_quote(&self, curve: &dyn TermStructure) -> CurveResult<f64> {
        let mut annuity = 0.0;
        for (date, tau) in self.periods() {
            annuity += tau * curve.discount_factor(date)?;
        }
        if annuity <= 0.0 {
            return Err(CurveError::invalid_value(format!(
                "non-positive annuity for swap {}",
                self.id
            )));
        }
        let float_leg =
            curve.discount_factor(self.effective)? - curve.discount_factor(self.maturity())?;
        Ok(float_leg / annuity)
    }
}
