//! Calibrated curve adapter.
//!
//! [`CalibratedCurve`] wraps a calibrated [`Span`] together with everything
//! needed to rebuild it: configuration, valuation context, instruments and
//! quotes. It answers date-keyed queries in terms of the latent state:
//!
//! | Latent state   | Discount factor             | Instantaneous forward    |
//! |----------------|-----------------------------|--------------------------|
//! | Discount       | `R(x)`                      | `-R'(x)/R(x)`            |
//! | Zero rate      | `exp(-R(x)·τ)`              | `R(x) + τ·R'(x)`         |
//! | Forward rate   | `exp(-∫ R dτ)`              | `R(x)`                   |
//! | Survival       | n/a (`Q(x) = R(x)`)         | hazard `-R'(x)/R(x)`     |
//!
//! Derivatives are per year. Past the last node a flat curve holds the
//! zero rate (discount, zero rate), the forward (forward rate) or the
//! hazard rate (survival) constant. Queries before the epoch fail.

use std::collections::HashSet;

use log::{debug, info};
use spanline_core::types::DAYS_PER_YEAR;
use spanline_core::Date;

use crate::bumping::CurveBump;
use crate::calibrator::{SpanCalibrator, StretchSpec, ValuationContext};
use crate::config::{CurveConfig, Extrapolation, LatentState};
use crate::error::{CurveError, CurveResult};
use crate::repricing::{RepricingCheck, RepricingReport};
use crate::span::Span;
use crate::term_structure::{positive_log, TermStructure};

/// Sensitivities of one curve output to every calibration quote.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteJacobian {
    ids: Vec<String>,
    values: Vec<f64>,
}

impl QuoteJacobian {
    fn new(ids: Vec<String>, values: Vec<f64>) -> Self {
        Self { ids, values }
    }

    /// Instrument identifiers in quote order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Sensitivities in quote order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Sensitivity to the quote of `instrument_id`.
    #[must_use]
    pub fn get(&self, instrument_id: &str) -> Option<f64> {
        self.ids
            .iter()
            .position(|id| id == instrument_id)
            .map(|i| self.values[i])
    }

    /// Non-zero entries as `(instrument id, sensitivity)`.
    #[must_use]
    pub fn nonzero(&self) -> Vec<(&str, f64)> {
        self.ids
            .iter()
            .zip(&self.values)
            .filter(|(_, &v)| v != 0.0)
            .map(|(id, &v)| (id.as_str(), v))
            .collect()
    }
}

/// A curve produced by span calibration.
///
/// # Example
///
/// ```rust
/// use spanline_core::{Currency, Date};
/// use spanline_curves::prelude::*;
///
/// let spot = Date::from_ymd(2025, 1, 2).unwrap();
/// let context = ValuationContext::new(spot, Currency::USD);
/// let cash = StretchSpec::new("cash")
///     .with_instrument(Deposit::from_days("DEP-3M", spot, 91).unwrap(), 0.045)
///     .with_instrument(Deposit::from_days("DEP-6M", spot, 182).unwrap(), 0.046);
///
/// let curve = CalibratedCurve::calibrate(CurveConfig::default(), context, vec![cash]).unwrap();
/// let df = curve.discount_factor(spot.add_days(91)).unwrap();
/// assert!((df - 1.0 / (1.0 + 0.045 * 91.0 / 365.0)).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CalibratedCurve {
    config: CurveConfig,
    context: ValuationContext,
    specs: Vec<StretchSpec>,
    span: Span,
    epoch: f64,
    right: f64,
    max_date: Date,
}

impl CalibratedCurve {
    /// Calibrates a curve from stretch specifications.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration, on duplicate instrument ids and on
    /// any calibration failure. No partial curve is returned.
    pub fn calibrate(
        config: CurveConfig,
        context: ValuationContext,
        specs: Vec<StretchSpec>,
    ) -> CurveResult<Self> {
        config.validate()?;
        let mut seen = HashSet::new();
        for instrument in specs.iter().flat_map(StretchSpec::instruments) {
            if !seen.insert(instrument.id()) {
                return Err(CurveError::invalid_instrument(
                    instrument.id(),
                    "duplicate instrument id",
                ));
            }
        }

        let span = SpanCalibrator::new(&config).calibrate_span(
            &specs,
            config.epoch_response()?,
            &context,
        )?;
        let right = span
            .right()
            .ok_or_else(|| CurveError::not_found("calibrated span is empty"))?;
        let max_date = specs
            .iter()
            .flat_map(StretchSpec::instruments)
            .map(|i| i.maturity())
            .max()
            .ok_or_else(|| CurveError::not_found("curve has no instrument"))?;

        info!(
            "curve '{}' calibrated: {} stretches, last node {}",
            config.name,
            span.len(),
            max_date
        );
        Ok(Self {
            epoch: context.epoch_ordinate(),
            config,
            context,
            specs,
            span,
            right,
            max_date,
        })
    }

    /// Curve configuration.
    #[must_use]
    pub fn config(&self) -> &CurveConfig {
        &self.config
    }

    /// Valuation context.
    #[must_use]
    pub fn context(&self) -> &ValuationContext {
        &self.context
    }

    /// Stretch specifications the curve was calibrated from.
    #[must_use]
    pub fn specs(&self) -> &[StretchSpec] {
        &self.specs
    }

    /// The calibrated span.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Instrument ids in quote order.
    #[must_use]
    pub fn instrument_ids(&self) -> Vec<String> {
        self.specs
            .iter()
            .flat_map(StretchSpec::instruments)
            .map(|i| i.id().to_string())
            .collect()
    }

    /// Calibration quotes in quote order.
    #[must_use]
    pub fn quotes(&self) -> Vec<f64> {
        self.specs
            .iter()
            .flat_map(|s| s.quotes().iter().copied())
            .collect()
    }

    fn tenor_at(&self, x: f64) -> f64 {
        (x - self.epoch) / DAYS_PER_YEAR
    }

    fn check_ordinate(&self, x: f64) -> CurveResult<()> {
        if !x.is_finite() {
            return Err(CurveError::invalid_value(format!("curve query at {x}")));
        }
        if x < self.epoch {
            return Err(CurveError::BeforeEpoch {
                date: Date::from_ordinate(x.floor())?,
                epoch: self.context.valuation_date,
            });
        }
        if x > self.right && self.config.extrapolation == Extrapolation::None {
            return Err(CurveError::OutOfSpan {
                ordinate: x,
                min: self.epoch,
                max: self.right,
            });
        }
        Ok(())
    }

    fn incompatible(&self, operation: &str) -> CurveError {
        CurveError::incompatible_state(operation, self.config.latent_state)
    }

    /// `R(x)` inside the span, `R_N^(τ/τ_N)` beyond.
    fn level_at(&self, x: f64) -> CurveResult<f64> {
        if x <= self.right {
            return self.span.response_value(x);
        }
        let last = self.span.response_value(self.right)?;
        let k = self.tenor_at(x) / self.tenor_at(self.right);
        Ok((k * positive_log(last, "curve level")?).exp())
    }

    /// `∫ R` from the epoch to `x` in days, flat forward beyond the span.
    fn forward_integral(&self, x: f64) -> CurveResult<f64> {
        let inside = self.span.integral(self.epoch, x.min(self.right))?;
        if x <= self.right {
            return Ok(inside);
        }
        Ok(inside + (x - self.right) * self.span.response_value(self.right)?)
    }

    /// Discount factor at an ordinate.
    pub fn discount_factor_at(&self, x: f64) -> CurveResult<f64> {
        self.check_ordinate(x)?;
        match self.config.latent_state {
            LatentState::DiscountFactor => self.level_at(x),
            LatentState::ZeroRate => {
                let z = self.span.response_value(x.min(self.right))?;
                Ok((-z * self.tenor_at(x)).exp())
            }
            LatentState::ForwardRate => Ok((-self.forward_integral(x)? / DAYS_PER_YEAR).exp()),
            LatentState::SurvivalProbability => Err(self.incompatible("discount factor")),
        }
    }

    /// Continuously compounded zero rate at an ordinate.
    ///
    /// At the epoch this is the instantaneous short rate.
    pub fn zero_rate_at(&self, x: f64) -> CurveResult<f64> {
        self.check_ordinate(x)?;
        match self.config.latent_state {
            LatentState::ZeroRate => self.span.response_value(x.min(self.right)),
            LatentState::SurvivalProbability => Err(self.incompatible("zero rate")),
            LatentState::DiscountFactor | LatentState::ForwardRate => {
                let t = self.tenor_at(x);
                if t <= 0.0 {
                    return self.forward_rate_at(x);
                }
                let df = self.discount_factor_at(x)?;
                Ok(-positive_log(df, "discount factor")? / t)
            }
        }
    }

    /// Instantaneous forward rate at an ordinate.
    pub fn forward_rate_at(&self, x: f64) -> CurveResult<f64> {
        self.check_ordinate(x)?;
        let state = self.config.latent_state;
        if x > self.right {
            return match state {
                LatentState::ForwardRate => self.span.response_value(self.right),
                LatentState::SurvivalProbability => Err(self.incompatible("forward rate")),
                LatentState::DiscountFactor | LatentState::ZeroRate => {
                    self.zero_rate_at(self.right)
                }
            };
        }
        match state {
            LatentState::DiscountFactor => {
                let df = self.span.response_value(x)?;
                if df <= 0.0 {
                    return Err(CurveError::invalid_value(format!(
                        "non-positive discount factor {df} at {x}"
                    )));
                }
                Ok(-self.span.derivative(x, 1)? * DAYS_PER_YEAR / df)
            }
            LatentState::ZeroRate => Ok(self.span.response_value(x)?
                + self.tenor_at(x) * self.span.derivative(x, 1)? * DAYS_PER_YEAR),
            LatentState::ForwardRate => self.span.response_value(x),
            LatentState::SurvivalProbability => Err(self.incompatible("forward rate")),
        }
    }

    /// Survival probability at an ordinate.
    pub fn survival_probability_at(&self, x: f64) -> CurveResult<f64> {
        self.check_ordinate(x)?;
        if self.config.latent_state != LatentState::SurvivalProbability {
            return Err(self.incompatible("survival probability"));
        }
        self.level_at(x)
    }

    /// Hazard rate at an ordinate.
    pub fn hazard_rate_at(&self, x: f64) -> CurveResult<f64> {
        self.check_ordinate(x)?;
        if self.config.latent_state != LatentState::SurvivalProbability {
            return Err(self.incompatible("hazard rate"));
        }
        if x > self.right {
            let last = self.span.response_value(self.right)?;
            return Ok(-positive_log(last, "survival probability")? / self.tenor_at(self.right));
        }
        let q = self.span.response_value(x)?;
        if q <= 0.0 {
            return Err(CurveError::invalid_value(format!(
                "non-positive survival probability {q} at {x}"
            )));
        }
        Ok(-self.span.derivative(x, 1)? * DAYS_PER_YEAR / q)
    }

    /// Instantaneous forward rate on `date`.
    pub fn forward_rate(&self, date: Date) -> CurveResult<f64> {
        self.forward_rate_at(date.ordinate())
    }

    /// Hazard rate on `date`.
    pub fn hazard_rate(&self, date: Date) -> CurveResult<f64> {
        self.hazard_rate_at(date.ordinate())
    }

    // ========================================================================
    // Quote sensitivities
    // ========================================================================

    fn require_jacobians(&self) -> CurveResult<()> {
        if self.config.detail.tracks_jacobian() {
            Ok(())
        } else {
            Err(CurveError::jacobian_unavailable(format!(
                "curve '{}' was calibrated shape-only",
                self.config.name
            )))
        }
    }

    fn level_jacobian(&self, x: f64) -> CurveResult<Vec<f64>> {
        if x <= self.right {
            return self.span.response_quote_jacobian(x);
        }
        let last = self.span.response_value(self.right)?;
        let k = self.tenor_at(x) / self.tenor_at(self.right);
        let scale = k * self.level_at(x)? / last;
        Ok(self
            .span
            .response_quote_jacobian(self.right)?
            .into_iter()
            .map(|v| scale * v)
            .collect())
    }

    /// `∂P(date)/∂q` for every calibration quote.
    ///
    /// # Errors
    ///
    /// Fails on a shape-only curve, on survival curves and outside the
    /// queryable range.
    pub fn jacobian_df_to_quotes(&self, date: Date) -> CurveResult<QuoteJacobian> {
        self.require_jacobians()?;
        let x = date.ordinate();
        self.check_ordinate(x)?;
        let values = match self.config.latent_state {
            LatentState::DiscountFactor => self.level_jacobian(x)?,
            LatentState::ZeroRate => {
                let scale = -self.tenor_at(x) * self.discount_factor_at(x)?;
                self.span
                    .response_quote_jacobian(x.min(self.right))?
                    .into_iter()
                    .map(|v| scale * v)
                    .collect()
            }
            LatentState::ForwardRate => {
                let scale = -self.discount_factor_at(x)? / DAYS_PER_YEAR;
                let mut d_integral = self.span.integral_quote_jacobian(self.epoch, x.min(self.right))?;
                if x > self.right {
                    let tail = self.span.response_quote_jacobian(self.right)?;
                    for (acc, v) in d_integral.iter_mut().zip(tail) {
                        *acc += (x - self.right) * v;
                    }
                }
                d_integral.into_iter().map(|v| scale * v).collect()
            }
            LatentState::SurvivalProbability => {
                return Err(self.incompatible("discount factor Jacobian"))
            }
        };
        debug!("discount factor Jacobian at {date} over {} quotes", values.len());
        Ok(QuoteJacobian::new(self.instrument_ids(), values))
    }

    /// `∂P(date)/∂q` for the quote of `instrument_id`.
    pub fn jacobian_df_to_quote(&self, date: Date, instrument_id: &str) -> CurveResult<f64> {
        self.jacobian_df_to_quotes(date)?
            .get(instrument_id)
            .ok_or_else(|| CurveError::not_found(instrument_id))
    }

    /// `∂Q(date)/∂q` for every calibration quote of a survival curve.
    pub fn jacobian_survival_to_quotes(&self, date: Date) -> CurveResult<QuoteJacobian> {
        self.require_jacobians()?;
        if self.config.latent_state != LatentState::SurvivalProbability {
            return Err(self.incompatible("survival Jacobian"));
        }
        let x = date.ordinate();
        self.check_ordinate(x)?;
        Ok(QuoteJacobian::new(self.instrument_ids(), self.level_jacobian(x)?))
    }

    // ========================================================================
    // Scenarios and validation
    // ========================================================================

    /// Recalibrates the curve on quotes shifted by `bump`.
    pub fn bumped(&self, bump: &CurveBump) -> CurveResult<Self> {
        bump.validate()?;
        let epoch = self.context.valuation_date;
        let specs = self
            .specs
            .iter()
            .map(|spec| {
                spec.map_quotes(|instrument, quote| {
                    let tenor = epoch.year_fraction(&instrument.maturity());
                    quote + bump.shift_for(instrument.id(), tenor)
                })
            })
            .collect();
        debug!("recalibrating curve '{}' under {bump:?}", self.config.name);
        Self::calibrate(self.config.clone(), self.context, specs)
    }

    /// Reprices every calibrating instrument on the finished curve.
    pub fn repricing_report(&self) -> CurveResult<RepricingReport> {
        let mut checks = Vec::with_capacity(self.span.quote_count());
        for spec in &self.specs {
            for (instrument, &quote) in spec.instruments().iter().zip(spec.quotes()) {
                checks.push(RepricingCheck::from_instrument(
                    instrument.as_ref(),
                    self,
                    quote,
                    self.config.repricing_tolerance,
                )?);
            }
        }
        Ok(RepricingReport::new(checks))
    }
}

impl TermStructure for CalibratedCurve {
    fn reference_date(&self) -> Date {
        self.context.valuation_date
    }

    fn latent_state(&self) -> LatentState {
        self.config.latent_state
    }

    fn max_date(&self) -> Date {
        self.max_date
    }

    fn discount_factor(&self, date: Date) -> CurveResult<f64> {
        self.discount_factor_at(date.ordinate())
    }

    fn survival_probability(&self, date: Date) -> CurveResult<f64> {
        self.survival_probability_at(date.ordinate())
    }

    fn zero_rate(&self, date: Date) -> CurveResult<f64> {
        self.zero_rate_at(date.ordinate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::{Compounding, CreditPoint, Deposit};
    use approx::assert_relative_eq;
    use spanline_core::Currency;
    use spanline_math::spline::CalibrationDetail;

    fn spot() -> Date {
        Date::from_ymd(2025, 1, 2).unwrap()
    }

    fn context() -> ValuationContext {
        ValuationContext::new(spot(), Currency::USD)
    }

    fn cash(rate: f64) -> StretchSpec {
        let dep = |days: i64| {
            Deposit::from_days(format!("DEP-{days}D"), spot(), days)
                .unwrap()
                .with_compounding(Compounding::Continuous)
        };
        StretchSpec::new("cash")
            .with_instrument(dep(91), rate)
            .with_instrument(dep(182), rate)
            .with_instrument(dep(365), rate)
    }

    fn flat_curve(state: LatentState) -> CalibratedCurve {
        let mut config = CurveConfig::new(state);
        if state.natural_epoch_response().is_none() {
            config = config.with_epoch_response(0.03);
        }
        CalibratedCurve::calibrate(config, context(), vec![cash(0.03)]).unwrap()
    }

    #[test]
    fn test_discount_curve_rejects_epoch_override() {
        let config = CurveConfig::new(LatentState::DiscountFactor).with_epoch_response(0.03);
        assert!(matches!(
            CalibratedCurve::calibrate(config, context(), vec![cash(0.03)]),
            Err(CurveError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_discount_factors_at_nodes() {
        for state in [
            LatentState::DiscountFactor,
            LatentState::ZeroRate,
            LatentState::ForwardRate,
        ] {
            let curve = flat_curve(state);
            for days in [91, 182, 365] {
                let df = curve.discount_factor(spot().add_days(days)).unwrap();
                assert_relative_eq!(df, (-0.03 * days as f64 / 365.0).exp(), epsilon = 1e-10);
            }
            assert_relative_eq!(curve.discount_factor(spot()).unwrap(), 1.0, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_flat_extrapolation() {
        let curve = flat_curve(LatentState::DiscountFactor);
        let df_1y = curve.discount_factor(spot().add_days(365)).unwrap();
        let df_2y = curve.discount_factor(spot().add_days(730)).unwrap();
        assert_relative_eq!(df_2y, df_1y * df_1y, epsilon = 1e-14);
        assert_relative_eq!(
            curve.forward_rate(spot().add_days(900)).unwrap(),
            0.03,
            epsilon = 1e-10
        );

        let forward = flat_curve(LatentState::ForwardRate);
        let f_n = forward.forward_rate(spot().add_days(365)).unwrap();
        assert_relative_eq!(forward.forward_rate(spot().add_days(800)).unwrap(), f_n);
    }

    #[test]
    fn test_no_extrapolation() {
        let config = CurveConfig::default().with_extrapolation(Extrapolation::None);
        let curve = CalibratedCurve::calibrate(config, context(), vec![cash(0.03)]).unwrap();
        assert!(matches!(
            curve.discount_factor(spot().add_days(366)),
            Err(CurveError::OutOfSpan { .. })
        ));
        assert!(curve.discount_factor(spot().add_days(365)).is_ok());
    }

    #[test]
    fn test_before_epoch_fails() {
        let curve = flat_curve(LatentState::DiscountFactor);
        assert!(matches!(
            curve.discount_factor(spot().add_days(-1)),
            Err(CurveError::BeforeEpoch { .. })
        ));
    }

    #[test]
    fn test_zero_rate_at_epoch_is_short_rate() {
        let curve = flat_curve(LatentState::ZeroRate);
        assert_relative_eq!(curve.zero_rate(spot()).unwrap(), 0.03, epsilon = 1e-15);
        assert_relative_eq!(
            curve.zero_rate(spot().add_days(182)).unwrap(),
            0.03,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_survival_queries() {
        let spec = StretchSpec::new("credit")
            .with_instrument(CreditPoint::new("CDS-1Y", spot().add_days(365)).unwrap(), 0.012)
            .with_instrument(CreditPoint::new("CDS-2Y", spot().add_days(730)).unwrap(), 0.012);
        let config = CurveConfig::new(LatentState::SurvivalProbability);
        let curve = CalibratedCurve::calibrate(config, context(), vec![spec]).unwrap();
        assert_relative_eq!(
            curve.survival_probability(spot().add_days(730)).unwrap(),
            (-0.04_f64).exp(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            curve.hazard_rate(spot().add_days(1000)).unwrap(),
            0.02,
            epsilon = 1e-12
        );
        assert!(matches!(
            curve.discount_factor(spot().add_days(30)),
            Err(CurveError::IncompatibleState { .. })
        ));
        assert!(curve.repricing_report().unwrap().is_valid());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dep = Deposit::from_days("DEP", spot(), 91).unwrap();
        let spec = StretchSpec::new("cash")
            .with_instrument(dep.clone(), 0.03)
            .with_instrument(dep, 0.03);
        let result = CalibratedCurve::calibrate(CurveConfig::default(), context(), vec![spec]);
        assert!(matches!(result, Err(CurveError::InvalidInstrument { .. })));
    }

    #[test]
    fn test_shape_only_has_no_jacobian() {
        let config = CurveConfig::default().with_detail(CalibrationDetail::ShapeOnly);
        let curve = CalibratedCurve::calibrate(config, context(), vec![cash(0.03)]).unwrap();
        assert!(curve.discount_factor(spot().add_days(100)).is_ok());
        assert!(matches!(
            curve.jacobian_df_to_quotes(spot().add_days(100)),
            Err(CurveError::JacobianUnavailable { .. })
        ));
    }

    #[test]
    fn test_jacobian_at_node() {
        let curve = flat_curve(LatentState::DiscountFactor);
        let date = spot().add_days(182);
        let jacobian = curve.jacobian_df_to_quotes(date).unwrap();
        let tau: f64 = 182.0 / 365.0;
        let df = (-0.03 * tau).exp();
        assert_relative_eq!(jacobian.get("DEP-182D").unwrap(), -tau * df, epsilon = 1e-10);
        assert_relative_eq!(jacobian.get("DEP-91D").unwrap(), 0.0, epsilon = 1e-10);
        assert!(jacobian.get("MISSING").is_none());
        assert!(curve.jacobian_df_to_quote(date, "MISSING").is_err());
    }

    #[test]
    fn test_quote_bump_moves_only_later_nodes() {
        let curve = flat_curve(LatentState::DiscountFactor);
        let bumped = curve.bumped(&CurveBump::quote("DEP-182D", 1.0)).unwrap();
        let at = |c: &CalibratedCurve, days| c.discount_factor(spot().add_days(days)).unwrap();
        assert_relative_eq!(at(&bumped, 91), at(&curve, 91), epsilon = 1e-13);
        assert!(at(&bumped, 182) < at(&curve, 182));
        assert_eq!(bumped.quotes()[1], 0.03 + 1e-4);
    }
}
