//! Span calibration.
//!
//! [`SpanCalibrator::calibrate_span`] walks the stretch specifications in
//! the order given. Each stretch starts at the epoch (first stretch) or at
//! the previous stretch's right edge, takes the span response there as its
//! left value and gets one knot per instrument maturity. Constraint terms
//! that fall before the stretch are evaluated on the stretches already
//! calibrated and moved to the right-hand side.
//!
//! # Quote Jacobians
//!
//! For stretch inputs `θ = (left value, targets…)` the calibrator records
//! `∂θ/∂q` over all quotes of the span:
//!
//! ```text
//! ∂θ₀/∂q     = ∂R_prev(x_start)/∂q
//! ∂θⱼ₊₁/∂q   = eⱼ · (∂Tⱼ/∂qⱼ - Σₖ ∂wₖ/∂qⱼ · R(xₖ)) - Σ_{xₖ < x_start} wₖ · ∂R_prev(xₖ)/∂q
//! ```
//!
//! The second term of the first bracket linearizes quote-dependent weights
//! (swap annuities, deposit growth factors) around the calibrated curve.
//!
//! # Failure
//!
//! Any failing instrument or stretch aborts the whole span; no partially
//! calibrated span is returned.

use std::sync::Arc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use spanline_core::{Currency, Date};
use spanline_math::error::validate_ordinates;
use spanline_math::jacobian::WengertJacobian;
use spanline_math::spline::{
    BoundaryCondition, CalibrationDetail, ResponseConstraint, SegmentDesign, Stretch,
};

use crate::config::{CurveConfig, LatentState};
use crate::constraint::LinearConstraint;
use crate::error::{CurveError, CurveResult};
use crate::instruments::{CalibrationInstrument, ConstraintContext};
use crate::span::{NamedStretch, Span};

/// Valuation date and currency of a calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationContext {
    /// Curve epoch.
    pub valuation_date: Date,
    /// Currency tag of the curve.
    pub currency: Currency,
}

impl ValuationContext {
    /// Creates a context.
    #[must_use]
    pub fn new(valuation_date: Date, currency: Currency) -> Self {
        Self {
            valuation_date,
            currency,
        }
    }

    /// Epoch as a spline ordinate.
    #[must_use]
    pub fn epoch_ordinate(&self) -> f64 {
        self.valuation_date.ordinate()
    }
}

/// A named, ordered group of quoted instruments calibrated as one stretch.
#[derive(Debug, Clone)]
pub struct StretchSpec {
    name: String,
    instruments: Vec<Arc<dyn CalibrationInstrument>>,
    quotes: Vec<f64>,
}

impl StretchSpec {
    /// Creates an empty stretch specification.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instruments: Vec::new(),
            quotes: Vec::new(),
        }
    }

    /// Builder method to add an instrument with its quote.
    #[must_use]
    pub fn with_instrument<I>(self, instrument: I, quote: f64) -> Self
    where
        I: CalibrationInstrument + 'static,
    {
        self.with_shared_instrument(Arc::new(instrument), quote)
    }

    /// Builder method to add a shared instrument with its quote.
    #[must_use]
    pub fn with_shared_instrument(
        mut self,
        instrument: Arc<dyn CalibrationInstrument>,
        quote: f64,
    ) -> Self {
        self.instruments.push(instrument);
        self.quotes.push(quote);
        self
    }

    /// Stretch name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instruments in knot order.
    #[must_use]
    pub fn instruments(&self) -> &[Arc<dyn CalibrationInstrument>] {
        &self.instruments
    }

    /// Quotes, one per instrument.
    #[must_use]
    pub fn quotes(&self) -> &[f64] {
        &self.quotes
    }

    /// Number of instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Whether the stretch has no instrument.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Same instruments with every quote mapped through `shift`.
    #[must_use]
    pub fn map_quotes<F>(&self, mut shift: F) -> Self
    where
        F: FnMut(&dyn CalibrationInstrument, f64) -> f64,
    {
        let quotes = self
            .instruments
            .iter()
            .zip(&self.quotes)
            .map(|(instrument, &quote)| shift(instrument.as_ref(), quote))
            .collect();
        Self {
            name: self.name.clone(),
            instruments: self.instruments.clone(),
            quotes,
        }
    }
}

/// Calibrates spans of stretches against instrument quotes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanCalibrator {
    latent_state: LatentState,
    design: SegmentDesign,
    boundary: BoundaryCondition,
    detail: CalibrationDetail,
}

impl SpanCalibrator {
    /// Creates a calibrator from a curve configuration.
    #[must_use]
    pub fn new(config: &CurveConfig) -> Self {
        Self {
            latent_state: config.latent_state,
            design: config.design,
            boundary: config.boundary,
            detail: config.detail,
        }
    }

    /// Latent state being calibrated.
    #[must_use]
    pub fn latent_state(&self) -> LatentState {
        self.latent_state
    }

    /// Calibrates every stretch in order.
    ///
    /// # Errors
    ///
    /// Fails on the first instrument that cannot produce a constraint and on
    /// the first stretch that cannot be calibrated.
    pub fn calibrate_span(
        &self,
        specs: &[StretchSpec],
        epoch_response: f64,
        ctx: &ValuationContext,
    ) -> CurveResult<Span> {
        if specs.is_empty() {
            return Err(CurveError::invalid_config("no stretch to calibrate"));
        }
        if !epoch_response.is_finite() {
            return Err(CurveError::invalid_value(format!(
                "epoch response {epoch_response}"
            )));
        }

        let quote_count = specs.iter().map(StretchSpec::len).sum();
        let mut span = Span::new(quote_count);
        let mut offset = 0;
        for spec in specs {
            let named = self
                .calibrate_stretch(spec, offset, epoch_response, &span, ctx)
                .map_err(|e| match e {
                    CurveError::InvalidInstrument { .. }
                    | CurveError::ConstraintGeneration { .. }
                    | CurveError::CalibrationFailure { .. } => e,
                    other => CurveError::calibration_failed(spec.name(), other.to_string()),
                })?;
            offset += spec.len();
            span.push(named)?;
        }

        debug!(
            "calibrated {} curve over {} stretches and {} quotes",
            self.latent_state,
            span.len(),
            quote_count
        );
        Ok(span)
    }

    fn calibrate_stretch(
        &self,
        spec: &StretchSpec,
        offset: usize,
        epoch_response: f64,
        span: &Span,
        ctx: &ValuationContext,
    ) -> CurveResult<NamedStretch> {
        if spec.is_empty() {
            return Err(CurveError::calibration_failed(spec.name(), "no instruments"));
        }
        for (instrument, quote) in spec.instruments().iter().zip(spec.quotes()) {
            if !instrument.supports(self.latent_state) {
                return Err(CurveError::invalid_instrument(
                    instrument.id(),
                    format!("cannot calibrate a {} curve", self.latent_state),
                ));
            }
            if !quote.is_finite() {
                return Err(CurveError::invalid_instrument(
                    instrument.id(),
                    format!("quote {quote}"),
                ));
            }
        }

        let start = span.right().unwrap_or_else(|| ctx.epoch_ordinate());
        let left_value = if span.is_empty() {
            epoch_response
        } else {
            span.response_value(start)?
        };
        let mut ordinates = Vec::with_capacity(spec.len() + 1);
        ordinates.push(start);
        ordinates.extend(spec.instruments().iter().map(|i| i.maturity_ordinate()));
        validate_ordinates(&ordinates).map_err(|e| {
            CurveError::calibration_failed(
                spec.name(),
                format!("maturities must increase past {start}: {e}"),
            )
        })?;

        let cctx = ConstraintContext::new(ctx.valuation_date, self.latent_state, span, &ordinates);
        let mut local = Vec::with_capacity(spec.len());
        let mut earlier_terms = Vec::with_capacity(spec.len());
        for (instrument, &quote) in spec.instruments().iter().zip(spec.quotes()) {
            let constraint = instrument.calibration_constraint(&cctx, quote)?;
            constraint.validate(instrument.id())?;
            let (earlier, rest) = constraint.split_before(start);
            if rest.is_empty() {
                return Err(CurveError::constraint_generation(
                    instrument.id(),
                    "constraint references nothing inside its stretch",
                ));
            }
            let known = earlier.apply(|x| span.response_value(x))?;
            trace!(
                "{}: {} local terms, {} resolved on earlier stretches",
                instrument.id(),
                rest.terms().len(),
                earlier.terms().len()
            );
            local.push(ResponseConstraint::new(
                rest.terms().to_vec(),
                rest.target() - known,
            ));
            earlier_terms.push(earlier);
        }

        let stretch = Stretch::setup(
            ordinates.clone(),
            self.design,
            left_value,
            &local,
            self.boundary,
            self.detail,
        )?;

        let input_jacobian = if self.detail.tracks_jacobian() {
            Some(self.input_jacobian(spec, offset, &stretch, span, &cctx, &earlier_terms)?)
        } else {
            None
        };

        debug!(
            "stretch '{}' calibrated over {} segments",
            spec.name(),
            stretch.num_segments()
        );
        Ok(NamedStretch::new(
            spec.name(),
            stretch,
            offset..offset + spec.len(),
            input_jacobian,
        ))
    }

    /// `∂θ/∂q` for a freshly calibrated stretch.
    fn input_jacobian(
        &self,
        spec: &StretchSpec,
        offset: usize,
        stretch: &Stretch,
        span: &Span,
        cctx: &ConstraintContext<'_>,
        earlier_terms: &[LinearConstraint],
    ) -> CurveResult<WengertJacobian> {
        let start = stretch.left();
        let mut jacobian = WengertJacobian::zeros(spec.len() + 1, span.quote_count());
        if !span.is_empty() {
            for (c, v) in span.response_quote_jacobian(start)?.into_iter().enumerate() {
                jacobian.set(0, c, v);
            }
        }

        let response = |x: f64| -> CurveResult<f64> {
            if x < start {
                span.response_value(x)
            } else {
                Ok(stretch.response_value(x)?)
            }
        };

        for (j, (instrument, &quote)) in spec.instruments().iter().zip(spec.quotes()).enumerate() {
            let row = j + 1;
            let derivative = instrument.constraint_quote_derivative(cctx, quote)?;
            let own = derivative.target() - derivative.apply(&response)?;
            jacobian.set(row, offset + j, own);

            for &(x, weight) in earlier_terms[j].terms() {
                for (c, v) in span.response_quote_jacobian(x)?.into_iter().enumerate() {
                    jacobian.set(row, c, jacobian.get(row, c) - weight * v);
                }
            }
        }
        Ok(jacobian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::{Compounding, Deposit};
    use approx::assert_relative_eq;

    fn context() -> ValuationContext {
        ValuationContext::new(Date::from_ymd(2025, 1, 2).unwrap(), Currency::USD)
    }

    fn deposit(days: i64) -> Deposit {
        Deposit::from_days(format!("DEP-{days}D"), context().valuation_date, days)
            .unwrap()
            .with_compounding(Compounding::Continuous)
    }

    #[test]
    fn test_single_stretch_hits_quotes() {
        let spec = StretchSpec::new("cash")
            .with_instrument(deposit(30), 0.04)
            .with_instrument(deposit(90), 0.042)
            .with_instrument(deposit(180), 0.045);
        let calibrator = SpanCalibrator::new(&CurveConfig::default());
        let span = calibrator.calibrate_span(&[spec], 1.0, &context()).unwrap();
        let epoch = context().epoch_ordinate();
        assert_relative_eq!(
            span.response_value(epoch + 90.0).unwrap(),
            (-0.042 * 90.0 / 365.0_f64).exp(),
            epsilon = 1e-12
        );
        assert_eq!(span.stretch("cash").unwrap().instrument_range(), 0..3);
    }

    #[test]
    fn test_second_stretch_starts_at_first_edge() {
        let cash = StretchSpec::new("cash")
            .with_instrument(deposit(30), 0.04)
            .with_instrument(deposit(90), 0.042);
        let term = StretchSpec::new("term")
            .with_instrument(deposit(180), 0.045)
            .with_instrument(deposit(365), 0.047);
        let calibrator = SpanCalibrator::new(&CurveConfig::default());
        let span = calibrator
            .calibrate_span(&[cash, term], 1.0, &context())
            .unwrap();
        let edge = context().epoch_ordinate() + 90.0;
        let term_stretch = span.stretch("term").unwrap().stretch();
        assert_eq!(term_stretch.left(), edge);
        assert_relative_eq!(
            term_stretch.response_value(edge).unwrap(),
            span.response_value(edge).unwrap(),
            epsilon = 1e-14
        );
        assert_eq!(span.quote_count(), 4);
    }

    #[test]
    fn test_unsorted_instruments_fail() {
        let spec = StretchSpec::new("cash")
            .with_instrument(deposit(90), 0.04)
            .with_instrument(deposit(30), 0.04);
        let calibrator = SpanCalibrator::new(&CurveConfig::default());
        let result = calibrator.calibrate_span(&[spec], 1.0, &context());
        assert!(matches!(result, Err(CurveError::CalibrationFailure { .. })));
    }

    #[test]
    fn test_later_stretch_must_extend_span() {
        let cash = StretchSpec::new("cash").with_instrument(deposit(90), 0.04);
        let overlap = StretchSpec::new("overlap").with_instrument(deposit(60), 0.04);
        let calibrator = SpanCalibrator::new(&CurveConfig::default());
        assert!(calibrator
            .calibrate_span(&[cash, overlap], 1.0, &context())
            .is_err());
    }

    #[test]
    fn test_empty_inputs_fail() {
        let calibrator = SpanCalibrator::new(&CurveConfig::default());
        assert!(calibrator.calibrate_span(&[], 1.0, &context()).is_err());
        let empty = StretchSpec::new("empty");
        assert!(calibrator.calibrate_span(&[empty], 1.0, &context()).is_err());
        let spec = StretchSpec::new("cash").with_instrument(deposit(30), f64::NAN);
        assert!(matches!(
            calibrator.calibrate_span(&[spec], 1.0, &context()),
            Err(CurveError::InvalidInstrument { .. })
        ));
    }

    #[test]
    fn test_map_quotes() {
        let spec = StretchSpec::new("cash")
            .with_instrument(deposit(30), 0.04)
            .with_instrument(deposit(90), 0.05);
        let bumped = spec.map_quotes(|_, q| q + 0.0001);
        assert_relative_eq!(bumped.quotes()[0], 0.0401);
        assert_relative_eq!(bumped.quotes()[1], 0.0501);
        assert_eq!(bumped.name(), "cash");
    }
}
