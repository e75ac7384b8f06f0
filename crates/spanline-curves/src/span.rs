//! Spans: named stretches calibrated in sequence.
//!
//! A [`Span`] holds stretches that tile `[epoch, last maturity]` without
//! gaps. Each later stretch starts at its predecessor's right edge. Next to
//! every stretch the span keeps `∂θ/∂q`, the sensitivity of the stretch
//! inputs (left value and constraint targets) to every calibration quote of
//! the span. Chained with the stretch's own coefficient Jacobians this gives
//! the quote sensitivity of any response.

use std::ops::Range;

use spanline_math::jacobian::WengertJacobian;
use spanline_math::spline::Stretch;

use crate::error::{CurveError, CurveResult};

/// A calibrated stretch, its name and its quote sensitivities.
#[derive(Debug, Clone)]
pub struct NamedStretch {
    name: String,
    stretch: Stretch,
    instruments: Range<usize>,
    input_jacobian: Option<WengertJacobian>,
}

impl NamedStretch {
    pub(crate) fn new(
        name: impl Into<String>,
        stretch: Stretch,
        instruments: Range<usize>,
        input_jacobian: Option<WengertJacobian>,
    ) -> Self {
        Self {
            name: name.into(),
            stretch,
            instruments,
            input_jacobian,
        }
    }

    /// Stretch name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The calibrated stretch.
    #[must_use]
    pub fn stretch(&self) -> &Stretch {
        &self.stretch
    }

    /// Span-wide indices of the instruments calibrated by this stretch.
    #[must_use]
    pub fn instrument_range(&self) -> Range<usize> {
        self.instruments.clone()
    }

    /// `∂θ/∂q` for this stretch, if Jacobians were tracked.
    #[must_use]
    pub fn input_jacobian(&self) -> Option<&WengertJacobian> {
        self.input_jacobian.as_ref()
    }

    fn require_jacobian(&self) -> CurveResult<&WengertJacobian> {
        self.input_jacobian.as_ref().ok_or_else(|| {
            CurveError::jacobian_unavailable(format!(
                "stretch '{}' was calibrated shape-only",
                self.name
            ))
        })
    }

    /// `∂R(x)/∂q` over every quote of the span.
    pub fn response_quote_jacobian(&self, x: f64) -> CurveResult<Vec<f64>> {
        let jacobian = self.require_jacobian()?;
        let row = self.stretch.response_jacobian(x)?;
        Ok(jacobian.left_multiply(&row)?)
    }

    /// `∂(∫ₐᵇ R dx)/∂q` over every quote of the span.
    pub fn integral_quote_jacobian(&self, a: f64, b: f64) -> CurveResult<Vec<f64>> {
        let jacobian = self.require_jacobian()?;
        let row = self.stretch.integral_jacobian(a, b)?;
        Ok(jacobian.left_multiply(&row)?)
    }
}

/// Stretches covering the curve from the epoch to the last maturity.
#[derive(Debug, Clone, Default)]
pub struct Span {
    stretches: Vec<NamedStretch>,
    quote_count: usize,
}

impl Span {
    /// Creates an empty span whose Jacobians range over `quote_count` quotes.
    #[must_use]
    pub fn new(quote_count: usize) -> Self {
        Self {
            stretches: Vec::new(),
            quote_count,
        }
    }

    /// Appends a stretch that must start where the span ends.
    pub(crate) fn push(&mut self, stretch: NamedStretch) -> CurveResult<()> {
        if self.stretch(stretch.name()).is_some() {
            return Err(CurveError::calibration_failed(
                stretch.name(),
                "duplicate stretch name",
            ));
        }
        if let Some(right) = self.right() {
            if stretch.stretch().left() != right {
                return Err(CurveError::calibration_failed(
                    stretch.name(),
                    format!(
                        "stretch starts at {} but the span ends at {right}",
                        stretch.stretch().left()
                    ),
                ));
            }
        }
        self.stretches.push(stretch);
        Ok(())
    }

    /// Stretches in calibration order.
    #[must_use]
    pub fn stretches(&self) -> &[NamedStretch] {
        &self.stretches
    }

    /// Stretch by name.
    #[must_use]
    pub fn stretch(&self, name: &str) -> Option<&NamedStretch> {
        self.stretches.iter().find(|s| s.name() == name)
    }

    /// Number of stretches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stretches.len()
    }

    /// Whether no stretch has been calibrated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stretches.is_empty()
    }

    /// Number of calibration quotes the Jacobians range over.
    #[must_use]
    pub fn quote_count(&self) -> usize {
        self.quote_count
    }

    /// First ordinate.
    #[must_use]
    pub fn left(&self) -> Option<f64> {
        self.stretches.first().map(|s| s.stretch().left())
    }

    /// Last ordinate.
    #[must_use]
    pub fn right(&self) -> Option<f64> {
        self.stretches.last().map(|s| s.stretch().right())
    }

    /// Every knot of every stretch, without repeats.
    #[must_use]
    pub fn ordinates(&self) -> Vec<f64> {
        let mut knots: Vec<f64> = Vec::new();
        for named in &self.stretches {
            for &x in named.stretch().ordinates() {
                if knots.last() != Some(&x) {
                    knots.push(x);
                }
            }
        }
        knots
    }

    /// Whether `x` lies inside the span.
    #[must_use]
    pub fn contains(&self, x: f64) -> bool {
        matches!((self.left(), self.right()), (Some(l), Some(r)) if x >= l && x <= r)
    }

    /// Stretch containing `x`; a shared edge belongs to the earlier stretch.
    pub fn locate(&self, x: f64) -> CurveResult<&NamedStretch> {
        if !x.is_finite() {
            return Err(CurveError::invalid_value(format!("span query at {x}")));
        }
        match (self.left(), self.right()) {
            (Some(min), Some(max)) if x >= min && x <= max => {
                let index = self.stretches.partition_point(|s| s.stretch().right() < x);
                Ok(&self.stretches[index.min(self.stretches.len() - 1)])
            }
            (Some(min), Some(max)) => Err(CurveError::OutOfSpan {
                ordinate: x,
                min,
                max,
            }),
            _ => Err(CurveError::not_found("no stretch has been calibrated")),
        }
    }

    /// Response at `x`.
    pub fn response_value(&self, x: f64) -> CurveResult<f64> {
        Ok(self.locate(x)?.stretch().response_value(x)?)
    }

    /// `order`-th response derivative at `x`.
    pub fn derivative(&self, x: f64, order: usize) -> CurveResult<f64> {
        Ok(self.locate(x)?.stretch().derivative(x, order)?)
    }

    /// `∂R(x)/∂q`.
    pub fn response_quote_jacobian(&self, x: f64) -> CurveResult<Vec<f64>> {
        self.locate(x)?.response_quote_jacobian(x)
    }

    /// `∫ₐᵇ R dx` across stretch boundaries.
    pub fn integral(&self, a: f64, b: f64) -> CurveResult<f64> {
        self.check_interval(a, b)?;
        let mut total = 0.0;
        for named in &self.stretches {
            let stretch = named.stretch();
            let lo = stretch.left().max(a);
            let hi = stretch.right().min(b);
            if hi > lo {
                total += stretch.integral(lo, hi)?;
            }
        }
        Ok(total)
    }

    /// `∂(∫ₐᵇ R dx)/∂q`.
    pub fn integral_quote_jacobian(&self, a: f64, b: f64) -> CurveResult<Vec<f64>> {
        self.check_interval(a, b)?;
        let mut total = vec![0.0; self.quote_count];
        for named in &self.stretches {
            let stretch = named.stretch();
            let lo = stretch.left().max(a);
            let hi = stretch.right().min(b);
            if hi > lo {
                let part = named.integral_quote_jacobian(lo, hi)?;
                for (acc, v) in total.iter_mut().zip(part) {
                    *acc += v;
                }
            }
        }
        Ok(total)
    }

    fn check_interval(&self, a: f64, b: f64) -> CurveResult<()> {
        if a > b {
            return Err(CurveError::invalid_value(format!(
                "integration bounds reversed: {a} > {b}"
            )));
        }
        self.locate(a)?;
        self.locate(b)?;
        Ok(())
    }
}
