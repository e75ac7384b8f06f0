//! Repricing validation for calibrated curves.
//!
//! Every instrument used to calibrate a span is priced again against the
//! finished curve. The recomputed measure (rate, swap rate, par spread) must
//! reproduce the input quote; a curve that cannot is wrong.
//!
//! # Usage
//!
//! ```rust,ignore
//! let curve = CalibratedCurve::calibrate(config, context, specs)?;
//! let report = curve.repricing_report()?;
//! if !report.is_valid() {
//!     eprintln!("Failed instruments: {:?}", report.failed_instruments());
//! }
//! ```

use std::fmt;

use crate::error::CurveResult;
use crate::instruments::{CalibrationInstrument, InstrumentType};
use crate::term_structure::TermStructure;

/// Result of repricing a single instrument against the curve.
#[derive(Debug, Clone)]
pub struct RepricingCheck {
    /// Instrument identifier.
    pub instrument_id: String,

    /// Type of instrument.
    pub instrument_type: InstrumentType,

    /// Name of the quoted measure.
    pub measure: &'static str,

    /// Input quote.
    pub quote: f64,

    /// Measure recomputed from the curve.
    pub model_quote: f64,

    /// Absolute error |model_quote - quote|.
    pub error: f64,

    /// Tolerance the error was held to.
    pub tolerance: f64,

    /// Whether this instrument passed validation.
    pub passed: bool,
}

impl RepricingCheck {
    /// Creates a check.
    ///
    /// `relative_tolerance` scales with the quote's magnitude, floored at one.
    #[must_use]
    pub fn new(
        instrument_id: impl Into<String>,
        instrument_type: InstrumentType,
        measure: &'static str,
        quote: f64,
        model_quote: f64,
        relative_tolerance: f64,
    ) -> Self {
        let error = (model_quote - quote).abs();
        let tolerance = relative_tolerance * quote.abs().max(1.0);
        Self {
            instrument_id: instrument_id.into(),
            instrument_type,
            measure,
            quote,
            model_quote,
            error,
            tolerance,
            passed: error <= tolerance,
        }
    }

    /// Reprices `instrument` on `curve`.
    pub fn from_instrument(
        instrument: &dyn CalibrationInstrument,
        curve: &dyn TermStructure,
        quote: f64,
        relative_tolerance: f64,
    ) -> CurveResult<Self> {
        let model_quote = instrument.implied_quote(curve)?;
        Ok(Self::new(
            instrument.id(),
            instrument.instrument_type(),
            instrument.measure(),
            quote,
            model_quote,
            relative_tolerance,
        ))
    }
}

impl fmt::Display for RepricingCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "✓" } else { "✗" };
        write!(
            f,
            "{} {} {} | quote: {:.6} | model: {:.6} | error: {:.2e} (tol: {:.2e})",
            status,
            self.instrument_id,
            self.measure,
            self.quote,
            self.model_quote,
            self.error,
            self.tolerance
        )
    }
}

/// Repricing checks for every calibrating instrument of a curve.
#[derive(Debug, Clone)]
pub struct RepricingReport {
    checks: Vec<RepricingCheck>,
    max_error: f64,
    rms_error: f64,
    passed_count: usize,
}

impl RepricingReport {
    /// Creates a report from individual checks.
    #[must_use]
    pub fn new(checks: Vec<RepricingCheck>) -> Self {
        let max_error = checks.iter().map(|c| c.error).fold(0.0_f64, f64::max);
        let rms_error = if checks.is_empty() {
            0.0
        } else {
            let sum_sq: f64 = checks.iter().map(|c| c.error * c.error).sum();
            (sum_sq / checks.len() as f64).sqrt()
        };
        let passed_count = checks.iter().filter(|c| c.passed).count();
        Self {
            checks,
            max_error,
            rms_error,
            passed_count,
        }
    }

    /// Returns whether all instruments passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.passed_count == self.checks.len()
    }

    /// Individual checks in calibration order.
    #[must_use]
    pub fn checks(&self) -> &[RepricingCheck] {
        &self.checks
    }

    /// Maximum absolute error.
    #[must_use]
    pub fn max_error(&self) -> f64 {
        self.max_error
    }

    /// Root mean square error.
    #[must_use]
    pub fn rms_error(&self) -> f64 {
        self.rms_error
    }

    /// Number of instruments that passed.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.passed_count
    }

    /// Number of instruments that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.checks.len() - self.passed_count
    }

    /// Failed instrument IDs.
    #[must_use]
    pub fn failed_instruments(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.instrument_id.as_str())
            .collect()
    }
}

impl fmt::Display for RepricingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repricing Report")?;
        writeln!(f, "================")?;
        writeln!(f, "Status: {}", if self.is_valid() { "PASSED" } else { "FAILED" })?;
        writeln!(f, "Instruments: {}/{} passed", self.passed_count, self.checks.len())?;
        writeln!(f, "Max Error: {:.2e}", self.max_error)?;
        writeln!(f, "RMS Error: {:.2e}", self.rms_error)?;
        if !self.checks.is_empty() {
            writeln!(f)?;
            writeln!(f, "Details:")?;
            for check in &self.checks {
                writeln!(f, "  {check}")?;
            }
        }
        Ok(())
    }
}
