//! Scenario bumps.
//!
//! A bump shifts calibration quotes; the scenario curve is obtained by
//! running span calibration again on the shifted quotes. The base curve is
//! never modified.
//!
//! # Example
//!
//! ```rust,ignore
//! use spanline_curves::bumping::{CurveBump, ParallelBump};
//!
//! let up = curve.bumped(&ParallelBump::one_bp_up().into())?;
//! let dv01 = price(&up)? - price(&curve)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};

/// One basis point as a decimal.
pub const BASIS_POINT: f64 = 1e-4;

/// A uniform shift of every calibration quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParallelBump {
    /// Shift amount in basis points.
    shift_bps: f64,
}

impl ParallelBump {
    /// Creates a parallel bump of `shift_bps` basis points.
    #[must_use]
    pub fn new(shift_bps: f64) -> Self {
        Self { shift_bps }
    }

    /// Creates a 1bp upward shift.
    #[must_use]
    pub fn one_bp_up() -> Self {
        Self::new(1.0)
    }

    /// Creates a 1bp downward shift.
    #[must_use]
    pub fn one_bp_down() -> Self {
        Self::new(-1.0)
    }

    /// Up and down bumps for central differences.
    #[must_use]
    pub fn symmetric(half_shift_bps: f64) -> (Self, Self) {
        (Self::new(half_shift_bps), Self::new(-half_shift_bps))
    }

    /// Shift in basis points.
    #[must_use]
    pub fn shift_bps(&self) -> f64 {
        self.shift_bps
    }

    /// Shift as a decimal (0.0001 = 1bp).
    #[must_use]
    pub fn shift_decimal(&self) -> f64 {
        self.shift_bps * BASIS_POINT
    }
}

impl Default for ParallelBump {
    fn default() -> Self {
        Self::one_bp_up()
    }
}

/// A shift of the quotes whose maturity falls in `[start_years, end_years)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TenorBump {
    /// Window start, in years from the epoch.
    pub start_years: f64,
    /// Window end (exclusive), in years from the epoch.
    pub end_years: f64,
    /// Shift amount in basis points.
    pub shift_bps: f64,
}

impl TenorBump {
    /// Creates a tenor bump.
    #[must_use]
    pub fn new(start_years: f64, end_years: f64, shift_bps: f64) -> Self {
        Self {
            start_years,
            end_years,
            shift_bps,
        }
    }

    /// Whether an instrument maturing at `tenor` years is shifted.
    #[must_use]
    pub fn covers(&self, tenor: f64) -> bool {
        tenor >= self.start_years && tenor < self.end_years
    }

    fn validate(&self) -> CurveResult<()> {
        if !(self.start_years.is_finite() && self.end_years.is_finite()) {
            return Err(CurveError::invalid_value("tenor window must be finite"));
        }
        if self.end_years <= self.start_years {
            return Err(CurveError::invalid_value(format!(
                "tenor window [{}, {}) is empty",
                self.start_years, self.end_years
            )));
        }
        Ok(())
    }
}

/// A quote scenario applied by recalibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurveBump {
    /// Every quote moves by the same amount.
    Parallel(ParallelBump),
    /// Quotes move by window; overlapping windows add up.
    Tenor {
        /// Shift windows.
        windows: Vec<TenorBump>,
    },
    /// A single instrument's quote moves.
    Quote {
        /// Instrument identifier.
        instrument_id: String,
        /// Shift amount in basis points.
        shift_bps: f64,
    },
}

impl CurveBump {
    /// Parallel shift of `shift_bps`.
    #[must_use]
    pub fn parallel(shift_bps: f64) -> Self {
        Self::Parallel(ParallelBump::new(shift_bps))
    }

    /// Tenor-localized shifts.
    #[must_use]
    pub fn tenor(windows: Vec<TenorBump>) -> Self {
        Self::Tenor { windows }
    }

    /// Shift of a single quote.
    #[must_use]
    pub fn quote(instrument_id: impl Into<String>, shift_bps: f64) -> Self {
        Self::Quote {
            instrument_id: instrument_id.into(),
            shift_bps,
        }
    }

    /// Decimal shift for an instrument maturing `tenor` years after the epoch.
    #[must_use]
    pub fn shift_for(&self, instrument_id: &str, tenor: f64) -> f64 {
        let bps = match self {
            Self::Parallel(bump) => bump.shift_bps(),
            Self::Tenor { windows } => windows
                .iter()
                .filter(|w| w.covers(tenor))
                .map(|w| w.shift_bps)
                .sum(),
            Self::Quote {
                instrument_id: id,
                shift_bps,
            } => {
                if id == instrument_id {
                    *shift_bps
                } else {
                    0.0
                }
            }
        };
        bps * BASIS_POINT
    }

    /// Checks the bump for consistency.
    pub fn validate(&self) -> CurveResult<()> {
        match self {
            Self::Parallel(bump) if !bump.shift_bps().is_finite() => {
                Err(CurveError::invalid_value("parallel shift must be finite"))
            }
            Self::Parallel(_) => Ok(()),
            Self::Tenor { windows } => {
                if windows.is_empty() {
                    return Err(CurveError::invalid_value("tenor bump has no window"));
                }
                for window in windows {
                    window.validate()?;
                    if !window.shift_bps.is_finite() {
                        return Err(CurveError::invalid_value("tenor shift must be finite"));
                    }
                }
                Ok(())
            }
            Self::Quote { shift_bps, .. } if !shift_bps.is_finite() => {
                Err(CurveError::invalid_value("quote shift must be finite"))
            }
            Self::Quote { .. } => Ok(()),
        }
    }
}

impl From<ParallelBump> for CurveBump {
    fn from(bump: ParallelBump) -> Self {
        Self::Parallel(bump)
    }
}
