//! Curve configuration types.
//!
//! A [`CurveConfig`] selects what the spline models (the latent state), how
//! each segment is built, how the stretch is closed at its right edge and
//! how much sensitivity detail is retained. Configurations are plain serde
//! structs and can be loaded from JSON.
//!
//! # Example
//!
//! ```rust
//! use spanline_curves::config::{CurveConfig, LatentState};
//!
//! let json = r#"{
//!     "name": "USD-OIS",
//!     "latent_state": "zero_rate",
//!     "epoch_response": 0.04,
//!     "design": { "basis": { "family": "polynomial", "degree": 3 }, "ck": 2 },
//!     "boundary": "financial"
//! }"#;
//!
//! let config = CurveConfig::from_json(json).unwrap();
//! assert_eq!(config.latent_state, LatentState::ZeroRate);
//! assert_eq!(config.epoch_response().unwrap(), 0.04);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use spanline_math::spline::{BoundaryCondition, CalibrationDetail, SegmentDesign};

use crate::error::{CurveError, CurveResult};

// =============================================================================
// LATENT STATE
// =============================================================================

/// The quantity represented by the spline response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LatentState {
    /// Discount factor `P(t)`.
    #[default]
    DiscountFactor,
    /// Continuously compounded zero rate `z(t)`.
    ZeroRate,
    /// Instantaneous forward rate `f(t)`.
    ForwardRate,
    /// Survival probability `Q(t)`.
    SurvivalProbability,
}

impl LatentState {
    /// Response at the epoch implied by the state itself, if any.
    ///
    /// Discount factors and survival probabilities start at one; rate
    /// states need an explicit epoch response.
    #[must_use]
    pub fn natural_epoch_response(&self) -> Option<f64> {
        match self {
            Self::DiscountFactor | Self::SurvivalProbability => Some(1.0),
            Self::ZeroRate | Self::ForwardRate => None,
        }
    }
}

impl fmt::Display for LatentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DiscountFactor => "discount factor",
            Self::ZeroRate => "zero rate",
            Self::ForwardRate => "forward rate",
            Self::SurvivalProbability => "survival probability",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// EXTRAPOLATION
// =============================================================================

/// Behaviour beyond the last calibrated ordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Constant zero rate (or hazard) for discount, zero-rate and survival
    /// curves; constant instantaneous forward for forward-rate curves.
    #[default]
    Flat,
    /// Queries past the last ordinate fail.
    None,
}

// =============================================================================
// CURVE CONFIGURATION
// =============================================================================

/// Configuration for span calibration of one curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Curve name, used in logs and reports.
    #[serde(default = "default_name")]
    pub name: String,

    /// What the spline response represents.
    #[serde(default)]
    pub latent_state: LatentState,

    /// Segment basis, continuity and shape control.
    #[serde(default)]
    pub design: SegmentDesign,

    /// Right-edge closure of every stretch.
    #[serde(default)]
    pub boundary: BoundaryCondition,

    /// Whether coefficient Jacobians are retained.
    #[serde(default)]
    pub detail: CalibrationDetail,

    /// Response at the epoch; falls back to the latent state's natural value.
    #[serde(default)]
    pub epoch_response: Option<f64>,

    /// Extrapolation beyond the last node.
    #[serde(default)]
    pub extrapolation: Extrapolation,

    /// Absolute tolerance used by the repricing report.
    #[serde(default = "default_repricing_tolerance")]
    pub repricing_tolerance: f64,
}

fn default_name() -> String {
    "curve".to_string()
}

fn default_repricing_tolerance() -> f64 {
    1e-8
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            latent_state: LatentState::default(),
            design: SegmentDesign::default(),
            boundary: BoundaryCondition::default(),
            detail: CalibrationDetail::default(),
            epoch_response: None,
            extrapolation: Extrapolation::default(),
            repricing_tolerance: default_repricing_tolerance(),
        }
    }
}

impl CurveConfig {
    /// Creates a default configuration for `latent_state`.
    #[must_use]
    pub fn new(latent_state: LatentState) -> Self {
        Self {
            latent_state,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> CurveResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CurveError::invalid_config(format!("cannot parse curve config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to pretty JSON.
    pub fn to_json(&self) -> CurveResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CurveError::invalid_config(format!("cannot serialize curve config: {e}")))
    }

    /// Builder method to set the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder method to set the segment design.
    #[must_use]
    pub fn with_design(mut self, design: SegmentDesign) -> Self {
        self.design = design;
        self
    }

    /// Builder method to set the boundary condition.
    #[must_use]
    pub fn with_boundary(mut self, boundary: BoundaryCondition) -> Self {
        self.boundary = boundary;
        self
    }

    /// Builder method to set the calibration detail.
    #[must_use]
    pub fn with_detail(mut self, detail: CalibrationDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Builder method to set the epoch response.
    #[must_use]
    pub fn with_epoch_response(mut self, response: f64) -> Self {
        self.epoch_response = Some(response);
        self
    }

    /// Builder method to set the extrapolation.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Builder method to set the repricing tolerance.
    #[must_use]
    pub fn with_repricing_tolerance(mut self, tolerance: f64) -> Self {
        self.repricing_tolerance = tolerance;
        self
    }

    /// Response the first stretch starts from.
    pub fn epoch_response(&self) -> CurveResult<f64> {
        self.epoch_response
            .or_else(|| self.latent_state.natural_epoch_response())
            .ok_or_else(|| {
                CurveError::invalid_config(format!(
                    "a {} curve needs an explicit epoch response",
                    self.latent_state
                ))
            })
    }

    /// Checks the configuration for consistency.
    pub fn validate(&self) -> CurveResult<()> {
        if self.name.is_empty() {
            return Err(CurveError::invalid_config("name cannot be empty"));
        }
        self.design
            .validate()
            .map_err(|e| CurveError::invalid_config(e.to_string()))?;
        let epoch = self.epoch_response()?;
        if !epoch.is_finite() {
            return Err(CurveError::invalid_config("epoch response must be finite"));
        }
        if let Some(natural) = self.latent_state.natural_epoch_response() {
            if epoch != natural {
                return Err(CurveError::invalid_config(format!(
                    "{} curves start at {natural}, got epoch response {epoch}",
                    self.latent_state
                )));
            }
        }
        if !(self.repricing_tolerance > 0.0 && self.repricing_tolerance.is_finite()) {
            return Err(CurveError::invalid_config(
                "repricing tolerance must be positive",
            ));
        }
        Ok(())
    }
}
