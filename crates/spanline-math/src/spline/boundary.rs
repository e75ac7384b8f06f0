//! Stretch boundary conditions and calibration detail.

use serde::{Deserialize, Serialize};

use crate::error::MathResult;
use crate::spline::Segment;

/// Condition closing the stretch system at its far end.
///
/// The left edge of the first segment always has its higher derivatives
/// pinned to zero; the remaining freedom, the first segment's slope, is
/// solved so that the right-end condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryCondition {
    /// Zero curvature at the right edge.
    #[default]
    Natural,
    /// Zero slope at the right edge (flat long end).
    Financial,
    /// Third derivative continuous across the last interior knot.
    NotAKnot,
}

/// How much of a calibration is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationDetail {
    /// Coefficients plus coefficient-to-input Jacobians.
    #[default]
    Full,
    /// Coefficients only.
    ShapeOnly,
}

impl CalibrationDetail {
    /// Whether Jacobians are tracked.
    #[must_use]
    pub fn tracks_jacobian(&self) -> bool {
        matches!(self, Self::Full)
    }
}

/// `scale · R^(order)(u)` on segment `segment`, in local units.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResidualTerm {
    pub segment: usize,
    pub u: f64,
    pub order: usize,
    pub scale: f64,
}

impl BoundaryCondition {
    /// Terms whose sum must vanish for the condition to hold.
    pub(crate) fn residual_terms(&self, segments: &[Segment]) -> Vec<ResidualTerm> {
        let last = segments.len().saturating_sub(1);
        let natural = vec![ResidualTerm {
            segment: last,
            u: 1.0,
            order: 2,
            scale: 1.0,
        }];
        match self {
            Self::Natural => natural,
            Self::Financial => vec![ResidualTerm {
                segment: last,
                u: 1.0,
                order: 1,
                scale: 1.0,
            }],
            Self::NotAKnot if segments.len() < 2 => natural,
            Self::NotAKnot => {
                let ratio = segments[last].width() / segments[last - 1].width();
                vec![
                    ResidualTerm {
                        segment: last,
                        u: 0.0,
                        order: 3,
                        scale: 1.0,
                    },
                    ResidualTerm {
                        segment: last - 1,
                        u: 1.0,
                        order: 3,
                        scale: -ratio.powi(3),
                    },
                ]
            }
        }
    }

    /// Value of the closing condition on a calibrated chain.
    pub(crate) fn residual(&self, segments: &[Segment]) -> MathResult<f64> {
        self.residual_terms(segments)
            .iter()
            .map(|t| -> MathResult<f64> {
                Ok(t.scale * segments[t.segment].local_derivative(t.u, t.order)?)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&BoundaryCondition::NotAKnot).unwrap();
        assert_eq!(json, "\"not_a_knot\"");
        let detail: CalibrationDetail = serde_json::from_str("\"shape_only\"").unwrap();
        assert!(!detail.tracks_jacobian());
        assert!(CalibrationDetail::default().tracks_jacobian());
    }
}
