//! Per-segment calibration inputs.

use crate::error::{MathError, MathResult};

/// `Σ weight · R(ordinate) = target`.
///
/// Inside [`CalibrationParams`] ordinates are segment-local `u`; when passed
/// to a [`Stretch`](super::Stretch) they are global ordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseConstraint {
    /// `(ordinate, weight)` pairs.
    pub points: Vec<(f64, f64)>,
    /// Right-hand side.
    pub target: f64,
}

impl ResponseConstraint {
    /// Creates a constraint from its terms and target.
    #[must_use]
    pub fn new(points: Vec<(f64, f64)>, target: f64) -> Self {
        Self { points, target }
    }

    /// `R(ordinate) = target`.
    #[must_use]
    pub fn value_at(ordinate: f64, target: f64) -> Self {
        Self {
            points: vec![(ordinate, 1.0)],
            target,
        }
    }

    /// Largest ordinate referenced, if any.
    #[must_use]
    pub fn max_ordinate(&self) -> Option<f64> {
        self.points.iter().map(|&(x, _)| x).reduce(f64::max)
    }

    pub(crate) fn check_finite(&self, context: &str) -> MathResult<()> {
        let finite = self.target.is_finite()
            && self.points.iter().all(|(x, w)| x.is_finite() && w.is_finite());
        if finite {
            Ok(())
        } else {
            Err(MathError::non_finite(context))
        }
    }
}

/// `Σ weightᵢ · cᵢ = target` directly on basis coefficients.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasisConstraint {
    /// One weight per basis function.
    pub weights: Vec<f64>,
    /// Right-hand side.
    pub target: f64,
}

impl BasisConstraint {
    /// Creates a coefficient constraint.
    #[must_use]
    pub fn new(weights: Vec<f64>, target: f64) -> Self {
        Self { weights, target }
    }
}

/// The rows of a single segment's linear system.
///
/// Rows are assembled in field order: left value, left derivatives
/// (orders 1, 2, ...), right value, right derivatives, response values,
/// response constraints, basis constraints. Derivatives are with respect to
/// the local coordinate `u`. The total row count must equal the number of
/// basis functions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalibrationParams {
    /// Response at `u = 0`.
    pub left_value: Option<f64>,
    /// Local derivatives at `u = 0`, starting with order 1.
    pub left_derivatives: Vec<f64>,
    /// Response at `u = 1`.
    pub right_value: Option<f64>,
    /// Local derivatives at `u = 1`, starting with order 1.
    pub right_derivatives: Vec<f64>,
    /// `(u, value)` pairs.
    pub response_values: Vec<(f64, f64)>,
    /// Weighted response constraints in local coordinates.
    pub response_constraints: Vec<ResponseConstraint>,
    /// Direct coefficient constraints.
    pub basis_constraints: Vec<BasisConstraint>,
}

impl CalibrationParams {
    /// Empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the left-edge response.
    #[must_use]
    pub fn with_left_value(mut self, value: f64) -> Self {
        self.left_value = Some(value);
        self
    }

    /// Sets the left-edge local derivatives.
    #[must_use]
    pub fn with_left_derivatives(mut self, derivatives: Vec<f64>) -> Self {
        self.left_derivatives = derivatives;
        self
    }

    /// Sets the right-edge response.
    #[must_use]
    pub fn with_right_value(mut self, value: f64) -> Self {
        self.right_value = Some(value);
        self
    }

    /// Sets the right-edge local derivatives.
    #[must_use]
    pub fn with_right_derivatives(mut self, derivatives: Vec<f64>) -> Self {
        self.right_derivatives = derivatives;
        self
    }

    /// Adds a response value at local `u`.
    #[must_use]
    pub fn with_response_value(mut self, u: f64, value: f64) -> Self {
        self.response_values.push((u, value));
        self
    }

    /// Adds a weighted response constraint.
    #[must_use]
    pub fn with_response_constraint(mut self, constraint: ResponseConstraint) -> Self {
        self.response_constraints.push(constraint);
        self
    }

    /// Adds a basis coefficient constraint.
    #[must_use]
    pub fn with_basis_constraint(mut self, constraint: BasisConstraint) -> Self {
        self.basis_constraints.push(constraint);
        self
    }

    /// Number of rows these parameters contribute.
    #[must_use]
    pub fn row_count(&self) -> usize {
        usize::from(self.left_value.is_some())
            + self.left_derivatives.len()
            + usize::from(self.right_value.is_some())
            + self.right_derivatives.len()
            + self.response_values.len()
            + self.response_constraints.len()
            + self.basis_constraints.len()
    }

    pub(crate) fn check_finite(&self) -> MathResult<()> {
        let mut scalars = self
            .left_value
            .iter()
            .chain(self.right_value.iter())
            .chain(self.left_derivatives.iter())
            .chain(self.right_derivatives.iter());
        if scalars.any(|v| !v.is_finite()) {
            return Err(MathError::non_finite("segment edge parameters"));
        }
        if self
            .response_values
            .iter()
            .any(|(u, v)| !u.is_finite() || !v.is_finite())
        {
            return Err(MathError::non_finite("segment response values"));
        }
        for constraint in &self.response_constraints {
            constraint.check_finite("segment response constraint")?;
        }
        if self
            .basis_constraints
            .iter()
            .any(|c| !c.target.is_finite() || c.weights.iter().any(|w| !w.is_finite()))
        {
            return Err(MathError::non_finite("segment basis constraint"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count() {
        let params = CalibrationParams::new()
            .with_left_value(1.0)
            .with_left_derivatives(vec![0.5, 0.0])
            .with_response_constraint(ResponseConstraint::value_at(1.0, 2.0));
        assert_eq!(params.row_count(), 4);
        assert!(params.check_finite().is_ok());
    }

    #[test]
    fn test_non_finite_detected() {
        let params = CalibrationParams::new().with_right_value(f64::NAN);
        assert!(matches!(params.check_finite(), Err(MathError::NonFinite { .. })));
        let params = CalibrationParams::new()
            .with_response_constraint(ResponseConstraint::new(vec![(f64::INFINITY, 1.0)], 0.0));
        assert!(params.check_finite().is_err());
    }

    #[test]
    fn test_max_ordinate() {
        let constraint = ResponseConstraint::new(vec![(3.0, 0.5), (7.0, 1.0), (5.0, 0.1)], 1.0);
        assert_eq!(constraint.max_ordinate(), Some(7.0));
        assert_eq!(ResponseConstraint::default().max_ordinate(), None);
    }
}
