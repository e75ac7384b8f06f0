//! Linear constraints on the latent response.
//!
//! Every calibration instrument reduces to one [`LinearConstraint`]
//! `Σ wₖ · R(xₖ) = target` over global ordinates. Terms are kept sorted by
//! ordinate and merged when two terms land on the same ordinate.

use spanline_math::spline::ResponseConstraint;

use crate::error::{CurveError, CurveResult};

/// `Σ wₖ · R(xₖ) = target`.
///
/// # Example
///
/// ```rust
/// use spanline_curves::constraint::LinearConstraint;
///
/// let c = LinearConstraint::new(0.0)
///     .with_term(10.0, 1.0)
///     .with_term(5.0, -1.0)
///     .with_term(10.0, 0.5);
/// assert_eq!(c.terms(), &[(5.0, -1.0), (10.0, 1.5)]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearConstraint {
    terms: Vec<(f64, f64)>,
    target: f64,
}

impl LinearConstraint {
    /// Creates a constraint with no terms.
    #[must_use]
    pub fn new(target: f64) -> Self {
        Self {
            terms: Vec::new(),
            target,
        }
    }

    /// `R(ordinate) = target`.
    #[must_use]
    pub fn point(ordinate: f64, target: f64) -> Self {
        Self::new(target).with_term(ordinate, 1.0)
    }

    /// Adds `weight · R(ordinate)`.
    #[must_use]
    pub fn with_term(mut self, ordinate: f64, weight: f64) -> Self {
        self.add_term(ordinate, weight);
        self
    }

    /// Adds `weight · R(ordinate)` in place, merging equal ordinates.
    pub fn add_term(&mut self, ordinate: f64, weight: f64) {
        let at = self.terms.partition_point(|&(x, _)| x < ordinate);
        match self.terms.get_mut(at) {
            Some(term) if term.0 == ordinate => term.1 += weight,
            _ => self.terms.insert(at, (ordinate, weight)),
        }
    }

    /// `(ordinate, weight)` terms in increasing ordinate order.
    #[must_use]
    pub fn terms(&self) -> &[(f64, f64)] {
        &self.terms
    }

    /// Right-hand side.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Whether the constraint references no ordinate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Largest referenced ordinate.
    #[must_use]
    pub fn max_ordinate(&self) -> Option<f64> {
        self.terms.last().map(|&(x, _)| x)
    }

    /// `Σ wₖ · R(xₖ)` for a given response.
    pub fn apply<F>(&self, response: F) -> CurveResult<f64>
    where
        F: Fn(f64) -> CurveResult<f64>,
    {
        self.terms
            .iter()
            .map(|&(x, w)| -> CurveResult<f64> { Ok(w * response(x)?) })
            .sum()
    }

    /// `Σ wₖ · R(xₖ) - target`.
    pub fn residual<F>(&self, response: F) -> CurveResult<f64>
    where
        F: Fn(f64) -> CurveResult<f64>,
    {
        Ok(self.apply(response)? - self.target)
    }

    /// Splits off the terms strictly before `start`.
    ///
    /// Returns `(earlier, rest)`; the target stays with `rest`.
    #[must_use]
    pub fn split_before(&self, start: f64) -> (LinearConstraint, LinearConstraint) {
        let at = self.terms.partition_point(|&(x, _)| x < start);
        (
            LinearConstraint {
                terms: self.terms[..at].to_vec(),
                target: 0.0,
            },
            LinearConstraint {
                terms: self.terms[at..].to_vec(),
                target: self.target,
            },
        )
    }

    /// Checks that every term and the target are finite.
    pub fn validate(&self, id: &str) -> CurveResult<()> {
        let finite = self.target.is_finite()
            && self
                .terms
                .iter()
                .all(|(x, w)| x.is_finite() && w.is_finite());
        if finite {
            Ok(())
        } else {
            Err(CurveError::constraint_generation(id, "non-finite constraint term"))
        }
    }
}

impl From<LinearConstraint> for ResponseConstraint {
    fn from(constraint: LinearConstraint) -> Self {
        ResponseConstraint::new(constraint.terms, constraint.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_terms_sorted_and_merged() {
        let c = LinearConstraint::new(1.0)
            .with_term(3.0, 2.0)
            .with_term(1.0, 1.0)
            .with_term(2.0, 0.5)
            .with_term(3.0, -0.5);
        assert_eq!(c.terms(), &[(1.0, 1.0), (2.0, 0.5), (3.0, 1.5)]);
        assert_eq!(c.max_ordinate(), Some(3.0));
        assert!(!c.is_empty());
        assert!(LinearConstraint::new(0.0).is_empty());
    }

    #[test]
    fn test_apply_and_residual() {
        let c = LinearConstraint::new(5.0).with_term(1.0, 2.0).with_term(2.0, 1.0);
        let value = c.apply(|x| Ok(x * x)).unwrap();
        assert_relative_eq!(value, 6.0);
        assert_relative_eq!(c.residual(|x| Ok(x * x)).unwrap(), 1.0);
    }

    #[test]
    fn test_split_before() {
        let c = LinearConstraint::new(4.0)
            .with_term(1.0, 1.0)
            .with_term(2.0, 2.0)
            .with_term(3.0, 3.0);
        let (earlier, rest) = c.split_before(2.0);
        assert_eq!(earlier.terms(), &[(1.0, 1.0)]);
        assert_eq!(earlier.target(), 0.0);
        assert_eq!(rest.terms(), &[(2.0, 2.0), (3.0, 3.0)]);
        assert_eq!(rest.target(), 4.0);
    }

    #[test]
    fn test_validate_rejects_nan() {
        let c = LinearConstraint::point(1.0, f64::NAN);
        assert!(matches!(
            c.validate("X"),
            Err(CurveError::ConstraintGeneration { .. })
        ));
        assert!(LinearConstraint::point(1.0, 0.5).validate("X").is_ok());
    }

    #[test]
    fn test_into_response_constraint() {
        let rc: ResponseConstraint = LinearConstraint::point(7.0, 0.9).into();
        assert_eq!(rc.points, vec![(7.0, 1.0)]);
        assert_eq!(rc.target, 0.9);
    }
}
