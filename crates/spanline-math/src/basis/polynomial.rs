//! Monomial basis.

use super::{falling_factorial, int_pow, BasisFunctionSet};
use crate::error::{MathError, MathResult};

/// Monomials `1, u, u², …, u^degree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolynomialBasis {
    degree: usize,
}

impl PolynomialBasis {
    /// Creates a monomial basis of the given degree (at least 1).
    pub fn new(degree: usize) -> MathResult<Self> {
        if degree == 0 {
            return Err(MathError::invalid_input("polynomial degree must be at least 1"));
        }
        Ok(Self { degree })
    }

    /// Polynomial degree.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl BasisFunctionSet for PolynomialBasis {
    fn num_basis(&self) -> usize {
        self.degree + 1
    }

    fn evaluate(&self, index: usize, u: f64, order: usize) -> f64 {
        if index > self.degree || order > index {
            return 0.0;
        }
        falling_factorial(index, order) * int_pow(u, index - order)
    }

    fn name(&self) -> &'static str {
        "Polynomial"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubic_values() {
        let basis = PolynomialBasis::new(3).unwrap();
        assert_eq!(basis.num_basis(), 4);
        assert_eq!(basis.evaluate_all(0.5, 0), vec![1.0, 0.5, 0.25, 0.125]);
        assert_eq!(basis.evaluate_all(1.0, 1), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(basis.evaluate_all(0.0, 2), vec![0.0, 0.0, 2.0, 0.0]);
        assert_eq!(basis.evaluate(3, 0.3, 3), 6.0);
        assert_eq!(basis.evaluate(3, 0.3, 4), 0.0);
    }
}
