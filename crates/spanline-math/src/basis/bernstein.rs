//! Bernstein polynomial basis.

use super::{binomial, falling_factorial, int_pow, BasisFunctionSet};
use crate::error::{MathError, MathResult};

/// Bernstein polynomials `B(i,d)(u) = C(d,i) u^i (1-u)^(d-i)`.
///
/// Derivatives use the forward-difference identity
/// `B(i,d)^(k) = d!/(d-k)! Σj (-1)^(k-j) C(k,j) B(i-j, d-k)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BernsteinBasis {
    degree: usize,
}

impl BernsteinBasis {
    /// Creates a Bernstein basis of the given degree (at least 1).
    pub fn new(degree: usize) -> MathResult<Self> {
        if degree == 0 {
            return Err(MathError::invalid_input("Bernstein degree must be at least 1"));
        }
        Ok(Self { degree })
    }

    fn bernstein(i: isize, d: usize, u: f64) -> f64 {
        if i < 0 || i as usize > d {
            return 0.0;
        }
        let i = i as usize;
        binomial(d, i) * int_pow(u, i) * int_pow(1.0 - u, d - i)
    }
}

impl BasisFunctionSet for BernsteinBasis {
    fn num_basis(&self) -> usize {
        self.degree + 1
    }

    fn evaluate(&self, index: usize, u: f64, order: usize) -> f64 {
        let d = self.degree;
        if index > d || order > d {
            return 0.0;
        }
        let sum: f64 = (0..=order)
            .map(|j| {
                let sign = if (order - j) % 2 == 0 { 1.0 } else { -1.0 };
                sign * binomial(order, j) * Self::bernstein(index as isize - j as isize, d - order, u)
            })
            .sum();
        falling_factorial(d, order) * sum
    }

    fn name(&self) -> &'static str {
        "BernsteinPolynomial"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_partition_of_unity() {
        let basis = BernsteinBasis::new(4).unwrap();
        for u in [0.0, 0.25, 0.6, 1.0] {
            let total: f64 = basis.evaluate_all(u, 0).iter().sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-14);
            let slope: f64 = basis.evaluate_all(u, 1).iter().sum();
            assert_relative_eq!(slope, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_edge_interpolation() {
        let basis = BernsteinBasis::new(3).unwrap();
        assert_eq!(basis.evaluate_all(0.0, 0), vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(basis.evaluate_all(1.0, 0), vec![0.0, 0.0, 0.0, 1.0]);
        // B(0,3)'(0) = -3, B(1,3)'(0) = 3
        assert_relative_eq!(basis.evaluate(0, 0.0, 1), -3.0);
        assert_relative_eq!(basis.evaluate(1, 0.0, 1), 3.0);
    }
}
