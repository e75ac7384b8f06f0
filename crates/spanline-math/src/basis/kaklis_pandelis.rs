//! Kaklis-Pandelis polynomial tension basis.

use super::{falling_factorial, int_pow, BasisFunctionSet};
use crate::error::{MathError, MathResult};

/// `1, u, (1-u)^m, u^m`.
///
/// Raising the degree `m` concentrates curvature near the segment edges,
/// which acts as a polynomial tension. `m = 3` spans the cubics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KaklisPandelisBasis {
    degree: usize,
}

impl KaklisPandelisBasis {
    /// Creates the basis; the tension degree must be at least 3.
    ///
    /// At `m = 2` the set is linearly dependent, since
    /// `(1-u)² = 1 - 2u + u²`.
    pub fn new(degree: usize) -> MathResult<Self> {
        if degree < 3 {
            return Err(MathError::invalid_input(format!(
                "Kaklis-Pandelis degree must be at least 3, got {degree}"
            )));
        }
        Ok(Self { degree })
    }

    /// Tension degree m.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl BasisFunctionSet for KaklisPandelisBasis {
    fn num_basis(&self) -> usize {
        4
    }

    fn evaluate(&self, index: usize, u: f64, order: usize) -> f64 {
        let m = self.degree;
        match index {
            0 => {
                if order == 0 {
                    1.0
                } else {
                    0.0
                }
            }
            1 => match order {
                0 => u,
                1 => 1.0,
                _ => 0.0,
            },
            2 => {
                if order > m {
                    return 0.0;
                }
                let sign = if order % 2 == 0 { 1.0 } else { -1.0 };
                sign * falling_factorial(m, order) * int_pow(1.0 - u, m - order)
            }
            3 => {
                if order > m {
                    return 0.0;
                }
                falling_factorial(m, order) * int_pow(u, m - order)
            }
            _ => 0.0,
        }
    }

    fn name(&self) -> &'static str {
        "KaklisPandelis"
    }
}
