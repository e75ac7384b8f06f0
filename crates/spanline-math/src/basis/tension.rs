//! Hyperbolic and exponential tension bases.
//!
//! Both families span `{1, u}` plus a pair of exponentials in `τu`, so a
//! large tension pulls the segment toward linear interpolation.

use super::{check_tension, BasisFunctionSet};
use crate::error::MathResult;

/// `1, u, cosh(τu), sinh(τu)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HyperbolicTensionBasis {
    tension: f64,
}

impl HyperbolicTensionBasis {
    /// Creates the basis with a positive, finite tension.
    pub fn new(tension: f64) -> MathResult<Self> {
        check_tension(tension)?;
        Ok(Self { tension })
    }

    /// Tension τ.
    #[must_use]
    pub fn tension(&self) -> f64 {
        self.tension
    }
}

impl BasisFunctionSet for HyperbolicTensionBasis {
    fn num_basis(&self) -> usize {
        4
    }

    fn evaluate(&self, index: usize, u: f64, order: usize) -> f64 {
        let t = self.tension;
        match index {
            0 => linear_part(1.0, 0.0, u, order),
            1 => linear_part(0.0, 1.0, u, order),
            2 | 3 => {
                let scale = t.powi(order as i32);
                // cosh and sinh swap on every differentiation
                let use_cosh = (index == 2) == (order % 2 == 0);
                if use_cosh {
                    scale * (t * u).cosh()
                } else {
                    scale * (t * u).sinh()
                }
            }
            _ => 0.0,
        }
    }

    fn name(&self) -> &'static str {
        "HyperbolicTension"
    }
}

/// `1, u, e^(τu), e^(-τu)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialTensionBasis {
    tension: f64,
}

impl ExponentialTensionBasis {
    /// Creates the basis with a positive, finite tension.
    pub fn new(tension: f64) -> MathResult<Self> {
        check_tension(tension)?;
        Ok(Self { tension })
    }

    /// Tension τ.
    #[must_use]
    pub fn tension(&self) -> f64 {
        self.tension
    }
}

impl BasisFunctionSet for ExponentialTensionBasis {
    fn num_basis(&self) -> usize {
        4
    }

    fn evaluate(&self, index: usize, u: f64, order: usize) -> f64 {
        let t = self.tension;
        match index {
            0 => linear_part(1.0, 0.0, u, order),
            1 => linear_part(0.0, 1.0, u, order),
            2 => t.powi(order as i32) * (t * u).exp(),
            3 => (-t).powi(order as i32) * (-t * u).exp(),
            _ => 0.0,
        }
    }

    fn name(&self) -> &'static str {
        "ExponentialTension"
    }
}

/// Derivatives of `a + b u`.
fn linear_part(a: f64, b: f64, u: f64, order: usize) -> f64 {
    match order {
        0 => a + b * u,
        1 => b,
        _ => 0.0,
    }
}
