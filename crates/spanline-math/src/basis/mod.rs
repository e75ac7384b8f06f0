//! Basis function sets for spline segments.
//!
//! Every set is evaluated on the segment-local coordinate `u ∈ [0, 1]`, and
//! every set supports derivatives of arbitrary order in closed form so that
//! Ck continuity rows and curvature penalties can be assembled exactly.
//!
//! | Family | Functions | Count |
//! |--------|-----------|-------|
//! | [`PolynomialBasis`] | `u^i` | degree + 1 |
//! | [`BernsteinBasis`] | `C(d,i) u^i (1-u)^(d-i)` | degree + 1 |
//! | [`HyperbolicTensionBasis`] | `1, u, cosh(τu), sinh(τu)` | 4 |
//! | [`ExponentialTensionBasis`] | `1, u, e^(τu), e^(-τu)` | 4 |
//! | [`KaklisPandelisBasis`] | `1, u, (1-u)^m, u^m` | 4 |

mod bernstein;
mod kaklis_pandelis;
mod polynomial;
mod tension;

pub use bernstein::BernsteinBasis;
pub use kaklis_pandelis::KaklisPandelisBasis;
pub use polynomial::PolynomialBasis;
pub use tension::{ExponentialTensionBasis, HyperbolicTensionBasis};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MathError, MathResult};

/// A finite set of basis functions on the local coordinate `u ∈ [0, 1]`.
pub trait BasisFunctionSet: Send + Sync + fmt::Debug {
    /// Number of functions in the set.
    fn num_basis(&self) -> usize;

    /// Value of the `order`-th derivative of function `index` at `u`.
    ///
    /// `order == 0` returns the function value. Indices outside
    /// `0..num_basis()` evaluate to zero.
    fn evaluate(&self, index: usize, u: f64, order: usize) -> f64;

    /// Short family name used in diagnostics.
    fn name(&self) -> &'static str;

    /// All functions' `order`-th derivatives at `u`.
    fn evaluate_all(&self, u: f64, order: usize) -> Vec<f64> {
        (0..self.num_basis())
            .map(|i| self.evaluate(i, u, order))
            .collect()
    }
}

/// Basis family selector used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum BasisFamily {
    /// Monomials `u^0 .. u^degree`.
    Polynomial {
        /// Polynomial degree.
        degree: usize,
    },
    /// Bernstein polynomials of a fixed degree.
    BernsteinPolynomial {
        /// Polynomial degree.
        degree: usize,
    },
    /// `1, u, cosh(τu), sinh(τu)`.
    HyperbolicTension {
        /// Tension τ.
        tension: f64,
    },
    /// `1, u, e^(τu), e^(-τu)`.
    ExponentialTension {
        /// Tension τ.
        tension: f64,
    },
    /// `1, u, (1-u)^m, u^m`.
    KaklisPandelis {
        /// Polynomial tension degree m.
        degree: usize,
    },
}

impl Default for BasisFamily {
    fn default() -> Self {
        Self::Polynomial { degree: 3 }
    }
}

impl BasisFamily {
    /// Number of functions the family produces.
    #[must_use]
    pub fn num_basis(&self) -> usize {
        match *self {
            Self::Polynomial { degree } | Self::BernsteinPolynomial { degree } => degree + 1,
            Self::HyperbolicTension { .. }
            | Self::ExponentialTension { .. }
            | Self::KaklisPandelis { .. } => 4,
        }
    }

    /// Instantiates the basis set.
    pub fn build(&self) -> MathResult<Arc<dyn BasisFunctionSet>> {
        Ok(match *self {
            Self::Polynomial { degree } => Arc::new(PolynomialBasis::new(degree)?),
            Self::BernsteinPolynomial { degree } => Arc::new(BernsteinBasis::new(degree)?),
            Self::HyperbolicTension { tension } => Arc::new(HyperbolicTensionBasis::new(tension)?),
            Self::ExponentialTension { tension } => {
                Arc::new(ExponentialTensionBasis::new(tension)?)
            }
            Self::KaklisPandelis { degree } => Arc::new(KaklisPandelisBasis::new(degree)?),
        })
    }
}

/// `n! / (n-k)!`, zero when `k > n`.
pub(crate) fn falling_factorial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    ((n - k + 1)..=n).fold(1.0, |acc, v| acc * v as f64)
}

/// Binomial coefficient `C(n, k)`.
pub(crate) fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// `x^p` with `0^0 == 1`, stable at the segment edges.
pub(crate) fn int_pow(x: f64, p: usize) -> f64 {
    if p == 0 {
        1.0
    } else {
        x.powi(p as i32)
    }
}

pub(crate) fn check_tension(tension: f64) -> MathResult<()> {
    if !tension.is_finite() || tension <= 0.0 {
        return Err(MathError::invalid_input(format!(
            "tension must be finite and positive, got {tension}"
        )));
    }
    Ok(())
}
