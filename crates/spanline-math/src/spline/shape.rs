//! Multiplicative shape-control functions.

use serde::{Deserialize, Serialize};

use crate::basis::falling_factorial;
use crate::error::{MathError, MathResult};

/// A positive scalar function `S(u)` multiplying the basis expansion.
///
/// The segment response becomes `S(u) · Σ cᵢ φᵢ(u)`, so derivatives pick up
/// the Leibniz product `Σⱼ C(k,j) S^(k-j) φ^(j)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeControl {
    /// `S(u) = 1`.
    #[default]
    None,
    /// `S(u) = 1 / (1 + λu)`.
    RationalLinear {
        /// Shape parameter λ, greater than -1.
        lambda: f64,
    },
    /// `S(u) = 1 / (1 + λu(1-u))`.
    RationalQuadratic {
        /// Shape parameter λ, greater than -4.
        lambda: f64,
    },
    /// `S(u) = e^(-λu)`.
    ExponentialDecay {
        /// Decay rate λ.
        lambda: f64,
    },
}

impl ShapeControl {
    /// Checks that the function stays finite and positive on `[0, 1]`.
    pub fn validate(&self) -> MathResult<()> {
        let ok = match *self {
            Self::None => true,
            Self::RationalLinear { lambda } => lambda.is_finite() && lambda > -1.0,
            Self::RationalQuadratic { lambda } => lambda.is_finite() && lambda > -4.0,
            Self::ExponentialDecay { lambda } => lambda.is_finite(),
        };
        if ok {
            Ok(())
        } else {
            Err(MathError::invalid_input(format!("invalid shape control {self:?}")))
        }
    }

    /// Returns `true` when no shaping is applied.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// `order`-th derivative of `S` at `u`.
    #[must_use]
    pub fn evaluate(&self, u: f64, order: usize) -> f64 {
        match *self {
            Self::None => {
                if order == 0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::RationalLinear { lambda } => {
                let sign = if order % 2 == 0 { 1.0 } else { -1.0 };
                sign * falling_factorial(order, order) * lambda.powi(order as i32)
                    / (1.0 + lambda * u).powi(order as i32 + 1)
            }
            Self::RationalQuadratic { lambda } => rational_quadratic(lambda, u, order),
            Self::ExponentialDecay { lambda } => {
                (-lambda).powi(order as i32) * (-lambda * u).exp()
            }
        }
    }
}

/// Derivatives of `1/g` with `g = 1 + λu(1-u)`, from `(f·g)^(k) = 0`.
fn rational_quadratic(lambda: f64, u: f64, order: usize) -> f64 {
    let g = 1.0 + lambda * u * (1.0 - u);
    let g1 = lambda * (1.0 - 2.0 * u);
    let g2 = -2.0 * lambda;

    let mut f = Vec::with_capacity(order + 1);
    f.push(1.0 / g);
    for k in 1..=order {
        let kf = k as f64;
        let mut acc = kf * f[k - 1] * g1;
        if k >= 2 {
            acc += 0.5 * kf * (kf - 1.0) * f[k - 2] * g2;
        }
        f.push(-acc / g);
    }
    f[order]
}
