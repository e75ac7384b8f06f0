//! Gauss-Legendre quadrature.
//!
//! Integrals of spline responses are taken piecewise, one rule per segment,
//! so an `n`-point rule is exact for polynomial bases up to degree `2n - 1`.

use std::f64::consts::PI;

use crate::error::{MathError, MathResult};

/// Default number of nodes used for segment integrals.
pub const DEFAULT_NODES: usize = 8;

/// Gauss-Legendre nodes and weights on `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussLegendre {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl GaussLegendre {
    /// Builds an `n`-point rule by Newton iteration on `Pₙ`.
    pub fn new(n: usize) -> MathResult<Self> {
        if n == 0 {
            return Err(MathError::invalid_input("quadrature needs at least one node"));
        }

        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];
        let nf = n as f64;
        for i in 0..n.div_ceil(2) {
            let mut z = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
            for _ in 0..100 {
                let (p, dp) = legendre(n, z);
                let dz = p / dp;
                z -= dz;
                if dz.abs() < 1e-15 {
                    break;
                }
            }
            let (_, dp) = legendre(n, z);
            let w = 2.0 / ((1.0 - z * z) * dp * dp);
            nodes[i] = -z;
            nodes[n - 1 - i] = z;
            weights[i] = w;
            weights[n - 1 - i] = w;
        }

        Ok(Self { nodes, weights })
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a rule has at least one node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `(x, weight)` pairs for `∫ₐᵇ`.
    #[must_use]
    pub fn points(&self, a: f64, b: f64) -> Vec<(f64, f64)> {
        let half = 0.5 * (b - a);
        let mid = 0.5 * (b + a);
        self.nodes
            .iter()
            .zip(&self.weights)
            .map(|(&z, &w)| (mid + half * z, half * w))
            .collect()
    }

    /// `∫ₐᵇ f`.
    pub fn integrate<F>(&self, f: F, a: f64, b: f64) -> MathResult<f64>
    where
        F: Fn(f64) -> MathResult<f64>,
    {
        self.points(a, b)
            .into_iter()
            .map(|(x, w)| -> MathResult<f64> { Ok(w * f(x)?) })
            .sum()
    }
}

impl Default for GaussLegendre {
    fn default() -> Self {
        Self::new(DEFAULT_NODES).unwrap_or_else(|_| Self {
            nodes: vec![0.0],
            weights: vec![2.0],
        })
    }
}

/// `(Pₙ(x), Pₙ'(x))` by the three-term recurrence.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p_prev = 1.0;
    let mut p = x;
    for k in 2..=n {
        let kf = k as f64;
        let next = ((2.0 * kf - 1.0) * x * p - (kf - 1.0) * p_prev) / kf;
        p_prev = p;
        p = next;
    }
    if n == 1 {
        return (x, 1.0);
    }
    (p, n as f64 * (x * p - p_prev) / (x * x - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_weights_sum_to_interval_length() {
        let rule = GaussLegendre::new(8).unwrap();
        let total: f64 = rule.points(2.0, 5.0).iter().map(|(_, w)| w).sum();
        assert_relative_eq!(total, 3.0, epsilon = 1e-13);
    }

    #[test]
    fn test_exact_for_degree_fifteen() {
        let rule = GaussLegendre::default();
        assert_eq!(rule.len(), DEFAULT_NODES);
        let integral = rule.integrate(|x| Ok(x.powi(15) + x.powi(4)), 0.0, 1.0).unwrap();
        assert_relative_eq!(integral, 1.0 / 16.0 + 0.2, epsilon = 1e-13);
    }

    #[test]
    fn test_single_node_is_midpoint() {
        let rule = GaussLegendre::new(1).unwrap();
        let points = rule.points(1.0, 3.0);
        assert_eq!(points.len(), 1);
        assert_relative_eq!(points[0].0, 2.0, epsilon = 1e-15);
        assert_relative_eq!(points[0].1, 2.0, epsilon = 1e-15);
    }

    #[test]
    fn test_zero_nodes_rejected() {
        assert!(GaussLegendre::new(0).is_err());
    }

    #[test]
    fn test_propagates_integrand_error() {
        let rule = GaussLegendre::new(4).unwrap();
        let result = rule.integrate(|_| Err(MathError::invalid_input("boom")), 0.0, 1.0);
        assert!(result.is_err());
    }
}
