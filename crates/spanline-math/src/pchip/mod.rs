//! Monotonicity-preserving node slope estimators.
//!
//! Each estimator maps `(xs, ys)` to one slope per node. The slopes feed
//! [`Stretch::monotone`](crate::spline::Stretch::monotone), which builds C1
//! Hermite segments from them instead of solving for Ck continuity.
//!
//! Except for Akima and Kruger, every estimator uses the same one-sided
//! three-point formula at the first and last node; only interior nodes
//! differ. The monotone limiters (Hyman83, Hyman89, Van Leer and
//! Huynh-Le Floch) zero an end slope whose sign disagrees with the end
//! secant.
//!
//! # Example
//!
//! ```rust
//! use spanline_math::pchip::SlopeEstimator;
//!
//! let xs = [0.0, 1.0, 2.0, 3.0];
//! let ys = [0.0, 1.0, 1.0, 2.0];
//! let slopes = SlopeEstimator::VanLeer.estimate(&xs, &ys).unwrap();
//! // flat middle secant zeroes the limited slopes around it
//! assert_eq!(slopes[1], 0.0);
//! assert_eq!(slopes[2], 0.0);
//! ```

mod estimators;

pub use estimators::{
    akima, bessel, harmonic, huynh_le_floch, hyman83, hyman89, kruger, van_leer,
};

use serde::{Deserialize, Serialize};

use crate::error::{validate_ordinates, MathError, MathResult};

/// Node slope estimator selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "estimator", rename_all = "snake_case")]
pub enum SlopeEstimator {
    /// Weighted average of neighbouring secants.
    Bessel,
    /// Hyman (1983) limiter on the Bessel slope.
    Hyman83 {
        /// Clamp slopes between the neighbouring secants.
        eliminate_spurious_extrema: bool,
    },
    /// Dougherty-Edelman-Hyman (1989) curvature-aware limiter.
    Hyman89,
    /// Weighted harmonic mean of neighbouring secants.
    Harmonic {
        /// Clamp the end slopes to preserve monotonicity.
        monotone_filter: bool,
    },
    /// Van Leer flux limiter.
    VanLeer,
    /// Huynh-Le Floch limiter.
    HuynhLeFloch,
    /// Akima (1970) slopes with extrapolated end secants.
    Akima,
    /// Kruger constrained slopes.
    Kruger,
}

impl SlopeEstimator {
    /// Slopes at every node of `(xs, ys)`.
    ///
    /// # Errors
    ///
    /// Requires at least three nodes with finite, strictly increasing
    /// ordinates and finite responses.
    pub fn estimate(&self, xs: &[f64], ys: &[f64]) -> MathResult<Vec<f64>> {
        match *self {
            Self::Bessel => bessel(xs, ys),
            Self::Hyman83 {
                eliminate_spurious_extrema,
            } => hyman83(xs, ys, eliminate_spurious_extrema),
            Self::Hyman89 => hyman89(xs, ys),
            Self::Harmonic { monotone_filter } => harmonic(xs, ys, monotone_filter),
            Self::VanLeer => van_leer(xs, ys),
            Self::HuynhLeFloch => huynh_le_floch(xs, ys),
            Self::Akima => akima(xs, ys),
            Self::Kruger => kruger(xs, ys),
        }
    }

    /// Estimator name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bessel => "Bessel",
            Self::Hyman83 { .. } => "Hyman83",
            Self::Hyman89 => "Hyman89",
            Self::Harmonic { .. } => "Harmonic",
            Self::VanLeer => "VanLeer",
            Self::HuynhLeFloch => "HuynhLeFloch",
            Self::Akima => "Akima",
            Self::Kruger => "Kruger",
        }
    }
}

/// Node spacings and secant slopes.
#[derive(Debug, Clone)]
pub(crate) struct Secants {
    pub h: Vec<f64>,
    pub s: Vec<f64>,
}

impl Secants {
    pub(crate) fn new(xs: &[f64], ys: &[f64]) -> MathResult<Self> {
        if xs.len() != ys.len() {
            return Err(MathError::invalid_input(format!(
                "{} ordinates but {} responses",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 3 {
            return Err(MathError::insufficient_data(3, xs.len()));
        }
        validate_ordinates(xs)?;
        if ys.iter().any(|y| !y.is_finite()) {
            return Err(MathError::non_finite("slope estimator responses"));
        }
        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let s = ys
            .windows(2)
            .zip(&h)
            .map(|(w, h)| (w[1] - w[0]) / h)
            .collect();
        Ok(Self { h, s })
    }

    pub(crate) fn nodes(&self) -> usize {
        self.h.len() + 1
    }

    /// Bessel (parabolic) slope at interior node `i`.
    pub(crate) fn parabolic(&self, i: usize) -> f64 {
        let (h, s) = (&self.h, &self.s);
        (h[i] * s[i - 1] + h[i - 1] * s[i]) / (h[i - 1] + h[i])
    }

    /// One-sided three-point slopes at the first and last node.
    pub(crate) fn end_slopes(&self) -> (f64, f64) {
        let (h, s) = (&self.h, &self.s);
        let m = h.len();
        let first = ((2.0 * h[0] + h[1]) * s[0] - h[0] * s[1]) / (h[0] + h[1]);
        let last = ((2.0 * h[m - 1] + h[m - 2]) * s[m - 1] - h[m - 1] * s[m - 2])
            / (h[m - 2] + h[m - 1]);
        (first, last)
    }

    /// Fills a slope vector from an interior rule plus the shared end slopes.
    pub(crate) fn with_interior<F>(&self, interior: F) -> Vec<f64>
    where
        F: Fn(usize) -> f64,
    {
        let n = self.nodes();
        let (first, last) = self.end_slopes();
        let mut d = Vec::with_capacity(n);
        d.push(first);
        d.extend((1..n - 1).map(interior));
        d.push(last);
        d
    }

    /// Like [`Self::with_interior`], with each end slope zeroed when its
    /// sign disagrees with the end secant.
    pub(crate) fn with_guarded_ends<F>(&self, interior: F) -> Vec<f64>
    where
        F: Fn(usize) -> f64,
    {
        let mut d = self.with_interior(interior);
        let last = d.len() - 1;
        if d[0] * self.s[0] <= 0.0 {
            d[0] = 0.0;
        }
        if d[last] * self.s[last - 1] <= 0.0 {
            d[last] = 0.0;
        }
        d
    }
}
