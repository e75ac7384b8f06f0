//! A single calibrated spline piece.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use nalgebra::{DMatrix, DVector};

use crate::basis::{binomial, BasisFunctionSet};
use crate::error::{MathError, MathResult};
use crate::jacobian::WengertJacobian;
use crate::linear_algebra::solve_with_inverse;
use crate::quadrature::GaussLegendre;
use crate::solvers::{brent, SolverConfig};
use crate::spline::{CalibrationParams, SegmentDesign, ShapeControl};

/// Points at which `dR/du` is sampled to bracket turning points.
const MONOTONE_SAMPLES: usize = 64;

/// Shape of a calibrated segment's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonotoneType {
    /// No interior turning point.
    Monotonic,
    /// One interior maximum.
    Maximum,
    /// One interior minimum.
    Minimum,
    /// The slope touches zero with vanishing curvature.
    Inflection,
    /// More than one interior turning point.
    NonMonotonic,
}

impl fmt::Display for MonotoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Monotonic => "MONOTONIC",
            Self::Maximum => "MAXIMUM",
            Self::Minimum => "MINIMUM",
            Self::Inflection => "INFLECTION",
            Self::NonMonotonic => "NON_MONOTONIC",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
struct SegmentState {
    coefficients: DVector<f64>,
    edge_jacobian: DMatrix<f64>,
}

/// The spline piece between two consecutive ordinates.
///
/// Responses are `S(u) · Σ cᵢ φᵢ(u)` on the local coordinate
/// `u = (x - left) / (right - left)`. A segment starts uncalibrated; a
/// successful [`calibrate`](Segment::calibrate) replaces its coefficients
/// atomically, a failed one leaves the previous state untouched.
///
/// # Example
///
/// ```rust
/// use spanline_math::spline::{CalibrationParams, Segment, SegmentDesign};
///
/// let mut segment = Segment::new(0.0, 2.0, &SegmentDesign::cubic_polynomial(1)).unwrap();
/// let params = CalibrationParams::new()
///     .with_left_value(1.0)
///     .with_left_derivatives(vec![0.0])
///     .with_right_value(3.0)
///     .with_right_derivatives(vec![0.0]);
/// segment.calibrate(&params).unwrap();
///
/// assert!((segment.response(1.0).unwrap() - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Segment {
    left: f64,
    right: f64,
    basis: Arc<dyn BasisFunctionSet>,
    shape: ShapeControl,
    ck: usize,
    roughness_penalty_order: Option<usize>,
    state: Option<SegmentState>,
}

impl Segment {
    /// Creates an uncalibrated segment over `[left, right]`.
    pub fn new(left: f64, right: f64, design: &SegmentDesign) -> MathResult<Self> {
        design.validate()?;
        Self::with_basis(left, right, design.basis.build()?, design)
    }

    /// Creates an uncalibrated segment sharing an existing basis set.
    pub fn with_basis(
        left: f64,
        right: f64,
        basis: Arc<dyn BasisFunctionSet>,
        design: &SegmentDesign,
    ) -> MathResult<Self> {
        if !left.is_finite() || !right.is_finite() {
            return Err(MathError::non_finite("segment edges"));
        }
        if left >= right {
            return Err(MathError::NonIncreasingOrdinates {
                index: 1,
                prev: left,
                current: right,
            });
        }
        if basis.num_basis() < design.ck + 2 {
            return Err(MathError::invalid_input(format!(
                "{} basis functions cannot honour C{} continuity",
                basis.num_basis(),
                design.ck
            )));
        }
        Ok(Self {
            left,
            right,
            basis,
            shape: design.shape,
            ck: design.ck,
            roughness_penalty_order: design.roughness_penalty_order,
            state: None,
        })
    }

    /// Left ordinate.
    #[must_use]
    pub fn left(&self) -> f64 {
        self.left
    }

    /// Right ordinate.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.right
    }

    /// `right - left`.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Number of basis functions.
    #[must_use]
    pub fn num_basis(&self) -> usize {
        self.basis.num_basis()
    }

    /// Continuity order Ck.
    #[must_use]
    pub fn continuity_order(&self) -> usize {
        self.ck
    }

    /// Shape control.
    #[must_use]
    pub fn shape(&self) -> ShapeControl {
        self.shape
    }

    /// Roughness penalty order, if configured.
    #[must_use]
    pub fn roughness_penalty_order(&self) -> Option<usize> {
        self.roughness_penalty_order
    }

    /// Basis family name.
    #[must_use]
    pub fn basis_name(&self) -> &'static str {
        self.basis.name()
    }

    /// Whether a calibration has succeeded.
    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.state.is_some()
    }

    /// Calibrated basis coefficients.
    #[must_use]
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.coefficients.as_slice())
    }

    /// Maps a global ordinate to the local coordinate.
    #[must_use]
    pub fn local(&self, x: f64) -> f64 {
        (x - self.left) / self.width()
    }

    /// Whether `x` lies in `[left, right]`.
    #[must_use]
    pub fn contains(&self, x: f64) -> bool {
        x >= self.left && x <= self.right
    }

    /// Coefficient weights of the `order`-th local derivative at `u`.
    ///
    /// `R^(k)(u) = row · c`; with shape control the row carries the
    /// Leibniz expansion `Σⱼ C(k,j) S^(k-j)(u) φᵢ^(j)(u)`.
    #[must_use]
    pub fn basis_row(&self, u: f64, order: usize) -> Vec<f64> {
        if self.shape.is_none() {
            return self.basis.evaluate_all(u, order);
        }
        let mut row = vec![0.0; self.num_basis()];
        for j in 0..=order {
            let factor = binomial(order, j) * self.shape.evaluate(u, order - j);
            if factor == 0.0 {
                continue;
            }
            for (i, value) in row.iter_mut().enumerate() {
                *value += factor * self.basis.evaluate(i, u, j);
            }
        }
        row
    }

    fn state(&self) -> MathResult<&SegmentState> {
        self.state.as_ref().ok_or(MathError::NotCalibrated {
            left: self.left,
            right: self.right,
        })
    }

    fn eval(&self, coefficients: &DVector<f64>, u: f64, order: usize) -> f64 {
        self.basis_row(u, order)
            .iter()
            .zip(coefficients.iter())
            .map(|(r, c)| r * c)
            .sum()
    }

    /// Solves the segment system without touching the segment.
    fn solve(&self, params: &CalibrationParams) -> MathResult<SegmentState> {
        params.check_finite()?;
        let n = self.num_basis();
        let rows = params.row_count();
        if rows != n {
            return Err(MathError::ConstraintCountMismatch {
                constraints: rows,
                basis: n,
            });
        }

        let mut a = DMatrix::zeros(n, n);
        let mut b = DVector::zeros(n);
        let mut r = 0;
        let mut push = |row: Vec<f64>, rhs: f64| {
            for (c, v) in row.into_iter().enumerate() {
                a[(r, c)] = v;
            }
            b[r] = rhs;
            r += 1;
        };

        if let Some(value) = params.left_value {
            push(self.basis_row(0.0, 0), value);
        }
        for (k, &d) in params.left_derivatives.iter().enumerate() {
            push(self.basis_row(0.0, k + 1), d);
        }
        if let Some(value) = params.right_value {
            push(self.basis_row(1.0, 0), value);
        }
        for (k, &d) in params.right_derivatives.iter().enumerate() {
            push(self.basis_row(1.0, k + 1), d);
        }
        for &(u, value) in &params.response_values {
            push(self.basis_row(u, 0), value);
        }
        for constraint in &params.response_constraints {
            let mut row = vec![0.0; n];
            for &(u, weight) in &constraint.points {
                for (acc, v) in row.iter_mut().zip(self.basis_row(u, 0)) {
                    *acc += weight * v;
                }
            }
            push(row, constraint.target);
        }
        for constraint in &params.basis_constraints {
            if constraint.weights.len() != n {
                return Err(MathError::DimensionMismatch {
                    rows1: 1,
                    cols1: constraint.weights.len(),
                    rows2: n,
                    cols2: 1,
                });
            }
            push(constraint.weights.clone(), constraint.target);
        }

        let solution = solve_with_inverse(&a, &b)?;
        trace!(
            "segment [{}, {}] solved with {:?}",
            self.left,
            self.right,
            solution.method
        );
        Ok(SegmentState {
            coefficients: solution.x,
            edge_jacobian: solution.inverse,
        })
    }

    /// Calibrates the segment from a full set of rows.
    ///
    /// # Errors
    ///
    /// `ConstraintCountMismatch` when the rows do not match the basis count,
    /// `NonFinite` for NaN inputs, `SingularMatrix` when both solves fail.
    /// The segment is unchanged on error.
    pub fn calibrate(&mut self, params: &CalibrationParams) -> MathResult<()> {
        let state = self.solve(params)?;
        self.state = Some(state);
        Ok(())
    }

    /// Calibrates from the prior segment's right-edge state.
    ///
    /// The left value and the first `ck` left derivatives are taken from
    /// `prior` at its right edge, rescaled to this segment's width; the
    /// remaining rows come from `params`, whose left-edge fields must be
    /// empty.
    pub fn calibrate_from_prior(
        &mut self,
        prior: &Segment,
        params: CalibrationParams,
    ) -> MathResult<()> {
        if params.left_value.is_some() || !params.left_derivatives.is_empty() {
            return Err(MathError::invalid_input(
                "left-edge rows are inherited from the prior segment",
            ));
        }
        let edge = prior.state()?;
        let ratio = self.width() / prior.width();
        let left_value = prior.eval(&edge.coefficients, 1.0, 0);
        let left_derivatives = (1..=self.ck)
            .map(|k| prior.eval(&edge.coefficients, 1.0, k) * ratio.powi(k as i32))
            .collect();
        let params = CalibrationParams {
            left_value: Some(left_value),
            left_derivatives,
            ..params
        };
        self.calibrate(&params)
    }

    /// `order`-th derivative with respect to the local coordinate.
    pub fn local_derivative(&self, u: f64, order: usize) -> MathResult<f64> {
        let state = self.state()?;
        Ok(self.eval(&state.coefficients, u, order))
    }

    /// Response at local `u`.
    pub fn local_response(&self, u: f64) -> MathResult<f64> {
        self.local_derivative(u, 0)
    }

    /// Response at global ordinate `x`.
    pub fn response(&self, x: f64) -> MathResult<f64> {
        self.derivative(x, 0)
    }

    /// `order`-th derivative with respect to the global ordinate.
    pub fn derivative(&self, x: f64, order: usize) -> MathResult<f64> {
        if !x.is_finite() {
            return Err(MathError::non_finite("segment query ordinate"));
        }
        if !self.contains(x) {
            return Err(MathError::OutOfRange {
                x,
                min: self.left,
                max: self.right,
            });
        }
        let local = self.local_derivative(self.local(x), order)?;
        Ok(local / self.width().powi(order as i32))
    }

    /// Sensitivity of the coefficients to the calibration right-hand side.
    ///
    /// Row `i` is coefficient `i`; column `j` is the `j`-th row of the
    /// calibration system in [`CalibrationParams`] order.
    pub fn edge_jacobian(&self) -> MathResult<WengertJacobian> {
        Ok(WengertJacobian::from_matrix(self.state()?.edge_jacobian.clone()))
    }

    pub(crate) fn edge_matrix(&self) -> MathResult<&DMatrix<f64>> {
        Ok(&self.state()?.edge_jacobian)
    }

    /// Classifies the shape of the response across the segment.
    ///
    /// A failed root refinement degrades to [`MonotoneType::Monotonic`].
    pub fn monotone_type(&self) -> MathResult<MonotoneType> {
        let state = self.state()?;
        let samples: Vec<(f64, f64)> = (0..MONOTONE_SAMPLES)
            .map(|i| {
                let u = (i as f64 + 0.5) / MONOTONE_SAMPLES as f64;
                (u, self.eval(&state.coefficients, u, 1))
            })
            .collect();
        let scale = samples.iter().fold(0.0_f64, |m, &(_, d)| m.max(d.abs()));
        let level = self
            .eval(&state.coefficients, 0.0, 0)
            .abs()
            .max(self.eval(&state.coefficients, 1.0, 0).abs());
        if scale <= 1e-13 * level.max(1.0) || !scale.is_finite() {
            return Ok(MonotoneType::Monotonic);
        }

        let floor = 1e-12 * scale;
        let significant: Vec<(f64, f64)> =
            samples.into_iter().filter(|&(_, d)| d.abs() > floor).collect();
        let brackets: Vec<(f64, f64)> = significant
            .windows(2)
            .filter(|w| w[0].1.signum() != w[1].1.signum())
            .map(|w| (w[0].0, w[1].0))
            .collect();

        let (a, b) = match brackets.as_slice() {
            [] => return Ok(MonotoneType::Monotonic),
            [single] => *single,
            _ => return Ok(MonotoneType::NonMonotonic),
        };

        let slope = |u: f64| self.eval(&state.coefficients, u, 1);
        match brent(slope, a, b, &SolverConfig::default()) {
            Ok(result) => {
                let curvature = self.eval(&state.coefficients, result.root, 2);
                Ok(if curvature.abs() <= 1e-9 * scale {
                    MonotoneType::Inflection
                } else if curvature < 0.0 {
                    MonotoneType::Maximum
                } else {
                    MonotoneType::Minimum
                })
            }
            Err(e) => {
                debug!(
                    "turning point search on [{}, {}] failed ({e}), treating as monotonic",
                    self.left, self.right
                );
                Ok(MonotoneType::Monotonic)
            }
        }
    }

    /// `∫ (R^(order)(x))² dx` across the segment, in global units.
    pub fn roughness(&self, order: usize) -> MathResult<f64> {
        let state = self.state()?;
        let scale = self.width().powi(order as i32);
        let sum: f64 = GaussLegendre::default()
            .points(0.0, 1.0)
            .into_iter()
            .map(|(u, w)| {
                let d = self.eval(&state.coefficients, u, order) / scale;
                w * d * d
            })
            .sum();
        Ok(sum * self.width())
    }
}
