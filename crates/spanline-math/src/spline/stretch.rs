//! Multi-segment stretches.
//!
//! A stretch covers `[x₀, xₙ]` with `n` contiguous segments. It is built
//! once, either by a left-to-right bootstrap over per-segment constraints
//! ([`Stretch::setup`]) or from node values and slopes
//! ([`Stretch::setup_hermite`]), and is immutable afterwards. Segments are
//! held behind `Arc` so that derived stretches (knot insertion) share the
//! pieces they do not recalibrate.
//!
//! # Jacobians
//!
//! With [`CalibrationDetail::Full`], a bootstrapped stretch keeps
//! `∂cⱼ/∂θ` for every segment, where `θ = (left value, target₀, …, targetₙ₋₁)`.
//! The boundary condition is folded in through the implicit dependence of
//! the starting slope on `θ`.

use std::cell::RefCell;
use std::sync::Arc;

use log::{debug, trace};
use nalgebra::DMatrix;

use crate::basis::BasisFunctionSet;
use crate::error::{validate_ordinates, MathError, MathResult};
use crate::jacobian::WengertJacobian;
use crate::pchip::SlopeEstimator;
use crate::quadrature::GaussLegendre;
use crate::solvers::{secant, SolverConfig};
use crate::spline::{
    BoundaryCondition, CalibrationDetail, CalibrationParams, MonotoneType, ResponseConstraint,
    Segment, SegmentDesign,
};

/// An ordered, contiguous chain of calibrated segments.
#[derive(Debug, Clone)]
pub struct Stretch {
    ordinates: Vec<f64>,
    segments: Vec<Arc<Segment>>,
    design: SegmentDesign,
    jacobians: Option<Arc<Vec<WengertJacobian>>>,
}

impl Stretch {
    /// Bootstraps a stretch from one response constraint per segment.
    ///
    /// Segment `j` is calibrated from its left neighbour's edge state plus
    /// `constraints[j]`. Constraint ordinates are global; terms at or before
    /// a segment's left edge are evaluated on the already calibrated
    /// segments and moved to the right-hand side. The first segment takes
    /// `left_value` and a slope solved from `boundary` (zero when `ck` is
    /// zero). On every segment, left derivatives of order above `ck` are
    /// zero; with fewer continuity orders than free coefficients this is
    /// what closes each segment's system.
    ///
    /// # Errors
    ///
    /// Fails on invalid ordinates or inputs, on a constraint that reaches
    /// past its segment's right edge, and on the first segment that cannot
    /// be calibrated. No partial stretch is returned.
    pub fn setup(
        ordinates: Vec<f64>,
        design: SegmentDesign,
        left_value: f64,
        constraints: &[ResponseConstraint],
        boundary: BoundaryCondition,
        detail: CalibrationDetail,
    ) -> MathResult<Self> {
        validate_ordinates(&ordinates)?;
        if ordinates.len() < 2 {
            return Err(MathError::insufficient_data(2, ordinates.len()));
        }
        design.validate()?;
        let n = ordinates.len() - 1;
        if constraints.len() != n {
            return Err(MathError::invalid_input(format!(
                "{n} segments need {n} constraints, got {}",
                constraints.len()
            )));
        }
        if !left_value.is_finite() {
            return Err(MathError::non_finite("stretch left value"));
        }
        for constraint in constraints {
            constraint.check_finite("stretch constraint")?;
        }

        let (segments, jacobians) = {
            let bootstrap = Bootstrap {
                ordinates: &ordinates,
                design: &design,
                basis: design.basis.build()?,
                left_value,
                constraints,
            };
            let slope = if design.ck == 0 {
                0.0
            } else {
                bootstrap.solve_slope(boundary)?
            };
            let pass = bootstrap.run(slope, detail.tracks_jacobian())?;
            let jacobians = if detail.tracks_jacobian() {
                Some(Arc::new(bootstrap.reduce(&pass, boundary)?))
            } else {
                None
            };
            (pass.segments, jacobians)
        };

        debug!(
            "calibrated stretch [{}, {}] with {} segments ({:?}, {:?})",
            ordinates[0], ordinates[n], n, boundary, detail
        );
        Ok(Self {
            ordinates,
            segments: segments.into_iter().map(Arc::new).collect(),
            design,
            jacobians,
        })
    }

    /// Builds a stretch from node responses and per-segment edge slopes.
    ///
    /// Slopes are global derivatives. `left_derivatives[j]` and
    /// `right_derivatives[j]` belong to segment `j`, so unequal neighbouring
    /// values produce a slope jump at the shared knot. Requires a
    /// four-function basis. The Jacobian inputs are the node responses.
    pub fn setup_hermite(
        ordinates: Vec<f64>,
        design: SegmentDesign,
        responses: &[f64],
        left_derivatives: &[f64],
        right_derivatives: &[f64],
        detail: CalibrationDetail,
    ) -> MathResult<Self> {
        validate_ordinates(&ordinates)?;
        if ordinates.len() < 2 {
            return Err(MathError::insufficient_data(2, ordinates.len()));
        }
        design.validate()?;
        let n = ordinates.len() - 1;
        if responses.len() != n + 1 || left_derivatives.len() != n || right_derivatives.len() != n
        {
            return Err(MathError::invalid_input(format!(
                "Hermite stretch over {} nodes needs {} responses and {n} slopes per edge",
                n + 1,
                n + 1
            )));
        }
        if design.num_basis() != 4 {
            return Err(MathError::invalid_input(
                "Hermite calibration needs exactly four basis functions",
            ));
        }
        let finite = responses
            .iter()
            .chain(left_derivatives)
            .chain(right_derivatives)
            .all(|v| v.is_finite());
        if !finite {
            return Err(MathError::non_finite("Hermite node data"));
        }

        let basis = design.basis.build()?;
        let track = detail.tracks_jacobian();
        let mut segments = Vec::with_capacity(n);
        let mut jacobians = Vec::with_capacity(if track { n } else { 0 });
        for j in 0..n {
            let segment = hermite_segment(
                ordinates[j],
                ordinates[j + 1],
                Arc::clone(&basis),
                &design,
                (responses[j], responses[j + 1]),
                (left_derivatives[j], right_derivatives[j]),
            )
            .map_err(|e| MathError::segment_calibration(j, &e))?;
            if track {
                let edge = segment.edge_matrix()?;
                let mut jac = DMatrix::zeros(4, n + 1);
                jac.set_column(j, &edge.column(0));
                jac.set_column(j + 1, &edge.column(2));
                jacobians.push(WengertJacobian::from_matrix(jac));
            }
            segments.push(Arc::new(segment));
        }

        trace!("Hermite stretch over {} nodes", n + 1);
        Ok(Self {
            ordinates,
            segments,
            design,
            jacobians: track.then(|| Arc::new(jacobians)),
        })
    }

    /// Ck spline through `(xs, ys)` closed by `boundary`.
    pub fn interpolate(
        xs: &[f64],
        ys: &[f64],
        design: &SegmentDesign,
        boundary: BoundaryCondition,
    ) -> MathResult<Self> {
        check_nodes(xs, ys)?;
        let constraints: Vec<ResponseConstraint> = xs
            .iter()
            .zip(ys)
            .skip(1)
            .map(|(&x, &y)| ResponseConstraint::value_at(x, y))
            .collect();
        Self::setup(
            xs.to_vec(),
            *design,
            ys[0],
            &constraints,
            boundary,
            CalibrationDetail::Full,
        )
    }

    /// C1 Hermite stretch through `(xs, ys)` with one slope per node.
    pub fn hermite(
        xs: &[f64],
        ys: &[f64],
        slopes: &[f64],
        design: &SegmentDesign,
    ) -> MathResult<Self> {
        check_nodes(xs, ys)?;
        if slopes.len() != xs.len() {
            return Err(MathError::invalid_input(format!(
                "{} nodes need {} slopes, got {}",
                xs.len(),
                xs.len(),
                slopes.len()
            )));
        }
        let n = xs.len() - 1;
        Self::setup_hermite(
            xs.to_vec(),
            *design,
            ys,
            &slopes[..n],
            &slopes[1..],
            CalibrationDetail::Full,
        )
    }

    /// Hermite stretch with node slopes from a monotone estimator.
    pub fn monotone(
        xs: &[f64],
        ys: &[f64],
        estimator: SlopeEstimator,
        design: &SegmentDesign,
    ) -> MathResult<Self> {
        let slopes = estimator.estimate(xs, ys)?;
        Self::hermite(xs, ys, &slopes, design)
    }

    pub(super) fn from_parts(
        ordinates: Vec<f64>,
        segments: Vec<Arc<Segment>>,
        design: SegmentDesign,
    ) -> Self {
        Self {
            ordinates,
            segments,
            design,
            jacobians: None,
        }
    }

    /// Knot ordinates.
    #[must_use]
    pub fn ordinates(&self) -> &[f64] {
        &self.ordinates
    }

    /// Segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Arc<Segment>] {
        &self.segments
    }

    /// Segment design shared by every segment.
    #[must_use]
    pub fn design(&self) -> &SegmentDesign {
        &self.design
    }

    /// First ordinate.
    #[must_use]
    pub fn left(&self) -> f64 {
        self.ordinates[0]
    }

    /// Last ordinate.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.ordinates[self.ordinates.len() - 1]
    }

    /// Number of segments.
    #[must_use]
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Number of Jacobian inputs, if Jacobians were retained.
    #[must_use]
    pub fn input_count(&self) -> Option<usize> {
        self.jacobians
            .as_ref()
            .and_then(|j| j.first().map(WengertJacobian::inputs))
    }

    /// `∂cⱼ/∂θ` for segment `j`, if retained.
    #[must_use]
    pub fn coefficient_jacobian(&self, segment: usize) -> Option<&WengertJacobian> {
        self.jacobians.as_ref().and_then(|j| j.get(segment))
    }

    /// Index of the segment containing `x`.
    ///
    /// A knot belongs to the segment on its left.
    pub fn segment_index(&self, x: f64) -> MathResult<usize> {
        if !x.is_finite() {
            return Err(MathError::non_finite("stretch query ordinate"));
        }
        if x < self.left() || x > self.right() {
            return Err(MathError::OutOfRange {
                x,
                min: self.left(),
                max: self.right(),
            });
        }
        let index = self.segments.partition_point(|s| s.right() < x);
        Ok(index.min(self.segments.len() - 1))
    }

    /// Response at `x`.
    pub fn response_value(&self, x: f64) -> MathResult<f64> {
        self.derivative(x, 0)
    }

    /// `order`-th derivative at `x`.
    pub fn derivative(&self, x: f64, order: usize) -> MathResult<f64> {
        let index = self.segment_index(x)?;
        self.segments[index].derivative(x, order)
    }

    /// `∂R(x)/∂θ`.
    pub fn response_jacobian(&self, x: f64) -> MathResult<Vec<f64>> {
        self.derivative_jacobian(x, 0)
    }

    /// `∂R^(order)(x)/∂θ`.
    pub fn derivative_jacobian(&self, x: f64, order: usize) -> MathResult<Vec<f64>> {
        let jacobians = self
            .jacobians
            .as_ref()
            .ok_or_else(|| MathError::invalid_input("stretch was calibrated without Jacobians"))?;
        let index = self.segment_index(x)?;
        let segment = &self.segments[index];
        let scale = segment.width().powi(order as i32);
        let row: Vec<f64> = segment
            .basis_row(segment.local(x), order)
            .into_iter()
            .map(|v| v / scale)
            .collect();
        jacobians[index].left_multiply(&row)
    }

    /// Largest jump of the `order`-th derivative across interior knots.
    pub fn continuity_gap(&self, order: usize) -> MathResult<f64> {
        self.segments.windows(2).try_fold(0.0_f64, |gap, pair| -> MathResult<f64> {
            let knot = pair[0].right();
            let left = pair[0].derivative(knot, order)?;
            let right = pair[1].derivative(knot, order)?;
            Ok(gap.max((left - right).abs()))
        })
    }

    /// Shape classification of every segment.
    pub fn monotone_types(&self) -> MathResult<Vec<MonotoneType>> {
        self.segments.iter().map(|s| s.monotone_type()).collect()
    }

    /// Whether no segment has an interior turning point.
    pub fn is_monotone(&self) -> MathResult<bool> {
        Ok(self
            .monotone_types()?
            .iter()
            .all(|t| *t == MonotoneType::Monotonic))
    }

    /// `∫ (R^(order))² dx` over the whole stretch.
    pub fn roughness(&self, order: usize) -> MathResult<f64> {
        self.segments.iter().map(|s| s.roughness(order)).sum()
    }

    /// Roughness at the design's penalty order (curvature by default).
    pub fn roughness_penalty(&self) -> MathResult<f64> {
        self.roughness(self.design.roughness_penalty_order.unwrap_or(2))
    }

    /// Quadrature points for `∫ₐᵇ R dx`, one Gauss-Legendre rule per
    /// overlapped segment.
    pub fn integration_points(&self, a: f64, b: f64) -> MathResult<Vec<(f64, f64)>> {
        if !a.is_finite() || !b.is_finite() {
            return Err(MathError::non_finite("integration bounds"));
        }
        if a > b {
            return Err(MathError::invalid_input(format!(
                "integration bounds reversed: {a} > {b}"
            )));
        }
        if a < self.left() || b > self.right() {
            return Err(MathError::OutOfRange {
                x: if a < self.left() { a } else { b },
                min: self.left(),
                max: self.right(),
            });
        }
        let rule = GaussLegendre::default();
        let mut points = Vec::new();
        for segment in &self.segments {
            let lo = segment.left().max(a);
            let hi = segment.right().min(b);
            if hi > lo {
                points.extend(rule.points(lo, hi));
            }
        }
        Ok(points)
    }

    /// `∫ₐᵇ R dx`.
    pub fn integral(&self, a: f64, b: f64) -> MathResult<f64> {
        self.integration_points(a, b)?
            .into_iter()
            .map(|(x, w)| -> MathResult<f64> { Ok(w * self.response_value(x)?) })
            .sum()
    }

    /// `∂(∫ₐᵇ R dx)/∂θ`.
    pub fn integral_jacobian(&self, a: f64, b: f64) -> MathResult<Vec<f64>> {
        let inputs = self
            .input_count()
            .ok_or_else(|| MathError::invalid_input("stretch was calibrated without Jacobians"))?;
        let mut total = vec![0.0; inputs];
        for (x, w) in self.integration_points(a, b)? {
            for (acc, v) in total.iter_mut().zip(self.response_jacobian(x)?) {
                *acc += w * v;
            }
        }
        Ok(total)
    }
}

/// Hermite segment from global edge values and slopes.
pub(super) fn hermite_segment(
    left: f64,
    right: f64,
    basis: Arc<dyn BasisFunctionSet>,
    design: &SegmentDesign,
    values: (f64, f64),
    slopes: (f64, f64),
) -> MathResult<Segment> {
    let mut segment = Segment::with_basis(left, right, basis, design)?;
    let width = segment.width();
    let params = CalibrationParams::new()
        .with_left_value(values.0)
        .with_left_derivatives(vec![slopes.0 * width])
        .with_right_value(values.1)
        .with_right_derivatives(vec![slopes.1 * width]);
    segment.calibrate(&params)?;
    Ok(segment)
}

fn check_nodes(xs: &[f64], ys: &[f64]) -> MathResult<()> {
    if xs.len() != ys.len() {
        return Err(MathError::invalid_input(format!(
            "{} ordinates but {} responses",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(MathError::insufficient_data(2, xs.len()));
    }
    Ok(())
}

/// `scale · row · J`.
fn propagate(row: &[f64], jacobian: &DMatrix<f64>, scale: f64) -> Vec<f64> {
    (0..jacobian.ncols())
        .map(|c| {
            scale
                * row
                    .iter()
                    .enumerate()
                    .map(|(r, v)| v * jacobian[(r, c)])
                    .sum::<f64>()
        })
        .collect()
}

/// Inputs of one bootstrap over a fixed set of constraints.
struct Bootstrap<'a> {
    ordinates: &'a [f64],
    design: &'a SegmentDesign,
    basis: Arc<dyn BasisFunctionSet>,
    left_value: f64,
    constraints: &'a [ResponseConstraint],
}

/// Segments of one bootstrap pass and, when tracked, `∂cⱼ/∂θ'` with
/// `θ' = (left value, targets…, starting slope)`.
struct Pass {
    segments: Vec<Segment>,
    jacobians: Vec<DMatrix<f64>>,
}

impl Bootstrap<'_> {
    fn slope_column(&self) -> usize {
        self.constraints.len() + 1
    }

    fn run(&self, slope: f64, track: bool) -> MathResult<Pass> {
        let n = self.constraints.len();
        let nb = self.basis.num_basis();
        let ck = self.design.ck;
        let cols = n + 2;
        let mut segments: Vec<Segment> = Vec::with_capacity(n);
        let mut jacobians: Vec<DMatrix<f64>> = Vec::new();

        for j in 0..n {
            let mut segment = Segment::with_basis(
                self.ordinates[j],
                self.ordinates[j + 1],
                Arc::clone(&self.basis),
                self.design,
            )?;
            let width = segment.width();
            let mut rhs = DMatrix::zeros(nb, cols);
            let mut left_derivatives = Vec::with_capacity(nb - 2);

            // orders above ck are pinned to zero to square the system
            let left_value = if j == 0 {
                rhs[(0, 0)] = 1.0;
                for k in 1..=nb - 2 {
                    if k == 1 && ck >= 1 {
                        left_derivatives.push(slope * width);
                        rhs[(1, self.slope_column())] = width;
                    } else {
                        left_derivatives.push(0.0);
                    }
                }
                self.left_value
            } else {
                let prior = &segments[j - 1];
                let ratio = width / prior.width();
                if track {
                    let row = propagate(&prior.basis_row(1.0, 0), &jacobians[j - 1], 1.0);
                    rhs.row_mut(0).copy_from_slice(&row);
                }
                for k in 1..=nb - 2 {
                    if k <= ck {
                        let scale = ratio.powi(k as i32);
                        left_derivatives.push(prior.local_derivative(1.0, k)? * scale);
                        if track {
                            let row =
                                propagate(&prior.basis_row(1.0, k), &jacobians[j - 1], scale);
                            rhs.row_mut(k).copy_from_slice(&row);
                        }
                    } else {
                        left_derivatives.push(0.0);
                    }
                }
                prior.local_derivative(1.0, 0)?
            };

            let (constraint, constraint_row) =
                self.localize(j, &segment, &segments, &jacobians, track)?;
            if track {
                rhs.row_mut(nb - 1).copy_from_slice(&constraint_row);
            }

            let params = CalibrationParams {
                left_value: Some(left_value),
                left_derivatives,
                response_constraints: vec![constraint],
                ..CalibrationParams::default()
            };
            segment
                .calibrate(&params)
                .map_err(|e| MathError::segment_calibration(j, &e))?;
            if track {
                jacobians.push(segment.edge_matrix()? * &rhs);
            }
            segments.push(segment);
        }

        Ok(Pass {
            segments,
            jacobians,
        })
    }

    /// Splits constraint `j` into local rows and a right-hand side.
    fn localize(
        &self,
        j: usize,
        segment: &Segment,
        prior: &[Segment],
        jacobians: &[DMatrix<f64>],
        track: bool,
    ) -> MathResult<(ResponseConstraint, Vec<f64>)> {
        let constraint = &self.constraints[j];
        let start = self.ordinates[0];
        let mut target = constraint.target;
        let mut row = vec![0.0; self.constraints.len() + 2];
        row[j + 1] = 1.0;
        let mut points = Vec::with_capacity(constraint.points.len());

        for &(x, weight) in &constraint.points {
            if x < start || x > segment.right() {
                return Err(MathError::OutOfRange {
                    x,
                    min: start,
                    max: segment.right(),
                });
            }
            if x > segment.left() {
                points.push((segment.local(x), weight));
            } else if j == 0 {
                target -= weight * self.left_value;
                row[0] -= weight;
            } else {
                let m = prior.partition_point(|s| s.right() < x);
                let owner = &prior[m];
                let u = owner.local(x);
                target -= weight * owner.local_derivative(u, 0)?;
                if track {
                    let known = propagate(&owner.basis_row(u, 0), &jacobians[m], weight);
                    for (acc, v) in row.iter_mut().zip(known) {
                        *acc -= v;
                    }
                }
            }
        }

        Ok((ResponseConstraint::new(points, target), row))
    }

    /// Starting slope that satisfies the boundary condition.
    fn solve_slope(&self, boundary: BoundaryCondition) -> MathResult<f64> {
        let failure: RefCell<Option<MathError>> = RefCell::new(None);
        let residual = |slope: f64| match self
            .run(slope, false)
            .and_then(|pass| boundary.residual(&pass.segments))
        {
            Ok(r) => r,
            Err(e) => {
                failure.borrow_mut().get_or_insert(e);
                f64::NAN
            }
        };
        let span = self.ordinates[self.ordinates.len() - 1] - self.ordinates[0];
        let result = secant(residual, 0.0, 1.0 / span, &SolverConfig::default());
        if let Some(e) = failure.into_inner() {
            return Err(e);
        }
        let result = result?;
        trace!(
            "{boundary:?} starting slope {} after {} secant steps",
            result.root,
            result.iterations
        );
        Ok(result.root)
    }

    /// Eliminates the starting slope from the pass Jacobians.
    fn reduce(&self, pass: &Pass, boundary: BoundaryCondition) -> MathResult<Vec<WengertJacobian>> {
        let n = self.constraints.len();
        let slope_col = self.slope_column();

        let slope_sensitivity = if self.design.ck == 0 {
            vec![0.0; n + 1]
        } else {
            let mut dr = vec![0.0; n + 2];
            for term in boundary.residual_terms(&pass.segments) {
                let segment = &pass.segments[term.segment];
                let row = propagate(
                    &segment.basis_row(term.u, term.order),
                    &pass.jacobians[term.segment],
                    term.scale,
                );
                for (acc, v) in dr.iter_mut().zip(row) {
                    *acc += v;
                }
            }
            let dr_ds = dr[slope_col];
            let magnitude = dr.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            if !dr_ds.is_finite() || dr_ds.abs() <= f64::EPSILON * magnitude || magnitude == 0.0 {
                return Err(MathError::invalid_input(format!(
                    "{boundary:?} condition does not depend on the starting slope"
                )));
            }
            dr[..=n].iter().map(|v| -v / dr_ds).collect()
        };

        Ok(pass
            .jacobians
            .iter()
            .map(|jac| {
                let mut reduced = jac.columns(0, n + 1).into_owned();
                for r in 0..reduced.nrows() {
                    let via_slope = jac[(r, slope_col)];
                    for (c, s) in slope_sensitivity.iter().enumerate() {
                        reduced[(r, c)] += via_slope * s;
                    }
                }
                WengertJacobian::from_matrix(reduced)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::BasisFamily;
    use approx::assert_relative_eq;

    const XS: [f64; 4] = [1.0, 2.0, 3.0, 4.0];
    const YS: [f64; 4] = [1.0, 4.0, 15.0, 40.0];

    fn natural() -> Stretch {
        Stretch::interpolate(
            &XS,
            &YS,
            &SegmentDesign::cubic_polynomial(2),
            BoundaryCondition::Natural,
        )
        .unwrap()
    }

    #[test]
    fn test_natural_spline_through_nodes() {
        let stretch = natural();
        for (x, y) in XS.iter().zip(YS) {
            assert_relative_eq!(stretch.response_value(*x).unwrap(), y, epsilon = 1e-9);
        }
        for order in 0..=2 {
            assert!(stretch.continuity_gap(order).unwrap() < 1e-8);
        }
        assert!(stretch.derivative(1.0, 2).unwrap().abs() < 1e-9);
        assert!(stretch.derivative(4.0, 2).unwrap().abs() < 1e-8);
    }

    #[test]
    fn test_orders_above_ck_start_flat_on_every_segment() {
        let stretch = Stretch::interpolate(
            &XS,
            &YS,
            &SegmentDesign::cubic_polynomial(1),
            BoundaryCondition::Natural,
        )
        .unwrap();
        assert!(stretch.continuity_gap(1).unwrap() < 1e-8);
        for segment in stretch.segments() {
            assert!(segment.derivative(segment.left(), 2).unwrap().abs() < 1e-8);
        }
        for (x, y) in XS.iter().zip(YS) {
            assert_relative_eq!(stretch.response_value(*x).unwrap(), y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_financial_and_not_a_knot() {
        let design = SegmentDesign::cubic_polynomial(2);
        let financial =
            Stretch::interpolate(&XS, &YS, &design, BoundaryCondition::Financial).unwrap();
        assert!(financial.derivative(4.0, 1).unwrap().abs() < 1e-8);

        let not_a_knot =
            Stretch::interpolate(&XS, &YS, &design, BoundaryCondition::NotAKnot).unwrap();
        let segments = not_a_knot.segments();
        let left = segments[1].derivative(3.0, 3).unwrap();
        let right = segments[2].derivative(3.0, 3).unwrap();
        assert_relative_eq!(left, right, epsilon = 1e-7);
        assert_relative_eq!(not_a_knot.response_value(4.0).unwrap(), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_non_increasing_ordinates_fail() {
        let design = SegmentDesign::default();
        let result = Stretch::interpolate(
            &[1.0, 2.0, 2.0, 4.0],
            &YS,
            &design,
            BoundaryCondition::Natural,
        );
        assert!(matches!(
            result,
            Err(MathError::NonIncreasingOrdinates { index: 2, .. })
        ));
        let result = Stretch::interpolate(&[1.0, 3.0, 2.0], &[1.0, 2.0, 3.0], &design, BoundaryCondition::Natural);
        assert!(result.is_err());
    }

    #[test]
    fn test_constraint_count_and_range_checks() {
        let design = SegmentDesign::default();
        let one = [ResponseConstraint::value_at(2.0, 1.0)];
        let result = Stretch::setup(
            vec![0.0, 1.0, 2.0],
            design,
            0.0,
            &one,
            BoundaryCondition::Natural,
            CalibrationDetail::Full,
        );
        assert!(matches!(result, Err(MathError::InvalidInput { .. })));

        // second constraint reaches beyond its own segment
        let ahead = [
            ResponseConstraint::value_at(2.0, 1.0),
            ResponseConstraint::value_at(2.0, 1.0),
        ];
        let result = Stretch::setup(
            vec![0.0, 1.0, 2.0],
            design,
            0.0,
            &ahead,
            BoundaryCondition::Natural,
            CalibrationDetail::Full,
        );
        assert!(matches!(result, Err(MathError::OutOfRange { .. })));
    }

    #[test]
    fn test_constraint_on_earlier_segments() {
        // an average of R(1) and R(3) constrains the second segment
        let constraints = [
            ResponseConstraint::value_at(1.0, 2.0),
            ResponseConstraint::new(vec![(1.0, 0.5), (3.0, 0.5)], 2.5),
        ];
        let stretch = Stretch::setup(
            vec![0.0, 1.0, 3.0],
            SegmentDesign::default(),
            1.0,
            &constraints,
            BoundaryCondition::Natural,
            CalibrationDetail::Full,
        )
        .unwrap();
        assert_relative_eq!(stretch.response_value(1.0).unwrap(), 2.0, epsilon = 1e-10);
        assert_relative_eq!(stretch.response_value(3.0).unwrap(), 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_response_jacobian_matches_finite_difference() {
        let stretch = natural();
        let jac = stretch.response_jacobian(2.5).unwrap();
        assert_eq!(jac.len(), 4);
        let h = 1e-4;
        for i in 0..4 {
            let mut up = YS;
            let mut down = YS;
            up[i] += h;
            down[i] -= h;
            let design = SegmentDesign::cubic_polynomial(2);
            let r_up = Stretch::interpolate(&XS, &up, &design, BoundaryCondition::Natural)
                .unwrap()
                .response_value(2.5)
                .unwrap();
            let r_down = Stretch::interpolate(&XS, &down, &design, BoundaryCondition::Natural)
                .unwrap()
                .response_value(2.5)
                .unwrap();
            assert_relative_eq!(jac[i], (r_up - r_down) / (2.0 * h), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_shape_only_has_no_jacobian() {
        let constraints: Vec<ResponseConstraint> = XS
            .iter()
            .zip(YS)
            .skip(1)
            .map(|(&x, y)| ResponseConstraint::value_at(x, y))
            .collect();
        let stretch = Stretch::setup(
            XS.to_vec(),
            SegmentDesign::default(),
            YS[0],
            &constraints,
            BoundaryCondition::Natural,
            CalibrationDetail::ShapeOnly,
        )
        .unwrap();
        assert!(stretch.response_jacobian(2.0).is_err());
        assert_eq!(stretch.input_count(), None);
        assert_relative_eq!(
            stretch.response_value(2.5).unwrap(),
            natural().response_value(2.5).unwrap(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_linear_c0_stretch() {
        let design = SegmentDesign::cubic_polynomial(0).with_basis(BasisFamily::Polynomial { degree: 1 });
        let stretch =
            Stretch::interpolate(&XS, &YS, &design, BoundaryCondition::Natural).unwrap();
        assert_relative_eq!(stretch.response_value(2.5).unwrap(), 9.5, epsilon = 1e-12);
        assert_relative_eq!(stretch.response_jacobian(2.5).unwrap()[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_tension_basis_stretch() {
        let design = SegmentDesign::cubic_polynomial(2)
            .with_basis(BasisFamily::HyperbolicTension { tension: 1.0 });
        let stretch =
            Stretch::interpolate(&XS, &YS, &design, BoundaryCondition::Natural).unwrap();
        assert_relative_eq!(stretch.response_value(3.0).unwrap(), 15.0, epsilon = 1e-9);
        assert!(stretch.continuity_gap(2).unwrap() < 1e-7);
    }

    #[test]
    fn test_hermite_stretch_and_jacobian() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 4.0];
        let slopes = [0.0, 2.0, 4.0];
        let stretch = Stretch::hermite(&xs, &ys, &slopes, &SegmentDesign::default()).unwrap();
        assert_relative_eq!(stretch.response_value(1.5).unwrap(), 2.25, epsilon = 1e-12);
        assert!(stretch.continuity_gap(1).unwrap() < 1e-12);
        let jac = stretch.response_jacobian(1.5).unwrap();
        // Hermite basis weights at the midpoint
        assert_relative_eq!(jac[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(jac[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(jac[2], 0.5, epsilon = 1e-12);
        assert!(Stretch::hermite(&xs, &ys, &slopes[..2], &SegmentDesign::default()).is_err());
    }

    #[test]
    fn test_out_of_range_query() {
        let stretch = natural();
        assert!(matches!(
            stretch.response_value(4.5),
            Err(MathError::OutOfRange { .. })
        ));
        assert!(stretch.response_value(f64::NAN).is_err());
        assert_eq!(stretch.segment_index(2.0).unwrap(), 0);
        assert_eq!(stretch.segment_index(2.0001).unwrap(), 1);
    }

    #[test]
    fn test_integral_of_linear_stretch() {
        let design = SegmentDesign::cubic_polynomial(0).with_basis(BasisFamily::Polynomial { degree: 1 });
        let stretch =
            Stretch::interpolate(&XS, &YS, &design, BoundaryCondition::Natural).unwrap();
        // trapezoids: (1+4)/2 + (4+15)/2 + (15+27.5)/4
        assert_relative_eq!(stretch.integral(1.0, 3.5).unwrap(), 2.5 + 9.5 + 10.625, epsilon = 1e-12);
        let jac = stretch.integral_jacobian(1.0, 2.0).unwrap();
        assert_relative_eq!(jac[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(jac[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(jac[2], 0.0, epsilon = 1e-12);
        assert!(stretch.integral(0.5, 2.0).is_err());
        assert!(stretch.integral(3.0, 2.0).is_err());
        assert_eq!(stretch.integral(2.0, 2.0).unwrap(), 0.0);
    }

    #[test]
    fn test_roughness_positive() {
        let stretch = natural();
        assert!(stretch.roughness_penalty().unwrap() > 0.0);
        assert!(stretch.roughness(4).unwrap().abs() < 1e-12);
    }
}
