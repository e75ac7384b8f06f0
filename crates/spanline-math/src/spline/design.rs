//! Segment configuration.

use serde::{Deserialize, Serialize};

use crate::basis::BasisFamily;
use crate::error::{MathError, MathResult};
use crate::spline::ShapeControl;

/// How every segment of a stretch is built.
///
/// # Example
///
/// ```rust
/// use spanline_math::basis::BasisFamily;
/// use spanline_math::spline::SegmentDesign;
///
/// let design = SegmentDesign::cubic_polynomial(2)
///     .with_basis(BasisFamily::HyperbolicTension { tension: 1.0 });
/// assert!(design.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentDesign {
    /// Basis family.
    pub basis: BasisFamily,
    /// Continuity order Ck enforced across interior knots.
    pub ck: usize,
    /// Multiplicative shape control.
    pub shape: ShapeControl,
    /// Derivative order used by roughness diagnostics.
    pub roughness_penalty_order: Option<usize>,
}

impl Default for SegmentDesign {
    fn default() -> Self {
        Self::cubic_polynomial(2)
    }
}

impl SegmentDesign {
    /// Cubic monomial segments with the given continuity order.
    #[must_use]
    pub fn cubic_polynomial(ck: usize) -> Self {
        Self {
            basis: BasisFamily::Polynomial { degree: 3 },
            ck,
            shape: ShapeControl::None,
            roughness_penalty_order: None,
        }
    }

    /// Sets the basis family.
    #[must_use]
    pub fn with_basis(mut self, basis: BasisFamily) -> Self {
        self.basis = basis;
        self
    }

    /// Sets the continuity order.
    #[must_use]
    pub fn with_ck(mut self, ck: usize) -> Self {
        self.ck = ck;
        self
    }

    /// Sets the shape control.
    #[must_use]
    pub fn with_shape(mut self, shape: ShapeControl) -> Self {
        self.shape = shape;
        self
    }

    /// Sets the roughness penalty order.
    #[must_use]
    pub fn with_roughness_penalty_order(mut self, order: usize) -> Self {
        self.roughness_penalty_order = Some(order);
        self
    }

    /// Number of basis functions per segment.
    #[must_use]
    pub fn num_basis(&self) -> usize {
        self.basis.num_basis()
    }

    /// Checks basis parameters, shape control, and `num_basis >= ck + 2`.
    pub fn validate(&self) -> MathResult<()> {
        self.basis.build()?;
        self.shape.validate()?;
        if self.num_basis() < self.ck + 2 {
            return Err(MathError::invalid_input(format!(
                "{} basis functions cannot honour C{} continuity (need at least {})",
                self.num_basis(),
                self.ck,
                self.ck + 2
            )));
        }
        Ok(())
    }
}
