//! Segments and multi-segment stretches.
//!
//! - [`Segment`]: one basis expansion on `[left, right]`, calibrated by a
//!   dense linear solve from a [`CalibrationParams`] row set
//! - [`Stretch`]: contiguous segments bootstrapped left to right under a
//!   [`SegmentDesign`] and [`BoundaryCondition`], or Hermite-built from node
//!   slopes
//! - [`KnotScheme`]: slope rule for local knot insertion

mod boundary;
mod design;
mod knot;
mod params;
mod segment;
mod shape;
mod stretch;

pub use boundary::{BoundaryCondition, CalibrationDetail};
pub use design::SegmentDesign;
pub use knot::KnotScheme;
pub use params::{BasisConstraint, CalibrationParams, ResponseConstraint};
pub use segment::{MonotoneType, Segment};
pub use shape::ShapeControl;
pub use stretch::Stretch;
