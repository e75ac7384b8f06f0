//! # Spanline Math
//!
//! Spline machinery for the Spanline curve calibration library.
//!
//! This crate provides:
//!
//! - **Basis**: Polynomial, Bernstein, hyperbolic/exponential tension and
//!   Kaklis-Pandelis basis function sets evaluated on a local `[0, 1]` coordinate
//! - **Segments**: Single spline pieces calibrated by a dense linear solve
//! - **Stretches**: Ordered chains of segments built by left-to-right bootstrap
//!   or Hermite calibration, with knot insertion
//! - **PCHIP**: Monotonicity-preserving slope estimators (Bessel, Hyman83,
//!   Hyman89, Harmonic, Van Leer, Huynh-Le Floch, Akima, Kruger)
//! - **Jacobians**: Explicit Wengert Jacobian matrices composed by multiplication
//! - **Solvers**: Brent and secant root finders, dense linear solves
//! - **Quadrature**: Gauss-Legendre rules for piecewise response integrals
//!
//! ## Example
//!
//! ```rust
//! use spanline_math::prelude::*;
//!
//! let xs = [1.0, 2.0, 3.0, 4.0];
//! let ys = [1.0, 4.0, 15.0, 40.0];
//!
//! let stretch = Stretch::interpolate(
//!     &xs,
//!     &ys,
//!     &SegmentDesign::cubic_polynomial(2),
//!     BoundaryCondition::Natural,
//! )
//! .unwrap();
//!
//! assert!((stretch.response_value(4.0).unwrap() - 40.0).abs() < 1e-10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::float_cmp)]

pub mod basis;
pub mod error;
pub mod jacobian;
pub mod linear_algebra;
pub mod pchip;
pub mod quadrature;
pub mod solvers;
pub mod spline;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::basis::{
        BasisFamily, BasisFunctionSet, BernsteinBasis, ExponentialTensionBasis,
        HyperbolicTensionBasis, KaklisPandelisBasis, PolynomialBasis,
    };
    pub use crate::error::{MathError, MathResult};
    pub use crate::jacobian::WengertJacobian;
    pub use crate::pchip::SlopeEstimator;
    pub use crate::quadrature::GaussLegendre;
    pub use crate::solvers::{brent, secant, SolverConfig, SolverResult};
    pub use crate::spline::{
        BasisConstraint, BoundaryCondition, CalibrationDetail, CalibrationParams, KnotScheme,
        MonotoneType, ResponseConstraint, Segment, SegmentDesign, ShapeControl, Stretch,
    };
}

pub use error::{MathError, MathResult};
