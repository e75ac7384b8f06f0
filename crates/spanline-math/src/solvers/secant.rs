//! Secant root finder.

use crate::error::{MathError, MathResult};
use crate::solvers::{SolverConfig, SolverResult};

/// Secant iteration from two starting points.
///
/// Converges in one step for affine functions, which is the case for the
/// boundary-condition residual of a linear spline system.
///
/// # Errors
///
/// Returns `MathError::NonFinite` if `f` produces NaN or infinity,
/// `MathError::InvalidInput` if the secant becomes flat, and
/// `MathError::ConvergenceFailed` once the iteration budget is spent.
///
/// # Example
///
/// ```rust
/// use spanline_math::solvers::{secant, SolverConfig};
///
/// let result = secant(|x: f64| x * x - 2.0, 1.0, 2.0, &SolverConfig::default()).unwrap();
/// assert!((result.root - std::f64::consts::SQRT_2).abs() < 1e-10);
/// ```
pub fn secant<F>(f: F, x0: f64, x1: f64, config: &SolverConfig) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let eval = |x: f64| -> MathResult<f64> {
        let v = f(x);
        if v.is_finite() {
            Ok(v)
        } else {
            Err(MathError::non_finite(format!("secant residual at {x}")))
        }
    };

    let (mut x_prev, mut x_curr) = (x0, x1);
    let mut f_prev = eval(x_prev)?;
    let mut f_curr = eval(x_curr)?;

    for iteration in 0..config.max_iterations {
        if f_curr.abs() <= config.tolerance {
            return Ok(SolverResult { root: x_curr, iterations: iteration, residual: f_curr });
        }

        let slope = (f_curr - f_prev) / (x_curr - x_prev);
        if !slope.is_finite() || slope == 0.0 {
            return Err(MathError::invalid_input(format!(
                "flat secant between {x_prev} and {x_curr}"
            )));
        }

        let x_next = x_curr - f_curr / slope;
        x_prev = x_curr;
        f_prev = f_curr;
        x_curr = x_next;
        f_curr = eval(x_curr)?;

        if (x_curr - x_prev).abs() <= config.tolerance * (1.0 + x_curr.abs()) {
            return Ok(SolverResult {
                root: x_curr,
                iterations: iteration + 1,
                residual: f_curr,
            });
        }
    }

    Err(MathError::convergence_failed(config.max_iterations, f_curr))
}
