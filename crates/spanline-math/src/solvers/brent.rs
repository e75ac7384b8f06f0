//! Brent's bracketing root finder.

use crate::error::{MathError, MathResult};
use crate::solvers::{SolverConfig, SolverResult};

/// Finds a root of `f` inside `[a, b]`.
///
/// Combines inverse quadratic interpolation, secant steps and bisection,
/// keeping the root bracketed at every iteration.
///
/// # Errors
///
/// Returns `MathError::InvalidBracket` if `f(a)` and `f(b)` share a sign,
/// and `MathError::ConvergenceFailed` if the iteration budget runs out.
///
/// # Example
///
/// ```rust
/// use spanline_math::solvers::{brent, SolverConfig};
///
/// let result = brent(|x: f64| x.cos() - x, 0.0, 1.0, &SolverConfig::default()).unwrap();
/// assert!((result.root - 0.739_085_133_215_160_6).abs() < 1e-10);
/// ```
pub fn brent<F>(f: F, a: f64, b: f64, config: &SolverConfig) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (a, b);
    let (mut fa, mut fb) = (f(a), f(b));

    if fa == 0.0 {
        return Ok(SolverResult { root: a, iterations: 0, residual: fa });
    }
    if fb == 0.0 {
        return Ok(SolverResult { root: b, iterations: 0, residual: fb });
    }
    if fa.signum() == fb.signum() || !fa.is_finite() || !fb.is_finite() {
        return Err(MathError::InvalidBracket { a, b, fa, fb });
    }

    // c is the contrapoint: f(b) and f(c) always straddle the root
    let (mut c, mut fc) = (a, fa);
    let mut d = b - a;
    let mut e = d;

    for iteration in 1..=config.max_iterations {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * config.tolerance;
        let half = 0.5 * (c - b);
        if half.abs() <= tol || fb == 0.0 {
            return Ok(SolverResult { root: b, iterations: iteration, residual: fb });
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * half * s, 1.0 - s)
            } else {
                let q0 = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * half * q0 * (q0 - r) - (b - a) * (r - 1.0)),
                    (q0 - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }
            let bound_interp = 3.0 * half * q - (tol * q).abs();
            let bound_prev = (e * q).abs();
            if 2.0 * p < bound_interp.min(bound_prev) {
                e = d;
                d = p / q;
            } else {
                d = half;
                e = d;
            }
        } else {
            d = half;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(half) };
        fb = f(b);
    }

    Err(MathError::convergence_failed(config.max_iterations, fb))
}
