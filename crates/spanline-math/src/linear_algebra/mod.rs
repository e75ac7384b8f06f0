//! Dense linear solves for segment calibration.
//!
//! Segment systems are small (one row per basis function) but can be badly
//! scaled once tension bases or high derivative orders are involved. The
//! primary path is nalgebra's LU inverse; when that fails or produces a poor
//! residual, the system is re-solved with Gaussian elimination and partial
//! pivoting.

use log::trace;
use nalgebra::{DMatrix, DVector};

use crate::error::{MathError, MathResult};

/// Relative residual above which the LU result is rejected.
const RESIDUAL_TOLERANCE: f64 = 1e-9;

/// Pivot magnitude below which the system is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-14;

/// Method that produced a [`LinearSolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    /// nalgebra LU inverse.
    LuInverse,
    /// Gaussian elimination with partial pivoting.
    GaussianElimination,
}

/// Solution of `A x = b` together with `A⁻¹`.
///
/// The inverse is retained because it is exactly the sensitivity of the
/// solution to the right-hand side.
#[derive(Debug, Clone)]
pub struct LinearSolution {
    /// Solution vector.
    pub x: DVector<f64>,
    /// Inverse of the system matrix.
    pub inverse: DMatrix<f64>,
    /// Method used.
    pub method: SolveMethod,
}

/// Solves a square system and returns the solution with the matrix inverse.
///
/// # Errors
///
/// Returns `MathError::DimensionMismatch` for non-square or inconsistent
/// inputs and `MathError::SingularMatrix` when neither method succeeds.
pub fn solve_with_inverse(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<LinearSolution> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return Err(MathError::DimensionMismatch {
            rows1: a.nrows(),
            cols1: a.ncols(),
            rows2: b.len(),
            cols2: 1,
        });
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::non_finite("linear system"));
    }

    if let Some(inverse) = a.clone().try_inverse() {
        let x = &inverse * b;
        if acceptable(a, &x, b) && inverse.iter().all(|v| v.is_finite()) {
            return Ok(LinearSolution {
                x,
                inverse,
                method: SolveMethod::LuInverse,
            });
        }
    }

    trace!("LU inverse rejected for {n}x{n} system, falling back to Gaussian elimination");
    let x = gaussian_elimination(a, b)?;
    let mut inverse = DMatrix::zeros(n, n);
    for j in 0..n {
        let mut unit = DVector::zeros(n);
        unit[j] = 1.0;
        inverse.set_column(j, &gaussian_elimination(a, &unit)?);
    }
    Ok(LinearSolution {
        x,
        inverse,
        method: SolveMethod::GaussianElimination,
    })
}

/// Solves `A x = b` by Gaussian elimination with partial pivoting.
pub fn gaussian_elimination(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    let n = a.nrows();
    let mut m = a.clone();
    let mut rhs = b.clone();
    let scale = a.amax().max(1.0);

    for col in 0..n {
        let (pivot_row, pivot) = (col..n)
            .map(|r| (r, m[(r, col)].abs()))
            .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if pivot <= PIVOT_TOLERANCE * scale {
            return Err(MathError::SingularMatrix { size: n });
        }
        if pivot_row != col {
            m.swap_rows(pivot_row, col);
            rhs.swap_rows(pivot_row, col);
        }
        for r in (col + 1)..n {
            let factor = m[(r, col)] / m[(col, col)];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                m[(r, c)] -= factor * m[(col, c)];
            }
            rhs[r] -= factor * rhs[col];
        }
    }

    let mut x = DVector::zeros(n);
    for r in (0..n).rev() {
        let tail: f64 = ((r + 1)..n).map(|c| m[(r, c)] * x[c]).sum();
        x[r] = (rhs[r] - tail) / m[(r, r)];
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::SingularMatrix { size: n });
    }
    Ok(x)
}

fn acceptable(a: &DMatrix<f64>, x: &DVector<f64>, b: &DVector<f64>) -> bool {
    if x.iter().any(|v| !v.is_finite()) {
        return false;
    }
    let residual = (a * x - b).amax();
    residual <= RESIDUAL_TOLERANCE * (1.0 + b.amax())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_with_inverse() {
        let a = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0]);
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let sol = solve_with_inverse(&a, &b).unwrap();
        let check = &a * &sol.x;
        for i in 0..3 {
            assert_relative_eq!(check[i], b[i], epsilon = 1e-12);
        }
        let identity = &a * &sol.inverse;
        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert_relative_eq!(identity[(r, c)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_gaussian_elimination_pivots() {
        // zero leading entry requires a row swap
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 2.0, 3.0, 1.0]);
        let b = DVector::from_vec(vec![4.0, 5.0]);
        let x = gaussian_elimination(&a, &b).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-14);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_singular_system() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            solve_with_inverse(&a, &b),
            Err(MathError::SingularMatrix { size: 2 })
        ));
    }

    #[test]
    fn test_rejects_non_square_and_nan() {
        let a = DMatrix::zeros(2, 3);
        let b = DVector::zeros(2);
        assert!(matches!(
            solve_with_inverse(&a, &b),
            Err(MathError::DimensionMismatch { .. })
        ));
        let a = DMatrix::from_row_slice(1, 1, &[f64::NAN]);
        let b = DVector::from_vec(vec![1.0]);
        assert!(matches!(
            solve_with_inverse(&a, &b),
            Err(MathError::NonFinite { .. })
        ));
    }
}
