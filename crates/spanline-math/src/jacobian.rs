//! Dense sensitivity matrices.

use std::fmt;
use std::ops::{Add, Mul};

use nalgebra::{DMatrix, DVector};

use crate::error::{MathError, MathResult};

/// Matrix of partial derivatives `∂ output_i / ∂ input_j`.
///
/// Rows index outputs (coefficients, responses), columns index inputs
/// (edge values, constraint targets, quotes). Chain-rule propagation is
/// [`WengertJacobian::compose`].
#[derive(Debug, Clone, PartialEq)]
pub struct WengertJacobian(DMatrix<f64>);

impl WengertJacobian {
    /// An all-zero Jacobian.
    #[must_use]
    pub fn zeros(outputs: usize, inputs: usize) -> Self {
        Self(DMatrix::zeros(outputs, inputs))
    }

    /// The identity Jacobian of a vector with respect to itself.
    #[must_use]
    pub fn identity(size: usize) -> Self {
        Self(DMatrix::identity(size, size))
    }

    /// Wraps an existing matrix.
    #[must_use]
    pub fn from_matrix(matrix: DMatrix<f64>) -> Self {
        Self(matrix)
    }

    /// Single-row Jacobian from a gradient.
    #[must_use]
    pub fn from_row(row: &[f64]) -> Self {
        Self(DMatrix::from_row_slice(1, row.len(), row))
    }

    /// Number of outputs.
    #[must_use]
    pub fn outputs(&self) -> usize {
        self.0.nrows()
    }

    /// Number of inputs.
    #[must_use]
    pub fn inputs(&self) -> usize {
        self.0.ncols()
    }

    /// `∂ output / ∂ input`, zero when out of bounds.
    #[must_use]
    pub fn get(&self, output: usize, input: usize) -> f64 {
        self.0.get((output, input)).copied().unwrap_or(0.0)
    }

    /// Sets a single entry.
    pub fn set(&mut self, output: usize, input: usize, value: f64) {
        if output < self.outputs() && input < self.inputs() {
            self.0[(output, input)] = value;
        }
    }

    /// Gradient of one output.
    #[must_use]
    pub fn row(&self, output: usize) -> Vec<f64> {
        self.0.row(output).iter().copied().collect()
    }

    /// Underlying matrix.
    #[must_use]
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.0
    }

    /// Consumes the wrapper.
    #[must_use]
    pub fn into_matrix(self) -> DMatrix<f64> {
        self.0
    }

    /// Chain rule: `self · inner`, i.e. `∂out/∂mid · ∂mid/∂in`.
    pub fn compose(&self, inner: &WengertJacobian) -> MathResult<WengertJacobian> {
        if self.inputs() != inner.outputs() {
            return Err(MathError::DimensionMismatch {
                rows1: self.outputs(),
                cols1: self.inputs(),
                rows2: inner.outputs(),
                cols2: inner.inputs(),
            });
        }
        Ok(Self(&self.0 * &inner.0))
    }

    /// Applies the Jacobian to a row vector from the left: `weights · self`.
    pub fn left_multiply(&self, weights: &[f64]) -> MathResult<Vec<f64>> {
        if weights.len() != self.outputs() {
            return Err(MathError::DimensionMismatch {
                rows1: 1,
                cols1: weights.len(),
                rows2: self.outputs(),
                cols2: self.inputs(),
            });
        }
        let w = DVector::from_column_slice(weights);
        Ok((self.0.transpose() * w).iter().copied().collect())
    }

    /// Scales every entry.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self(&self.0 * factor)
    }
}

impl Add for &WengertJacobian {
    type Output = MathResult<WengertJacobian>;

    fn add(self, rhs: &WengertJacobian) -> Self::Output {
        if self.0.shape() != rhs.0.shape() {
            return Err(MathError::DimensionMismatch {
                rows1: self.outputs(),
                cols1: self.inputs(),
                rows2: rhs.outputs(),
                cols2: rhs.inputs(),
            });
        }
        Ok(WengertJacobian(&self.0 + &rhs.0))
    }
}

impl Mul<f64> for &WengertJacobian {
    type Output = WengertJacobian;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl fmt::Display for WengertJacobian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.outputs() {
            let row: Vec<String> = self.0.row(r).iter().map(|v| format!("{v:.6e}")).collect();
            writeln!(f, "[{}]", row.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose() {
        let outer = WengertJacobian::from_matrix(DMatrix::from_row_slice(1, 2, &[1.0, 2.0]));
        let inner = WengertJacobian::from_matrix(DMatrix::from_row_slice(2, 2, &[3.0, 0.0, 1.0, 1.0]));
        let chained = outer.compose(&inner).unwrap();
        assert_eq!(chained.row(0), vec![5.0, 2.0]);
        assert!(inner.compose(&WengertJacobian::zeros(3, 1)).is_err());
    }

    #[test]
    fn test_left_multiply_and_ops() {
        let jac = WengertJacobian::identity(2);
        assert_eq!(jac.left_multiply(&[2.0, 3.0]).unwrap(), vec![2.0, 3.0]);
        assert!(jac.left_multiply(&[1.0]).is_err());
        let doubled = (&jac + &jac).unwrap();
        assert_eq!(doubled.get(1, 1), 2.0);
        assert_eq!((&jac * 0.5).get(0, 0), 0.5);
        assert_eq!(jac.get(5, 5), 0.0);
    }

    #[test]
    fn test_set_and_display() {
        let mut jac = WengertJacobian::zeros(1, 2);
        jac.set(0, 1, 4.0);
        assert_eq!(WengertJacobian::from_row(&[0.0, 4.0]), jac);
        assert!(jac.to_string().contains("4.000000e0"));
    }
}
