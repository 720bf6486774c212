//! Ordinary least squares with an explicit rank check.
//!
//! The design is decomposed once with an SVD; fitting a new response is then
//! a single matrix-vector product with the pseudo-inverse. Rank-deficient
//! designs are rejected instead of being solved in the minimum-norm sense.

use nalgebra::DVector;

use crate::error::{Error, Result};
use crate::types::Matrix;

/// Singular values below this fraction of the largest count as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// A full-rank least-squares design, ready to fit responses.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    design: Matrix,
    pseudo_inverse: Matrix,
}

impl LeastSquares {
    /// Decompose `design` (observations × columns).
    ///
    /// # Errors
    ///
    /// Returns [`Error::SingularDesign`] if the design is not full column rank,
    /// including when there are fewer observations than columns.
    pub fn new(design: Matrix) -> Result<Self> {
        let columns = design.ncols();
        let svd = design.clone().svd(true, true);
        let s_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
        let eps = (s_max * RANK_TOLERANCE).max(f64::MIN_POSITIVE);
        let rank = svd.rank(eps);

        if rank < columns || design.nrows() < columns {
            return Err(Error::SingularDesign { rank, columns });
        }

        let pseudo_inverse = svd
            .pseudo_inverse(eps)
            .map_err(|_| Error::SingularDesign { rank, columns })?;

        Ok(Self {
            design,
            pseudo_inverse,
        })
    }

    /// The design matrix.
    pub fn design(&self) -> &Matrix {
        &self.design
    }

    /// OLS coefficients for response `y`.
    pub fn coefficients(&self, y: &[f64]) -> DVector<f64> {
        &self.pseudo_inverse * DVector::from_column_slice(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_fit() {
        // y = 2 + 3x
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let design = Matrix::from_fn(5, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
        let y: Vec<f64> = x.iter().map(|v| 2.0 + 3.0 * v).collect();

        let fit = LeastSquares::new(design).unwrap();
        let beta = fit.coefficients(&y);
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_collinear_columns_rejected() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let design = Matrix::from_fn(4, 3, |i, j| match j {
            0 => 1.0,
            1 => x[i],
            _ => 2.0 * x[i],
        });
        let err = LeastSquares::new(design).unwrap_err();
        assert!(matches!(err, Error::SingularDesign { rank: 2, columns: 3 }));
    }

    #[test]
    fn test_constant_column_collides_with_intercept() {
        let design = Matrix::from_fn(5, 2, |_, j| if j == 0 { 1.0 } else { 42.0 });
        assert!(LeastSquares::new(design).is_err());
    }

    #[test]
    fn test_underdetermined_rejected() {
        let design = Matrix::from_fn(2, 3, |i, j| (i * 3 + j) as f64 + 1.0);
        assert!(LeastSquares::new(design).is_err());
    }
}
