//! Small dense linear algebra on k×k cross-product matrices.
//!
//! `ndarray` is the currency type across the crate; `nalgebra` supplies the
//! symmetric eigendecomposition and Cholesky factorization. Matrices are
//! copied across the boundary because they are only k×k.
use crate::estimation::errors::{EstimationError, EstimationResult};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

/// Relative eigenvalue floor below which `XᵀX` is declared singular.
pub const EIGEN_REL_EPS: f64 = 1e-10;

/// Copy a square `ndarray` matrix into a column-major `DMatrix`.
pub fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

pub fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Inverse of a symmetric positive semi-definite matrix through its
/// eigendecomposition `A = Q Λ Qᵀ`, so `A⁻¹ = Q Λ⁻¹ Qᵀ`.
///
/// Errors
/// ------
/// - `EstimationError::RankDeficient` when the smallest eigenvalue is at or
///   below `EIGEN_REL_EPS · max(λ_max, 1)`. A singular design has no
///   unique least-squares solution; no pseudo-inverse is substituted.
pub fn symmetric_inverse(a: &Array2<f64>) -> EstimationResult<Array2<f64>> {
    let eigen = to_dmatrix(a).symmetric_eigen();
    let lambda_max = eigen.eigenvalues.max();
    let lambda_min = eigen.eigenvalues.min();
    let tolerance = EIGEN_REL_EPS * lambda_max.max(1.0);
    if !(lambda_min > tolerance) {
        return Err(EstimationError::RankDeficient { min_eigenvalue: lambda_min, tolerance });
    }
    let q = &eigen.eigenvectors;
    let inv_lambda = DMatrix::from_diagonal(&eigen.eigenvalues.map(|l| 1.0 / l));
    Ok(from_dmatrix(&(q * inv_lambda * q.transpose())))
}

/// Cholesky factor of an SPD matrix with the handful of operations the
/// GLS solver needs.
#[derive(Debug, Clone)]
pub struct SpdFactor {
    chol: nalgebra::Cholesky<f64, nalgebra::Dyn>,
}

impl SpdFactor {
    /// Returns `None` when `a` is not numerically positive definite.
    pub fn new(a: &Array2<f64>) -> Option<Self> {
        to_dmatrix(a).cholesky().map(|chol| Self { chol })
    }

    /// `ln |A| = 2 Σ ln Lᵢᵢ`.
    pub fn ln_det(&self) -> f64 {
        2.0 * self.chol.l_dirty().diagonal().iter().map(|d| d.ln()).sum::<f64>()
    }

    pub fn solve(&self, b: &Array1<f64>) -> Array1<f64> {
        let x = self.chol.solve(&DVector::from_iterator(b.len(), b.iter().copied()));
        Array1::from_iter(x.iter().copied())
    }

    pub fn inverse(&self) -> Array2<f64> {
        from_dmatrix(&self.chol.inverse())
    }
}
