//! Closed-form mass-univariate OLS.
//!
//! Purpose
//! -------
//! Compute per-regressor t-statistics for every outcome column against a
//! single design in one batched pass.
//!
//! Key behaviors
//! -------------
//! - `(XᵀX)⁻¹` is formed once per design by [`OlsEstimator::new`] and shared
//!   by all `m` columns.
//! - `β = (XᵀX)⁻¹XᵀY`, `σ²ₗ = RSSₗ / (n − k)`,
//!   `tⱼₗ = βⱼₗ / √((XᵀX)⁻¹ⱼⱼ · σ²ₗ)`.
//! - A permuted design needs a fresh estimator; the inverse is never reused
//!   across different designs.
//!
//! Invariants & assumptions
//! ------------------------
//! - A column with zero residual variance yields NaN (0/0) or ±∞ entries.
//!   These are left in place; callers sanitize before ranking.
use crate::{
    design::{DesignMatrix, OutcomeMatrix},
    estimation::{
        errors::{EstimationError, EstimationResult},
        linalg::symmetric_inverse,
    },
};
use ndarray::{Array1, Array2, Axis};

/// OLS fit for every location.
///
/// All matrices are k×m (regressor × location); `sigma2` has length m.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub beta: Array2<f64>,
    pub std_err: Array2<f64>,
    pub tvalues: Array2<f64>,
    pub sigma2: Array1<f64>,
    pub df: usize,
}

#[derive(Debug, Clone)]
pub struct OlsEstimator {
    x: Array2<f64>,
    inv_xtx: Array2<f64>,
    df: usize,
}

impl OlsEstimator {
    /// Hoist `(XᵀX)⁻¹` for `design`.
    ///
    /// Errors
    /// ------
    /// - `EstimationError::RankDeficient` for a singular design.
    pub fn new(design: &DesignMatrix) -> EstimationResult<Self> {
        Self::from_values(design.values())
    }

    /// Same as [`OlsEstimator::new`] for a raw n×k matrix.
    pub fn from_values(x: &Array2<f64>) -> EstimationResult<Self> {
        let (n, k) = x.dim();
        if n <= k {
            return Err(EstimationError::NoResidualDf { n, k });
        }
        let xtx = x.t().dot(x);
        let inv_xtx = symmetric_inverse(&xtx)?;
        Ok(Self { x: x.clone(), inv_xtx, df: n - k })
    }

    pub fn inv_xtx(&self) -> &Array2<f64> {
        &self.inv_xtx
    }

    /// Residual degrees of freedom `n − k`.
    pub fn df(&self) -> usize {
        self.df
    }

    /// Full fit (coefficients, standard errors, t-values, residual variance).
    ///
    /// Errors
    /// ------
    /// - `EstimationError::DimensionMismatch` when `y` has a different row
    ///   count than the design.
    pub fn fit(&self, y: &Array2<f64>) -> EstimationResult<OlsFit> {
        if y.nrows() != self.x.nrows() {
            return Err(EstimationError::DimensionMismatch {
                what: "outcome rows",
                expected: self.x.nrows(),
                found: y.nrows(),
            });
        }
        let beta = self.inv_xtx.dot(&self.x.t().dot(y));
        let resid = y - &self.x.dot(&beta);
        let sigma2 = resid.mapv(|r| r * r).sum_axis(Axis(0)) / self.df as f64;
        let diag = self.inv_xtx.diag();
        let std_err = Array2::from_shape_fn(beta.dim(), |(j, l)| (diag[j] * sigma2[l]).sqrt());
        let tvalues = &beta / &std_err;
        Ok(OlsFit { beta, std_err, tvalues, sigma2, df: self.df })
    }

    /// k×m t-statistics.
    pub fn tvalues(&self, y: &Array2<f64>) -> EstimationResult<Array2<f64>> {
        Ok(self.fit(y)?.tvalues)
    }
}

/// Convenience wrapper: t-statistics of `outcome` on `design`.
pub fn ols_tvalues(design: &DesignMatrix, outcome: &OutcomeMatrix) -> EstimationResult<Array2<f64>> {
    outcome.check_rows(design)?;
    OlsEstimator::new(design)?.tvalues(outcome.values())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement with a hand-computed simple regression.
    // - Agreement with an independent column-by-column reference.
    // - Rank-deficiency and shape guards.
    // - Zero-variance columns producing non-finite output.
    // -------------------------------------------------------------------------

    fn design() -> DesignMatrix {
        DesignMatrix::new(
            array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0], [1.0, 4.0]],
            vec!["x".to_string()],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Check the slope t-statistic against the textbook formula.
    //
    // Given
    // -----
    // - x = 0..4, y = [1, 3, 2, 5, 4].
    //
    // Expect
    // ------
    // - slope = 0.8, intercept = 1.4, Sxx = 10, RSS = 3.6, σ² = 1.2,
    //   t = 0.8 / √(1.2 / 10).
    fn fit_matches_simple_regression_formula() {
        let y = array![[1.0], [3.0], [2.0], [5.0], [4.0]];
        let est = OlsEstimator::new(&design()).unwrap();

        let fit = est.fit(&y).unwrap();

        assert_abs_diff_eq!(fit.beta[[0, 0]], 1.4, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.beta[[1, 0]], 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.sigma2[0], 1.2, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.tvalues[[1, 0]], 0.8 / (0.12_f64).sqrt(), epsilon = 1e-10);
        assert_eq!(fit.df, 3);
    }

    #[test]
    // Purpose
    // -------
    // Batched output must equal fitting each column on its own through the
    // normal equations solved by Cholesky.
    //
    // Given
    // -----
    // - A 6×3 design and a 6×4 outcome.
    //
    // Expect
    // ------
    // - Every t-statistic agrees within 1e-9.
    fn batched_tvalues_match_columnwise_reference() {
        let x = array![
            [1.0, 0.3, -1.0],
            [1.0, 1.1, 0.5],
            [1.0, -0.7, 0.2],
            [1.0, 2.0, 1.5],
            [1.0, 0.1, -0.4],
            [1.0, -1.2, 0.9]
        ];
        let y = array![
            [1.0, 0.2, 5.0, -1.0],
            [2.5, 0.1, 4.0, 0.0],
            [0.3, 0.4, 6.5, 1.0],
            [3.2, 0.9, 3.0, 0.5],
            [1.1, 0.0, 5.5, -0.5],
            [0.2, 0.7, 4.2, 2.0]
        ];
        let est = OlsEstimator::from_values(&x).unwrap();

        let t = est.tvalues(&y).unwrap();

        let xtx = crate::estimation::linalg::SpdFactor::new(&x.t().dot(&x)).unwrap();
        let inv = xtx.inverse();
        for l in 0..y.ncols() {
            let yl = y.column(l).to_owned();
            let b = xtx.solve(&x.t().dot(&yl));
            let r = &yl - &x.dot(&b);
            let s2 = r.dot(&r) / 3.0;
            for j in 0..3 {
                let reference = b[j] / (inv[[j, j]] * s2).sqrt();
                assert_abs_diff_eq!(t[[j, l]], reference, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn new_rejects_collinear_design() {
        let x = array![[1.0, 1.0, 2.0], [1.0, 2.0, 4.0], [1.0, 3.0, 6.0], [1.0, 4.0, 8.0]];

        let err = OlsEstimator::from_values(&x).unwrap_err();

        assert!(matches!(err, EstimationError::RankDeficient { .. }));
    }

    #[test]
    fn fit_rejects_misaligned_outcome() {
        let est = OlsEstimator::new(&design()).unwrap();

        let err = est.fit(&Array2::zeros((4, 2))).unwrap_err();

        assert_eq!(
            err,
            EstimationError::DimensionMismatch { what: "outcome rows", expected: 5, found: 4 }
        );
    }

    #[test]
    fn zero_outcome_column_yields_nan_statistics() {
        let est = OlsEstimator::new(&design()).unwrap();

        let t = est.tvalues(&Array2::zeros((5, 1))).unwrap();

        assert!(t[[0, 0]].is_nan());
        assert!(t[[1, 0]].is_nan());
    }
}
