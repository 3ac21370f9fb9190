//! Design and outcome containers for mass-univariate models.
//!
//! Purpose
//! -------
//! Provide validated containers for the two matrices every statistic pass
//! consumes: the n×k design `X` and the n×m outcome `Y`, where `n` counts
//! observations, `k` regressors (intercept included) and `m` spatial
//! locations.
//!
//! Key behaviors
//! -------------
//! - [`DesignMatrix`] enforces a non-empty, finite design with an all-ones
//!   column 0, residual degrees of freedom (`n > k`) and one name per
//!   non-intercept regressor.
//! - [`OutcomeMatrix`] enforces a finite outcome with one identifier per
//!   location column.
//! - [`DesignMatrix::permute_rows`] derives the relabelled copy used by a
//!   single permutation; the original is never mutated.
//!
//! Invariants & assumptions
//! ------------------------
//! - Column 0 of the design is the intercept; contrasts are reported for
//!   columns `1..k` only.
//! - Rank deficiency is not detected here. It surfaces when the
//!   cross-product inverse is formed in `estimation`.
//! - Outcome rows align 1:1 with design rows; alignment is checked by
//!   [`OutcomeMatrix::check_rows`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction guards, name bookkeeping and row
//!   permutation.
use crate::design::errors::{DesignError, DesignResult};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// `DesignMatrix` — validated n×k regressor matrix with an intercept column.
///
/// Fields
/// ------
/// - `values`: `Array2<f64>`
///   Row-major n×k design. Column 0 holds the intercept.
/// - `names`: `Vec<String>`
///   Names of the `k − 1` non-intercept regressors, in column order.
///
/// Invariants
/// ----------
/// - `n > k >= 1` and every entry is finite.
/// - Every entry of column 0 is exactly `1.0`.
/// - `names.len() == k − 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignMatrix {
    values: Array2<f64>,
    names: Vec<String>,
}

impl DesignMatrix {
    /// Construct a validated design.
    ///
    /// Errors
    /// ------
    /// - `DesignError::EmptyDesign` for zero rows or zero columns.
    /// - `DesignError::NameCountMismatch` when `names.len() != k − 1`.
    /// - `DesignError::NonFiniteValue` on the first NaN/±∞ entry.
    /// - `DesignError::MissingIntercept` on the first column-0 entry that is
    ///   not `1.0`.
    /// - `DesignError::TooFewObservations` when `n <= k`.
    pub fn new(values: Array2<f64>, names: Vec<String>) -> DesignResult<Self> {
        let (n, k) = values.dim();
        if n == 0 || k == 0 {
            return Err(DesignError::EmptyDesign);
        }
        if names.len() != k - 1 {
            return Err(DesignError::NameCountMismatch { expected: k - 1, found: names.len() });
        }
        check_finite(&values, "design")?;
        if let Some((row, &value)) = values.column(0).iter().enumerate().find(|(_, v)| **v != 1.0) {
            return Err(DesignError::MissingIntercept { row, value });
        }
        if n <= k {
            return Err(DesignError::TooFewObservations { n, k });
        }
        Ok(Self { values, names })
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of observations `n`.
    pub fn nobs(&self) -> usize {
        self.values.nrows()
    }

    /// Number of regressors `k`, intercept included.
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Number of reported contrasts (`k − 1`).
    pub fn num_contrasts(&self) -> usize {
        self.values.ncols() - 1
    }

    pub fn contrast_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, j: usize) -> ArrayView1<'_, f64> {
        self.values.column(j)
    }

    /// Return a copy whose row `i` is row `index[i]` of `self`.
    ///
    /// The outcome matrix is never reordered; relabelling the design rows
    /// is what breaks the design/outcome association under the null.
    ///
    /// Panics
    /// ------
    /// - Panics if an entry of `index` is out of bounds. Index vectors are
    ///   produced by `permutation::Exchangeability` and are always valid
    ///   permutations of `0..n`.
    pub fn permute_rows(&self, index: &[usize]) -> DesignMatrix {
        DesignMatrix { values: self.values.select(Axis(0), index), names: self.names.clone() }
    }
}

/// `OutcomeMatrix` — validated n×m per-location measurements.
///
/// Each column is one spatial location (vertex, voxel or ROI) and is
/// processed independently of every other column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeMatrix {
    values: Array2<f64>,
    location_ids: Vec<String>,
}

impl OutcomeMatrix {
    /// Construct a validated outcome matrix with explicit location ids.
    pub fn new(values: Array2<f64>, location_ids: Vec<String>) -> DesignResult<Self> {
        let (n, m) = values.dim();
        if n == 0 || m == 0 {
            return Err(DesignError::EmptyDesign);
        }
        if location_ids.len() != m {
            return Err(DesignError::NameCountMismatch { expected: m, found: location_ids.len() });
        }
        check_finite(&values, "outcome")?;
        Ok(Self { values, location_ids })
    }

    /// Construct an outcome matrix whose location ids are the column indices.
    pub fn from_values(values: Array2<f64>) -> DesignResult<Self> {
        let ids = (0..values.ncols()).map(|i| i.to_string()).collect();
        Self::new(values, ids)
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nobs(&self) -> usize {
        self.values.nrows()
    }

    /// Number of locations `m`.
    pub fn nlocations(&self) -> usize {
        self.values.ncols()
    }

    pub fn location_ids(&self) -> &[String] {
        &self.location_ids
    }

    pub fn column(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.column(i)
    }

    /// Verify that this outcome aligns row-for-row with `design`.
    pub fn check_rows(&self, design: &DesignMatrix) -> DesignResult<()> {
        if self.nobs() != design.nobs() {
            return Err(DesignError::MismatchedRows {
                what: "outcome",
                expected: design.nobs(),
                found: self.nobs(),
            });
        }
        Ok(())
    }
}

fn check_finite(values: &Array2<f64>, what: &'static str) -> DesignResult<()> {
    for ((row, col), &value) in values.indexed_iter() {
        if !value.is_finite() {
            return Err(DesignError::NonFiniteValue { what, row, col, value });
        }
    }
    Ok(())
}
