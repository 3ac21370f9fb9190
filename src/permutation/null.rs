//! Maximum-statistic null distributions.
//!
//! Purpose
//! -------
//! Hold, per contrast, the field-wide maximum statistic of every
//! permutation in a contiguous index range, and turn complete
//! distributions into sorted lookup tables for FWER correction.
//!
//! Key behaviors
//! -------------
//! - [`NullDistribution::concat`] stitches worker segments into one range,
//!   rejecting gaps and overlaps.
//! - [`NullDistribution::merge_max`] combines surfaces: for the same
//!   permutation, the field-wide maximum is the maximum over surfaces.
//! - [`NullDistribution::finalize`] sorts each contrast's maxima ascending
//!   after flooring NaN and negative entries to 0.
//!
//! Invariants & assumptions
//! ------------------------
//! - `maxima` is contrasts × permutations; column `j` is permutation
//!   `first + j`, and `first >= 1` (index 0 is the observed pass).
use crate::{
    correction::fwer::fwer_pvalue,
    permutation::errors::{PermutationError, PermutationResult},
    utils::nan_to_zero,
};
use ndarray::{Array1, Array2, ArrayView1, Axis, concatenate};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullDistribution {
    first: usize,
    maxima: Array2<f64>,
}

impl NullDistribution {
    /// Errors
    /// ------
    /// - `PermutationError::InvalidRange` when `first == 0`.
    /// - `PermutationError::EmptyNull` when `maxima` has no columns.
    pub fn new(first: usize, maxima: Array2<f64>) -> PermutationResult<Self> {
        if first == 0 {
            return Err(PermutationError::InvalidRange {
                start: 0,
                end: maxima.ncols().saturating_sub(1),
            });
        }
        if maxima.ncols() == 0 {
            return Err(PermutationError::EmptyNull);
        }
        Ok(Self { first, maxima })
    }

    pub fn ncontrasts(&self) -> usize {
        self.maxima.nrows()
    }

    /// Number of permutations held.
    pub fn len(&self) -> usize {
        self.maxima.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.first..=self.first + self.len() - 1
    }

    pub fn maxima(&self) -> &Array2<f64> {
        &self.maxima
    }

    /// Concatenate segments in permutation order.
    ///
    /// Errors
    /// ------
    /// - `PermutationError::EmptyNull` for no segments.
    /// - `PermutationError::SegmentGap` / `SegmentOverlap` unless the
    ///   segments tile one contiguous range.
    /// - `PermutationError::ShapeMismatch` for differing contrast counts.
    pub fn concat(mut segments: Vec<NullDistribution>) -> PermutationResult<Self> {
        segments.sort_by_key(|s| s.first);
        let head = segments.first().ok_or(PermutationError::EmptyNull)?;
        let (first, contrasts) = (head.first, head.ncontrasts());

        let mut expected = first;
        for seg in &segments {
            if seg.ncontrasts() != contrasts {
                return Err(PermutationError::ShapeMismatch {
                    what: "null segment contrasts",
                    expected: contrasts,
                    found: seg.ncontrasts(),
                });
            }
            if seg.first > expected {
                return Err(PermutationError::SegmentGap { expected, found: seg.first });
            }
            if seg.first < expected {
                return Err(PermutationError::SegmentOverlap { expected, found: seg.first });
            }
            expected = seg.first + seg.len();
        }

        let views: Vec<_> = segments.iter().map(|s| s.maxima.view()).collect();
        let maxima = concatenate(Axis(1), &views)
            .map_err(|_| PermutationError::EmptyNull)?;
        Ok(Self { first, maxima })
    }

    /// Element-wise maximum with another surface's distribution over the
    /// same range.
    pub fn merge_max(&self, other: &NullDistribution) -> PermutationResult<Self> {
        if other.first != self.first {
            return Err(PermutationError::ShapeMismatch {
                what: "null range start",
                expected: self.first,
                found: other.first,
            });
        }
        if other.maxima.dim() != self.maxima.dim() {
            return Err(PermutationError::ShapeMismatch {
                what: "null permutations",
                expected: self.len(),
                found: other.len(),
            });
        }
        let mut maxima = self.maxima.mapv(nan_to_zero);
        maxima.zip_mut_with(&other.maxima, |a, &b| *a = a.max(nan_to_zero(b)));
        Ok(Self { first: self.first, maxima })
    }

    /// Sort each contrast's maxima for rank lookup.
    pub fn finalize(&self) -> SortedNull {
        let rows = self
            .maxima
            .axis_iter(Axis(0))
            .map(|row| {
                let mut v: Vec<f64> = row.iter().map(|&x| nan_to_zero(x).max(0.0)).collect();
                v.sort_by(|a, b| a.total_cmp(b));
                v
            })
            .collect();
        SortedNull { rows }
    }
}

/// Per-contrast ascending maxima.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedNull {
    rows: Vec<Vec<f64>>,
}

impl SortedNull {
    pub fn ncontrasts(&self) -> usize {
        self.rows.len()
    }

    pub fn npermutations(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn row(&self, contrast: usize) -> Option<&[f64]> {
        self.rows.get(contrast).map(Vec::as_slice)
    }

    /// FWER p-value of `stat` for `contrast`.
    ///
    /// Errors
    /// ------
    /// - `PermutationError::ShapeMismatch` for an unknown contrast.
    pub fn fwer(&self, contrast: usize, stat: f64) -> PermutationResult<f64> {
        let row = self.row(contrast).ok_or(PermutationError::ShapeMismatch {
            what: "contrast index",
            expected: self.ncontrasts(),
            found: contrast,
        })?;
        Ok(fwer_pvalue(row, stat))
    }

    /// FWER p-values for one contrast's whole field.
    pub fn fwer_row(&self, contrast: usize, stats: ArrayView1<f64>) -> PermutationResult<Array1<f64>> {
        let row = self.row(contrast).ok_or(PermutationError::ShapeMismatch {
            what: "contrast index",
            expected: self.ncontrasts(),
            found: contrast,
        })?;
        Ok(stats.mapv(|t| fwer_pvalue(row, t)))
    }

    /// FWER p-values for a contrasts × locations field.
    pub fn fwer_field(&self, stats: &Array2<f64>) -> PermutationResult<Array2<f64>> {
        if stats.nrows() != self.ncontrasts() {
            return Err(PermutationError::ShapeMismatch {
                what: "statistic contrasts",
                expected: self.ncontrasts(),
                found: stats.nrows(),
            });
        }
        let mut out = Array2::<f64>::zeros(stats.raw_dim());
        for (c, (src, mut dst)) in
            stats.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))).enumerate()
        {
            dst.assign(&self.fwer_row(c, src)?);
        }
        Ok(out)
    }
}
