//! Permutation engine: INIT → (PERMUTE → ESTIMATE → [TFCE] → ACCUMULATE)×P.
//!
//! Purpose
//! -------
//! Build the per-contrast maximum-statistic null distribution for one
//! surface's field by relabelling the observations and recomputing the
//! field statistic (optionally TFCE-enhanced) for every permutation in a
//! range.
//!
//! Key behaviors
//! -------------
//! - Two field statistics are supported. A regression field relabels the
//!   design rows and recomputes OLS t per non-intercept regressor
//!   ([`PermutationEngine::new`]). A mediation field relabels the
//!   non-imaging inputs jointly and recomputes the indirect-effect z
//!   ([`PermutationEngine::mediation`]).
//! - INIT validates shapes and builds every design once; a rank-deficient
//!   design fails here, before any work.
//! - Permutation `p` draws its relabelling from
//!   [`permutation_rng`](super::rng::permutation_rng)`(seed, p)`, so ranges
//!   can be split across workers in any way and still reproduce one run.
//! - Permutations in a range run in parallel on the rayon pool, each
//!   thread holding its own [`TfceWorkspace`]; results are collected in
//!   index order.
//! - ACCUMULATE keeps, per contrast row, `max |stat|` (NaN → 0) or, with
//!   TFCE, the larger of the positive and negative enhanced maxima.
//!
//! Invariants & assumptions
//! ------------------------
//! - Index 0 is the observed pass ([`PermutationEngine::observed`]);
//!   permutation ranges start at 1.
//! - The outcome matrix is never reordered.
//! - Permuted mediation passes always use OLS paths.
use crate::{
    design::DesignMatrix,
    estimation::{FieldStatistics, MixedOptions, ModelKind, OlsEstimator, estimate_field},
    mediation::{MediationOutcome, MediationSpec, PathModel},
    permutation::{
        errors::{PermutationError, PermutationResult},
        exchangeability::Exchangeability,
        null::NullDistribution,
        rng::permutation_rng,
    },
    tfce::{TfceTransform, TfceWorkspace},
    utils::nan_to_zero,
};
use ndarray::{Array1, Array2, Axis, s};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{ops::RangeInclusive, time::Instant};

/// Observed (index 0) statistics for one surface.
///
/// Every field is c×m with one row per tested contrast; the intercept is
/// never stored. A mediation field has a single row holding z. The TFCE
/// fields are present only when enhancement is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedField {
    pub statistics: Array2<f64>,
    /// Two-sided raw p-values, NaN where the statistic is NaN.
    pub pvalues: Array2<f64>,
    pub tfce_positive: Option<Array2<f64>>,
    pub tfce_negative: Option<Array2<f64>>,
    /// Locations whose statistic could not be computed, with the reason.
    pub failures: Vec<(usize, String)>,
}

impl ObservedField {
    /// Wrap c×m statistics, enhancing every row when `tfce` is given.
    ///
    /// Errors
    /// ------
    /// - `PermutationError::ShapeMismatch` when `pvalues` is not c×m.
    /// - TFCE errors for a field that does not match the adjacency.
    pub fn new(
        statistics: Array2<f64>, pvalues: Array2<f64>, failures: Vec<(usize, String)>,
        tfce: Option<&TfceTransform<'_>>,
    ) -> PermutationResult<Self> {
        if pvalues.dim() != statistics.dim() {
            return Err(PermutationError::ShapeMismatch {
                what: "observed p-values",
                expected: statistics.len(),
                found: pvalues.len(),
            });
        }
        let (tfce_positive, tfce_negative) = match tfce {
            None => (None, None),
            Some(tfce) => {
                let mut pos = Array2::<f64>::zeros(statistics.dim());
                let mut neg = Array2::<f64>::zeros(statistics.dim());
                let mut ws = TfceWorkspace::new(statistics.ncols());
                for (r, row) in statistics.axis_iter(Axis(0)).enumerate() {
                    let e = tfce.enhance_signed_with(row, &mut ws)?;
                    pos.row_mut(r).assign(&e.positive);
                    neg.row_mut(r).assign(&e.negative);
                }
                (Some(pos), Some(neg))
            }
        };
        Ok(Self { statistics, pvalues, tfce_positive, tfce_negative, failures })
    }

    /// Regression statistics with the intercept row dropped.
    pub fn from_field_statistics(
        stats: FieldStatistics, tfce: Option<&TfceTransform<'_>>,
    ) -> PermutationResult<Self> {
        let statistics = stats.tvalues.slice(s![1.., ..]).to_owned();
        let pvalues = stats.pvalues.slice(s![1.., ..]).to_owned();
        let failures = stats.failures.iter().map(|(l, f)| (*l, f.to_string())).collect();
        Self::new(statistics, pvalues, failures, tfce)
    }

    /// Indirect-effect z as a one-row field.
    pub fn from_mediation(
        outcome: MediationOutcome, tfce: Option<&TfceTransform<'_>>,
    ) -> PermutationResult<Self> {
        let failures = outcome
            .failures
            .iter()
            .map(|(l, r)| (*l, format!("indirect-effect variance not positive (radicand {r})")))
            .collect();
        Self::new(
            outcome.z.insert_axis(Axis(0)),
            outcome.pvalues.insert_axis(Axis(0)),
            failures,
            tfce,
        )
    }

    pub fn ncontrasts(&self) -> usize {
        self.statistics.nrows()
    }

    /// Enhanced fields as a `(positive, negative)` pair, when TFCE ran.
    pub fn tfce(&self) -> Option<(&Array2<f64>, &Array2<f64>)> {
        self.tfce_positive.as_ref().zip(self.tfce_negative.as_ref())
    }

    /// Statistic used for FWER lookup: the signed statistic, or the signed
    /// TFCE score (positive minus negative enhancement) when enhancement
    /// ran.
    pub fn fwer_statistic(&self) -> Array2<f64> {
        match self.tfce() {
            Some((pos, neg)) => pos - neg,
            None => self.statistics.clone(),
        }
    }
}

/// What each relabelling recomputes.
#[derive(Debug, Clone)]
enum PermutedField<'a> {
    Regression(&'a DesignMatrix),
    Mediation(&'a MediationSpec),
}

#[derive(Debug, Clone)]
pub struct PermutationEngine<'a> {
    field: PermutedField<'a>,
    outcome: &'a Array2<f64>,
    exchangeability: Exchangeability,
    seed: u64,
    tfce: Option<TfceTransform<'a>>,
}

fn check_rows(what: &'static str, expected: usize, found: usize) -> PermutationResult<()> {
    if expected != found {
        return Err(PermutationError::ShapeMismatch { what, expected, found });
    }
    Ok(())
}

impl<'a> PermutationEngine<'a> {
    /// INIT for a regression field.
    ///
    /// Errors
    /// ------
    /// - `PermutationError::NoContrasts` for an intercept-only design.
    /// - `PermutationError::ShapeMismatch` when the outcome or the
    ///   exchangeability structure disagrees with the design rows.
    /// - `PermutationError::Estimation` for a rank-deficient design.
    pub fn new(
        design: &'a DesignMatrix, outcome: &'a Array2<f64>, exchangeability: Exchangeability,
        seed: u64,
    ) -> PermutationResult<Self> {
        if design.ncols() < 2 {
            return Err(PermutationError::NoContrasts);
        }
        check_rows("outcome rows", design.nobs(), outcome.nrows())?;
        check_rows("exchangeability rows", design.nobs(), exchangeability.nobs())?;
        OlsEstimator::new(design)?;
        Ok(Self {
            field: PermutedField::Regression(design),
            outcome,
            exchangeability,
            seed,
            tfce: None,
        })
    }

    /// INIT for a mediation field.
    ///
    /// Errors
    /// ------
    /// - `PermutationError::ShapeMismatch` when the outcome or the
    ///   exchangeability structure disagrees with the input rows.
    /// - `PermutationError::Mediation` when either path design cannot be
    ///   built or is rank-deficient.
    pub fn mediation(
        spec: &'a MediationSpec, outcome: &'a Array2<f64>, exchangeability: Exchangeability,
        seed: u64,
    ) -> PermutationResult<Self> {
        check_rows("outcome rows", spec.nobs(), outcome.nrows())?;
        check_rows("exchangeability rows", spec.nobs(), exchangeability.nobs())?;
        let (a, b) = spec.inputs.designs(spec.kind)?;
        OlsEstimator::new(&a)?;
        OlsEstimator::new(&b)?;
        Ok(Self {
            field: PermutedField::Mediation(spec),
            outcome,
            exchangeability,
            seed,
            tfce: None,
        })
    }

    /// Enable TFCE; the adjacency must cover every outcome column.
    pub fn with_tfce(mut self, tfce: TfceTransform<'a>) -> PermutationResult<Self> {
        check_rows("adjacency locations", self.outcome.ncols(), tfce.adjacency().len())?;
        self.tfce = Some(tfce);
        Ok(self)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rows of the null distribution: one per regressor, or one for z.
    pub fn ncontrasts(&self) -> usize {
        match self.field {
            PermutedField::Regression(design) => design.num_contrasts(),
            PermutedField::Mediation(_) => 1,
        }
    }

    /// Index-0 pass on the true labelling.
    pub fn observed(&self) -> PermutationResult<ObservedField> {
        match self.field {
            PermutedField::Regression(design) => {
                let stats = estimate_field(
                    ModelKind::Linear,
                    design,
                    self.outcome,
                    None,
                    &MixedOptions::default(),
                )?;
                ObservedField::from_field_statistics(stats, self.tfce.as_ref())
            }
            PermutedField::Mediation(spec) => {
                let outcome = spec.run(self.outcome, &PathModel::default())?;
                ObservedField::from_mediation(outcome, self.tfce.as_ref())
            }
        }
    }

    /// Contrast rows of the field under relabelling `index`.
    fn relabelled(&self, index: &[usize]) -> PermutationResult<Array2<f64>> {
        match self.field {
            PermutedField::Regression(design) => {
                let permuted = design.permute_rows(index);
                let tvalues = OlsEstimator::new(&permuted)?.tvalues(self.outcome)?;
                Ok(tvalues.slice(s![1.., ..]).to_owned())
            }
            PermutedField::Mediation(spec) => {
                let permuted = spec.inputs.permute_rows(index);
                let field = spec.indirect_field(&permuted, self.outcome)?;
                Ok(Array1::from(field.z).insert_axis(Axis(0)))
            }
        }
    }

    /// PERMUTE → ESTIMATE → [TFCE] → ACCUMULATE for permutation `p`.
    pub fn permutation(&self, p: usize, ws: &mut TfceWorkspace) -> PermutationResult<Vec<f64>> {
        let mut rng = permutation_rng(self.seed, p);
        let index = self.exchangeability.draw(&mut rng);
        let statistics = self.relabelled(&index)?;
        self.accumulate(&statistics, ws)
    }

    fn accumulate(&self, statistics: &Array2<f64>, ws: &mut TfceWorkspace) -> PermutationResult<Vec<f64>> {
        statistics
            .axis_iter(Axis(0))
            .map(|row| match &self.tfce {
                None => Ok(row.iter().fold(0.0_f64, |acc, &t| acc.max(nan_to_zero(t).abs()))),
                Some(tfce) => Ok(tfce.enhance_signed_with(row, ws)?.max_abs()),
            })
            .collect()
    }

    /// Run permutations `range` (inclusive, starting at 1 or later).
    ///
    /// Errors
    /// ------
    /// - `PermutationError::InvalidRange` for an empty range or one that
    ///   includes index 0.
    /// - The first estimation/TFCE error met by any permutation.
    pub fn run(&self, range: RangeInclusive<usize>) -> PermutationResult<NullDistribution> {
        let (start, end) = (*range.start(), *range.end());
        if start == 0 || start > end {
            return Err(PermutationError::InvalidRange { start, end });
        }
        let started = Instant::now();

        let columns: Vec<Vec<f64>> = range
            .into_par_iter()
            .map_init(TfceWorkspace::default, |ws, p| self.permutation(p, ws))
            .collect::<PermutationResult<_>>()?;

        let count = columns.len();
        let contrasts = self.ncontrasts();
        let mut maxima = Array2::<f64>::zeros((contrasts, count));
        for (j, col) in columns.iter().enumerate() {
            for (c, &v) in col.iter().enumerate() {
                maxima[[c, j]] = v;
            }
        }

        let precision = 2.0 * (0.05 * 0.95 / count as f64).sqrt();
        tracing::info!(
            start,
            end,
            elapsed_s = started.elapsed().as_secs_f64(),
            tfce = self.tfce.is_some(),
            mediation = matches!(self.field, PermutedField::Mediation(_)),
            "Permutations complete; p = 0.05 ± {precision:.4} at this count"
        );
        NullDistribution::new(start, maxima)
    }

    /// Run permutations `1..=count`.
    pub fn run_all(&self, count: usize) -> PermutationResult<NullDistribution> {
        self.run(1..=count)
    }
}
