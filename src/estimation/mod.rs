//! estimation — per-location test statistics for a whole field.
//!
//! Purpose
//! -------
//! Turn a design `X` (n×k) and an outcome `Y` (n×m) into a k×m matrix of
//! per-regressor statistics, either in closed form (OLS) or by fitting a
//! random-intercept mixed model per location.
//!
//! Key behaviors
//! -------------
//! - [`OlsEstimator`] hoists `(XᵀX)⁻¹` out of the location loop and computes
//!   every t-statistic in one batched matrix pass.
//! - [`mixed::MixedModel`] fits locations independently and in parallel,
//!   returning typed per-location results.
//! - [`pvalues`] converts statistics into two-sided raw p-values.
//!
//! Invariants & assumptions
//! ------------------------
//! - Row 0 of every k×m output is the intercept; contrasts are rows `1..k`.
//! - Rank deficiency of `X` is a fatal [`EstimationError::RankDeficient`].
//! - NaN statistics from degenerate columns are passed through unchanged.
//!
//! Downstream usage
//! ----------------
//! - The permutation engine builds one `OlsEstimator` per relabelled design.
//! - `analysis` and `mediation` choose between OLS and mixed estimation
//!   through [`ModelKind`].

pub mod errors;
pub mod linalg;
pub mod mixed;
pub mod ols;
pub mod pvalues;

pub use self::errors::{EstimationError, EstimationResult};
pub use self::mixed::{
    Criterion, FitFailure, FixedEffects, LocationFit, MixedFieldFit, MixedModel, MixedOptions,
};
pub use self::ols::{OlsEstimator, OlsFit, ols_tvalues};
pub use self::pvalues::{normal_two_sided, student_t_two_sided};

use crate::design::{DesignError, DesignMatrix, GroupLabels};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which estimator produces the statistic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelKind {
    #[default]
    Linear,
    Mixed,
}

impl FromStr for ModelKind {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" | "ols" => Ok(ModelKind::Linear),
            "mixed" | "lme" => Ok(ModelKind::Mixed),
            _ => Err(DesignError::UnknownOption {
                what: "model kind",
                value: s.to_string(),
                expected: "'linear' or 'mixed'",
            }),
        }
    }
}

/// Statistics plus the matching two-sided raw p-values for one field.
#[derive(Debug, Clone)]
pub struct FieldStatistics {
    /// k×m statistics, intercept row first.
    pub tvalues: Array2<f64>,
    /// k×m raw p-values (NaN where the statistic is NaN).
    pub pvalues: Array2<f64>,
    /// Mixed-model locations that failed, with their indices.
    pub failures: Vec<(usize, FitFailure)>,
}

/// Estimate a field with either model.
///
/// OLS p-values use the Student t distribution with the residual degrees
/// of freedom `n − k` of the full design (`k` counts the intercept).
/// Mixed-model p-values use the standard normal, since the per-location
/// Wald statistics have no closed-form degrees of freedom.
///
/// Errors
/// ------
/// - `EstimationError::Design` when `Mixed` is requested without groups.
/// - Any error from the chosen estimator.
pub fn estimate_field(
    kind: ModelKind, design: &DesignMatrix, y: &Array2<f64>, groups: Option<&GroupLabels>,
    mixed: &MixedOptions,
) -> EstimationResult<FieldStatistics> {
    match kind {
        ModelKind::Linear => {
            let est = OlsEstimator::new(design)?;
            let tvalues = est.tvalues(y)?;
            let pvalues = student_t_two_sided(&tvalues, est.df());
            Ok(FieldStatistics { tvalues, pvalues, failures: Vec::new() })
        }
        ModelKind::Mixed => {
            let groups = groups.ok_or(DesignError::EmptyGroupList)?;
            let field = MixedModel::new(design, groups, mixed.clone())?.fit_field(y)?;
            let pvalues = normal_two_sided(&field.tvalues);
            Ok(FieldStatistics { tvalues: field.tvalues, pvalues, failures: field.failures })
        }
    }
}

pub mod prelude {
    pub use super::errors::{EstimationError, EstimationResult};
    pub use super::mixed::{MixedModel, MixedOptions};
    pub use super::ols::{OlsEstimator, ols_tvalues};
    pub use super::{FieldStatistics, ModelKind, estimate_field};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::with_intercept;
    use approx::assert_abs_diff_eq;
    use statrs::distribution::{ContinuousCDF, StudentsT};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Model-kind parsing and its error type.
    // - The degrees of freedom behind OLS p-values.
    // -------------------------------------------------------------------------

    #[test]
    fn model_kind_parses_aliases_and_rejects_unknown_names() {
        assert_eq!("OLS".parse::<ModelKind>().unwrap(), ModelKind::Linear);
        assert_eq!("lme".parse::<ModelKind>().unwrap(), ModelKind::Mixed);
        assert_eq!(
            "bayes".parse::<ModelKind>().unwrap_err(),
            DesignError::UnknownOption {
                what: "model kind",
                value: "bayes".into(),
                expected: "'linear' or 'mixed'",
            }
        );
    }

    #[test]
    // Purpose
    // -------
    // OLS p-values are Student t tails with n − k degrees of freedom, the
    // intercept counted in k.
    //
    // Given
    // -----
    // - n = 12, two regressors plus intercept (k = 3), two locations.
    //
    // Expect
    // ------
    // - Every p equals 2·(1 − F₉(|t|)).
    fn ols_pvalues_use_n_minus_k_degrees_of_freedom() {
        let a: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..12).map(|i| ((i * 5) % 7) as f64).collect();
        let design = with_intercept(12, &[("a".into(), a.clone()), ("b".into(), b)]).unwrap();
        let y = Array2::from_shape_fn((12, 2), |(i, j)| {
            0.3 * a[i] * (j as f64) + ((i * 3 + j) % 4) as f64
        });

        let stats = estimate_field(ModelKind::Linear, &design, &y, None, &MixedOptions::default())
            .unwrap();
        let dist = StudentsT::new(0.0, 1.0, 9.0).unwrap();
        for (t, p) in stats.tvalues.iter().zip(stats.pvalues.iter()) {
            assert_abs_diff_eq!(*p, 2.0 * (1.0 - dist.cdf(t.abs())), epsilon = 1e-10);
        }
        assert!(stats.failures.is_empty());
    }
}
