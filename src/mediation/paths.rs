//! Path-A / path-B designs for the three mediation layouts.
//!
//! Purpose
//! -------
//! Run the two regressions of a mediation test across every location and
//! combine their t-statistics into an indirect-effect z, p and FDR q.
//!
//! Key behaviors
//! -------------
//! With `left` the predictor, `right` the other non-imaging variable and
//! `C` the covariates (the intercept is always prepended):
//!
//! | type | path A                        | path B                              |
//! |------|-------------------------------|-------------------------------------|
//! | `I`  | location ~ left + C           | location ~ left + right + C         |
//! | `M`  | location ~ left + C           | location ~ right + left + C         |
//! | `Y`  | right ~ left + C (once)       | location ~ right + left + C         |
//!
//! The path statistic is always the t-value of design column 1. For type
//! `Y` path A involves no imaging data, so its single t-value is broadcast
//! to every location.
//!
//! Conventions
//! -----------
//! - p-values are two-sided standard-normal tail probabilities of z.
//! - FDR is Benjamini–Hochberg across locations, NaN p counted as 1.
//! - A location whose Goodman variance is not positive keeps a NaN z (p
//!   counted as 1) and is listed in [`MediationOutcome::failures`]; the
//!   other locations are unaffected.
use crate::{
    correction::fdr_bh,
    design::{DesignMatrix, GroupLabels, with_intercept},
    estimation::{MixedOptions, ModelKind, estimate_field, pvalues::normal_two_sided_scalar},
    mediation::{
        combiner::{IndirectAlgorithm, IndirectField},
        errors::{MediationError, MediationResult},
    },
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which variable the imaging data plays in the mediation triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediationType {
    /// Imaging data is the independent variable.
    I,
    /// Imaging data is the mediator.
    M,
    /// Imaging data is the dependent variable.
    Y,
}

impl FromStr for MediationType {
    type Err = MediationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "I" => Ok(MediationType::I),
            "M" => Ok(MediationType::M),
            "Y" => Ok(MediationType::Y),
            _ => Err(MediationError::InvalidMediationType { code: s.to_string() }),
        }
    }
}

/// Non-imaging variables of a mediation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediationInputs {
    pub left: (String, Vec<f64>),
    pub right: (String, Vec<f64>),
    pub covariates: Vec<(String, Vec<f64>)>,
}

impl MediationInputs {
    pub fn nobs(&self) -> usize {
        self.left.1.len()
    }

    /// Every variable reordered so that row `i` takes row `index[i]`.
    ///
    /// Panics
    /// ------
    /// - Panics if an entry of `index` is out of bounds; index vectors come
    ///   from `permutation::Exchangeability`.
    pub fn permute_rows(&self, index: &[usize]) -> MediationInputs {
        let pick = |(name, values): &(String, Vec<f64>)| {
            (name.clone(), index.iter().map(|&i| values[i]).collect::<Vec<f64>>())
        };
        MediationInputs {
            left: pick(&self.left),
            right: pick(&self.right),
            covariates: self.covariates.iter().map(pick).collect(),
        }
    }

    fn design(&self, leading: &[&(String, Vec<f64>)]) -> MediationResult<DesignMatrix> {
        let mut columns: Vec<(String, Vec<f64>)> = leading.iter().map(|c| (*c).clone()).collect();
        columns.extend(self.covariates.iter().cloned());
        Ok(with_intercept(self.nobs(), &columns)?)
    }

    /// Path-A and path-B designs for `kind`.
    pub fn designs(&self, kind: MediationType) -> MediationResult<(DesignMatrix, DesignMatrix)> {
        let a = self.design(&[&self.left])?;
        let b = match kind {
            MediationType::I => self.design(&[&self.left, &self.right])?,
            MediationType::M | MediationType::Y => self.design(&[&self.right, &self.left])?,
        };
        Ok((a, b))
    }
}

/// One complete mediation question: imaging role, combiner and inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediationSpec {
    pub kind: MediationType,
    pub algorithm: IndirectAlgorithm,
    pub inputs: MediationInputs,
}

impl MediationSpec {
    pub fn nobs(&self) -> usize {
        self.inputs.nobs()
    }

    /// [`run_mediation`] with this specification.
    pub fn run(&self, y: &Array2<f64>, model: &PathModel<'_>) -> MediationResult<MediationOutcome> {
        run_mediation(self.kind, self.algorithm, &self.inputs, y, model)
    }

    /// z-field alone for `inputs` (which may be a relabelled copy of
    /// `self.inputs`), with OLS paths. Used by permutation passes, which
    /// need neither p-values nor logging.
    pub fn indirect_field(
        &self, inputs: &MediationInputs, y: &Array2<f64>,
    ) -> MediationResult<IndirectField> {
        let (ta, tb) = path_tvalues(self.kind, inputs, y, &PathModel::default())?;
        self.algorithm.combine(&ta.to_vec(), &tb.to_vec())
    }
}

/// Estimator selection for both paths.
#[derive(Debug, Clone, Default)]
pub struct PathModel<'a> {
    pub kind: ModelKind,
    pub groups: Option<&'a GroupLabels>,
    pub mixed: MixedOptions,
}

/// Per-location mediation results.
#[derive(Debug, Clone, PartialEq)]
pub struct MediationOutcome {
    pub ta: Array1<f64>,
    pub tb: Array1<f64>,
    pub z: Array1<f64>,
    pub pvalues: Array1<f64>,
    pub qvalues: Array1<f64>,
    /// `(location, radicand)` where the Goodman variance was not positive.
    pub failures: Vec<(usize, f64)>,
}

impl MediationOutcome {
    /// Combine aligned path t-values and derive p and q.
    ///
    /// Errors
    /// ------
    /// - `MediationError::LengthMismatch` when the paths differ in length.
    pub fn from_paths(
        algorithm: IndirectAlgorithm, ta: Array1<f64>, tb: Array1<f64>,
    ) -> MediationResult<Self> {
        let IndirectField { z, failures } = algorithm.combine(&ta.to_vec(), &tb.to_vec())?;
        if let Some((first, radicand)) = failures.first() {
            tracing::warn!(
                count = failures.len(),
                first,
                radicand,
                "Goodman variance not positive; z set to NaN at these locations"
            );
        }
        let z = Array1::from(z);
        let pvalues = z.mapv(normal_two_sided_scalar);
        let qvalues = Array1::from(fdr_bh(&pvalues.to_vec()));
        Ok(MediationOutcome { ta, tb, z, pvalues, qvalues, failures })
    }
}

fn column_one_tvalues(
    model: &PathModel<'_>, design: &DesignMatrix, y: &Array2<f64>,
) -> MediationResult<Array1<f64>> {
    let stats = estimate_field(model.kind, design, y, model.groups, &model.mixed)?;
    Ok(stats.tvalues.row(1).to_owned())
}

fn path_tvalues(
    kind: MediationType, inputs: &MediationInputs, y: &Array2<f64>, model: &PathModel<'_>,
) -> MediationResult<(Array1<f64>, Array1<f64>)> {
    let n = inputs.nobs();
    if y.nrows() != n {
        return Err(MediationError::LengthMismatch { what: "outcome rows", expected: n, found: y.nrows() });
    }
    if inputs.right.1.len() != n {
        return Err(MediationError::LengthMismatch {
            what: "right variable",
            expected: n,
            found: inputs.right.1.len(),
        });
    }
    let m = y.ncols();
    let (design_a, design_b) = inputs.designs(kind)?;

    let ta = match kind {
        MediationType::I | MediationType::M => column_one_tvalues(model, &design_a, y)?,
        MediationType::Y => {
            let right = Array2::from_shape_fn((n, 1), |(i, _)| inputs.right.1[i]);
            let t = column_one_tvalues(model, &design_a, &right)?;
            Array1::from_elem(m, t[0])
        }
    };
    let tb = column_one_tvalues(model, &design_b, y)?;
    Ok((ta, tb))
}

/// Run both paths over `y` (n×m) and combine them.
///
/// Errors
/// ------
/// - `MediationError::LengthMismatch` when inputs and `y` disagree in rows.
/// - Wrapped design/estimation errors (rank deficiency, missing groups).
pub fn run_mediation(
    kind: MediationType, algorithm: IndirectAlgorithm, inputs: &MediationInputs,
    y: &Array2<f64>, model: &PathModel<'_>,
) -> MediationResult<MediationOutcome> {
    let (ta, tb) = path_tvalues(kind, inputs, y, model)?;
    MediationOutcome::from_paths(algorithm, ta, tb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::ols::OlsEstimator;
    use approx::assert_abs_diff_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Type-code parsing.
    // - Design layouts per mediation type.
    // - Agreement of `run_mediation` with manual path regressions.
    // -------------------------------------------------------------------------

    fn inputs() -> MediationInputs {
        let left: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let right: Vec<f64> = left.iter().map(|x| 0.8 * x + ((*x as usize * 5) % 3) as f64).collect();
        let cov: Vec<f64> = (0..10).map(|i| ((i * 7) % 4) as f64).collect();
        MediationInputs {
            left: ("x".into(), left),
            right: ("m".into(), right),
            covariates: vec![("age".into(), cov)],
        }
    }

    fn outcome() -> Array2<f64> {
        Array2::from_shape_fn((10, 3), |(i, j)| {
            (i as f64) * (j as f64 + 1.0) * 0.5 + ((i * 3 + j) % 4) as f64
        })
    }

    #[test]
    fn parses_type_codes() {
        assert_eq!("m".parse::<MediationType>().unwrap(), MediationType::M);
        assert_eq!(" Y ".parse::<MediationType>().unwrap(), MediationType::Y);
        assert_eq!(
            "X".parse::<MediationType>().unwrap_err(),
            MediationError::InvalidMediationType { code: "X".into() }
        );
    }

    #[test]
    fn design_column_order_follows_type() {
        let inp = inputs();
        let (a, b) = inp.designs(MediationType::I).unwrap();
        assert_eq!(a.contrast_names(), &["x".to_string(), "age".to_string()]);
        assert_eq!(b.contrast_names(), &["x".to_string(), "m".to_string(), "age".to_string()]);
        let (_, b) = inp.designs(MediationType::M).unwrap();
        assert_eq!(b.contrast_names(), &["m".to_string(), "x".to_string(), "age".to_string()]);
    }

    #[test]
    // Purpose
    // -------
    // Type M with OLS paths equals manual path regressions plus Aroian.
    //
    // Given
    // -----
    // - 10 observations, 3 locations, one covariate.
    //
    // Expect
    // ------
    // - ta, tb equal row 1 of the manual path t-values; z, p, q consistent.
    fn type_m_matches_manual_paths() {
        let inp = inputs();
        let y = outcome();
        let (da, db) = inp.designs(MediationType::M).unwrap();
        let ta = OlsEstimator::new(&da).unwrap().tvalues(&y).unwrap();
        let tb = OlsEstimator::new(&db).unwrap().tvalues(&y).unwrap();

        let out = run_mediation(
            MediationType::M,
            IndirectAlgorithm::Aroian,
            &inp,
            &y,
            &PathModel::default(),
        )
        .unwrap();

        for l in 0..3 {
            assert_abs_diff_eq!(out.ta[l], ta[[1, l]], epsilon = 1e-10);
            assert_abs_diff_eq!(out.tb[l], tb[[1, l]], epsilon = 1e-10);
            let z = IndirectAlgorithm::Aroian.z(ta[[1, l]], tb[[1, l]]).unwrap();
            assert_abs_diff_eq!(out.z[l], z, epsilon = 1e-10);
            assert!(out.qvalues[l] >= out.pvalues[l] - 1e-15);
        }
    }

    #[test]
    fn type_y_broadcasts_single_path_a() {
        let inp = inputs();
        let y = outcome();

        let out =
            run_mediation(MediationType::Y, IndirectAlgorithm::Sobel, &inp, &y, &PathModel::default())
                .unwrap();

        assert_eq!(out.ta.len(), 3);
        assert!(out.ta.iter().all(|&t| t == out.ta[0]));
        assert!(out.ta[0].is_finite());
    }

    #[test]
    fn misaligned_outcome_is_rejected() {
        let inp = inputs();
        let y = Array2::<f64>::zeros((9, 2));
        assert!(matches!(
            run_mediation(MediationType::I, IndirectAlgorithm::Aroian, &inp, &y, &PathModel::default()),
            Err(MediationError::LengthMismatch { what: "outcome rows", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // One location with weak paths must not sink a Goodman run over a field
    // of strong mediated signal.
    //
    // Given
    // -----
    // - 50 locations: 49 with path t-values (4.8, 5.1) and one with
    //   (0.3, 0.2), whose Goodman radicand is negative.
    //
    // Expect
    // ------
    // - `Ok`, with location 49 failed (NaN z, p counted as 1, q = 1).
    // - The 49 strong locations keep finite z and small q.
    fn goodman_weak_location_fails_alone() {
        let mut ta = Array1::from_elem(50, 4.8);
        let mut tb = Array1::from_elem(50, 5.1);
        ta[49] = 0.3;
        tb[49] = 0.2;

        let out = MediationOutcome::from_paths(IndirectAlgorithm::Goodman, ta, tb).unwrap();

        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].0, 49);
        assert!(out.failures[0].1 < 0.0);
        assert!(out.z[49].is_nan());
        assert_eq!(crate::utils::nan_to_one(out.pvalues[49]), 1.0);
        assert_abs_diff_eq!(out.qvalues[49], 1.0, epsilon = 1e-12);
        for l in 0..49 {
            assert!(out.z[l].is_finite() && out.z[l] > 3.0);
            assert!(out.qvalues[l] < 0.01);
        }
    }

    #[test]
    fn permuted_inputs_follow_index_and_spec_reproduces_run() {
        let inp = inputs();
        let index: Vec<usize> = (0..10).rev().collect();
        let flipped = inp.permute_rows(&index);
        assert_eq!(flipped.left.1[0], inp.left.1[9]);
        assert_eq!(flipped.covariates[0].1[2], inp.covariates[0].1[7]);
        assert_eq!(flipped.right.0, "m");

        let spec = MediationSpec {
            kind: MediationType::I,
            algorithm: IndirectAlgorithm::Sobel,
            inputs: inp.clone(),
        };
        let y = outcome();
        let full = spec.run(&y, &PathModel::default()).unwrap();
        let field = spec.indirect_field(&inp, &y).unwrap();
        assert_eq!(Array1::from(field.z), full.z);
        assert!(field.failures.is_empty());
    }
}
