//! End-to-end in-memory analyses producing report tables.
//!
//! Purpose
//! -------
//! Chain estimation, optional permutation FWER (with or without TFCE) and
//! FDR correction into one call per analysis kind.
//!
//! Key behaviors
//! -------------
//! - [`run_mass_univariate`] estimates every location with the chosen
//!   model, adds BH q-values per contrast and, when `permutations > 0`,
//!   FWER p-values from the maximum-statistic null.
//! - [`run_mediation_analysis`] runs both mediation paths and tabulates
//!   z, p and q per location and, when permutations are requested, FWER
//!   p-values from the maximum-|z| (or TFCE) null over relabelled inputs.
//! - With TFCE configured, both tables carry the positive and negative
//!   enhanced scores of the observed field.
//!
//! Invariants & assumptions
//! ------------------------
//! - Mixed models with permutations are rejected up front, as is TFCE
//!   without an adjacency.
//! - Output tables are locations × contrasts; the intercept is dropped.
//! - Tables are built by [`ResultTable::from_observed`] and
//!   [`MediationTable::from_observed`], the same path the out-of-core
//!   store finalizes through.
use crate::{
    analysis::{
        errors::{AnalysisError, AnalysisResult},
        report::{MediationTable, ResultTable},
    },
    design::{DesignMatrix, GroupLabels, OutcomeMatrix},
    estimation::{MixedOptions, ModelKind, estimate_field},
    mediation::{MediationSpec, PathModel},
    permutation::{
        Exchangeability, ObservedField, PermutationEngine, PermutationOptions, SortedNull,
        seed_from_clock,
    },
    tfce::{AdjacencySet, TfceParams, TfceTransform},
};
use serde::{Deserialize, Serialize};

/// Options of a mass-univariate run.
///
/// - `permutations`: `P`; 0 skips FWER.
/// - `seed`: permutation base seed; `None` draws one from the clock.
/// - `tfce`: enhance fields before the FWER lookup (needs an adjacency).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub model: ModelKind,
    pub mixed: MixedOptions,
    pub permutations: usize,
    pub seed: Option<u64>,
    pub tfce: Option<TfceParams>,
}

impl AnalysisOptions {
    /// Errors
    /// ------
    /// - `AnalysisError::InvalidOptions` for a mixed model with
    ///   permutations.
    pub fn validate(&self) -> AnalysisResult<()> {
        check_model(self.model, self.permutations)?;
        if let Some(params) = &self.tfce {
            params.validate()?;
        }
        Ok(())
    }
}

fn check_model(model: ModelKind, permutations: usize) -> AnalysisResult<()> {
    if model == ModelKind::Mixed && permutations > 0 {
        return Err(AnalysisError::InvalidOptions {
            text: "permutation testing is only available for the linear model".into(),
        });
    }
    Ok(())
}

fn tfce_transform(
    adjacency: Option<&AdjacencySet>, params: Option<TfceParams>,
) -> AnalysisResult<Option<TfceTransform<'_>>> {
    let Some(params) = params else {
        return Ok(None);
    };
    let adjacency = adjacency.ok_or(AnalysisError::InvalidOptions {
        text: "TFCE requires an adjacency set".into(),
    })?;
    Ok(Some(TfceTransform::new(adjacency, params)?))
}

fn sorted_null<'a>(
    engine: PermutationEngine<'a>, tfce: Option<TfceTransform<'a>>, count: usize,
) -> AnalysisResult<SortedNull> {
    let engine = match tfce {
        None => engine,
        Some(tfce) => engine.with_tfce(tfce)?,
    };
    Ok(engine.run_all(count)?.finalize())
}

/// Mass-univariate analysis of `outcome` against `design`.
///
/// Errors
/// ------
/// - `AnalysisError::InvalidOptions` for rejected option combinations.
/// - Wrapped design, estimation, TFCE and permutation errors.
pub fn run_mass_univariate(
    design: &DesignMatrix, outcome: &OutcomeMatrix, groups: Option<&GroupLabels>,
    adjacency: Option<&AdjacencySet>, options: &AnalysisOptions,
) -> AnalysisResult<ResultTable> {
    options.validate()?;
    outcome.check_rows(design)?;
    if let Some(groups) = groups {
        groups.check_rows(design.nobs())?;
    }

    let y = outcome.values();
    let tfce = tfce_transform(adjacency, options.tfce)?;
    let stats = estimate_field(options.model, design, y, groups, &options.mixed)?;
    let observed = ObservedField::from_field_statistics(stats, tfce.as_ref())?;

    let (null, seed) = if options.permutations > 0 {
        let seed = options.seed.unwrap_or_else(seed_from_clock);
        let exch = Exchangeability::from_groups(design.nobs(), groups)?;
        let engine = PermutationEngine::new(design, y, exch, seed)?;
        (Some(sorted_null(engine, tfce, options.permutations)?), Some(seed))
    } else {
        (None, None)
    };

    Ok(ResultTable::from_observed(
        outcome.location_ids().to_vec(),
        design.contrast_names().to_vec(),
        &observed,
        null.as_ref(),
        seed,
    )?)
}

/// Mediation analysis of `outcome` with the imaging data in the role
/// `spec.kind`.
///
/// With `permutation.count > 0` the non-imaging inputs are relabelled
/// jointly (within blocks of `model.groups`, if any) and the maximum |z|,
/// or the maximum TFCE score when `permutation.tfce` is set, is kept per
/// permutation.
///
/// Errors
/// ------
/// - `AnalysisError::InvalidOptions` for mixed paths with permutations or
///   TFCE without an adjacency.
/// - Wrapped mediation, TFCE and permutation errors.
pub fn run_mediation_analysis(
    spec: &MediationSpec, outcome: &OutcomeMatrix, model: &PathModel<'_>,
    adjacency: Option<&AdjacencySet>, permutation: &PermutationOptions,
) -> AnalysisResult<MediationTable> {
    check_model(model.kind, permutation.count)?;
    if let Some(params) = &permutation.tfce {
        params.validate()?;
    }

    let y = outcome.values();
    let tfce = tfce_transform(adjacency, permutation.tfce)?;
    let observed = ObservedField::from_mediation(spec.run(y, model)?, tfce.as_ref())?;

    let (null, seed) = if permutation.count > 0 {
        let seed = permutation.resolve_seed();
        let exch = Exchangeability::from_groups(spec.nobs(), model.groups)?;
        let engine = PermutationEngine::mediation(spec, y, exch, seed)?;
        (Some(sorted_null(engine, tfce, permutation.count)?), Some(seed))
    } else {
        (None, None)
    };

    Ok(MediationTable::from_observed(
        outcome.location_ids().to_vec(),
        &observed,
        null.as_ref(),
        seed,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        design::with_intercept,
        estimation::OlsEstimator,
        mediation::{IndirectAlgorithm, MediationInputs, MediationType},
    };
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Option validation.
    // - Table layout and agreement with direct estimation.
    // - Permutation FWER with and without TFCE.
    // - Enhanced score columns.
    // - Mediation tables with and without permutations.
    // -------------------------------------------------------------------------

    fn fixture() -> (DesignMatrix, OutcomeMatrix) {
        let age: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let sex: Vec<f64> = (0..16).map(|i| (i % 2) as f64).collect();
        let design =
            with_intercept(16, &[("age".into(), age.clone()), ("sex".into(), sex)]).unwrap();
        let y = Array2::from_shape_fn((16, 4), |(i, j)| {
            let signal = if j == 0 { 0.8 * age[i] } else { 0.0 };
            signal + ((i * 5 + j * 7) % 6) as f64
        });
        let ids = ["lh_a", "lh_b", "rh_a", "rh_b"].iter().map(|s| s.to_string()).collect();
        (design, OutcomeMatrix::new(y, ids).unwrap())
    }

    #[test]
    fn mixed_with_permutations_is_rejected() {
        let (design, outcome) = fixture();
        let options =
            AnalysisOptions { model: ModelKind::Mixed, permutations: 10, ..Default::default() };
        assert!(matches!(
            run_mass_univariate(&design, &outcome, None, None, &options),
            Err(AnalysisError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn tfce_without_adjacency_is_rejected() {
        let (design, outcome) = fixture();
        let options = AnalysisOptions {
            permutations: 5,
            seed: Some(1),
            tfce: Some(TfceParams::default()),
            ..Default::default()
        };
        assert!(matches!(
            run_mass_univariate(&design, &outcome, None, None, &options),
            Err(AnalysisError::InvalidOptions { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Without permutations the table is the transposed contrast rows of a
    // direct OLS fit plus BH q-values.
    //
    // Given
    // -----
    // - 16 observations, two regressors, four named locations.
    //
    // Expect
    // ------
    // - tvalues[l, c] equals the OLS t of contrast c + 1 at location l.
    // - No FWER block, no seed, q ≥ p everywhere.
    fn linear_table_matches_direct_estimation() {
        let (design, outcome) = fixture();
        let table =
            run_mass_univariate(&design, &outcome, None, None, &AnalysisOptions::default()).unwrap();
        let direct = OlsEstimator::new(&design).unwrap().tvalues(outcome.values()).unwrap();

        assert_eq!(table.tvalues.dim(), (4, 2));
        assert_eq!(table.location_ids[2], "rh_a");
        assert_eq!(table.contrast_names, vec!["age".to_string(), "sex".to_string()]);
        for l in 0..4 {
            for c in 0..2 {
                assert_abs_diff_eq!(table.tvalues[[l, c]], direct[[c + 1, l]], epsilon = 1e-12);
                assert!(table.qvalues[[l, c]] >= table.pvalues[[l, c]] - 1e-15);
            }
        }
        assert!(table.fwer.is_none());
        assert!(table.seed.is_none());
    }

    #[test]
    fn permutations_add_fwer_block_and_record_seed() {
        let (design, outcome) = fixture();
        let options = AnalysisOptions { permutations: 50, seed: Some(7), ..Default::default() };
        let table = run_mass_univariate(&design, &outcome, None, None, &options).unwrap();

        let fwer = table.fwer.as_ref().unwrap();
        assert_eq!(fwer.dim(), (4, 2));
        assert!(fwer.iter().all(|&p| p >= 1.0 / 50.0 && p <= 1.0));
        assert_eq!(table.seed, Some(7));
        // The strongest age effect sits at location 0.
        assert!(fwer[[0, 0]] <= fwer[[1, 0]]);

        let again = run_mass_univariate(&design, &outcome, None, None, &options).unwrap();
        assert_eq!(again.fwer, table.fwer);
    }

    #[test]
    fn tfce_fwer_runs_over_adjacency() {
        let (design, outcome) = fixture();
        let adj = AdjacencySet::from_neighbour_lists(&[vec![1], vec![2], vec![3], vec![]]).unwrap();
        let options = AnalysisOptions {
            permutations: 20,
            seed: Some(3),
            tfce: Some(TfceParams::default()),
            ..Default::default()
        };
        let table = run_mass_univariate(&design, &outcome, None, Some(&adj), &options).unwrap();
        let fwer = table.fwer.unwrap();
        assert!(fwer.iter().all(|&p| p > 0.0 && p <= 1.0));
    }

    #[test]
    // Purpose
    // -------
    // With TFCE configured the table carries both enhanced fields.
    //
    // Given
    // -----
    // - The 4-location fixture on a chain, TFCE defaults, no permutations.
    //
    // Expect
    // ------
    // - Two 4×2 fields; a positive t has no negative score and vice versa.
    // - The header lists `tfce_age` right after the t-value block.
    fn tfce_scores_are_tabulated() {
        let (design, outcome) = fixture();
        let adj = AdjacencySet::from_neighbour_lists(&[vec![1], vec![2], vec![3], vec![]]).unwrap();
        let options = AnalysisOptions { tfce: Some(TfceParams::default()), ..Default::default() };
        let table = run_mass_univariate(&design, &outcome, None, Some(&adj), &options).unwrap();

        let (pos, neg) = table.tfce.as_ref().unwrap();
        assert_eq!(pos.dim(), (4, 2));
        assert_eq!(neg.dim(), (4, 2));
        for ((&t, &p), &n) in table.tvalues.iter().zip(pos.iter()).zip(neg.iter()) {
            assert!(p >= 0.0 && n >= 0.0);
            if t > 0.0 {
                assert_eq!(n, 0.0);
            }
            if t < 0.0 {
                assert_eq!(p, 0.0);
            }
        }
        assert_eq!(table.header()[3], "tfce_age");
        assert!(table.fwer.is_none());
    }

    fn mediation_spec() -> MediationSpec {
        let x: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let med: Vec<f64> = x.iter().map(|v| 0.5 * v + (*v as usize % 3) as f64).collect();
        MediationSpec {
            kind: MediationType::M,
            algorithm: IndirectAlgorithm::Aroian,
            inputs: MediationInputs {
                left: ("x".into(), x),
                right: ("med".into(), med),
                covariates: Vec::new(),
            },
        }
    }

    #[test]
    fn mediation_table_carries_location_ids() {
        let (_, outcome) = fixture();
        let table = run_mediation_analysis(
            &mediation_spec(),
            &outcome,
            &PathModel::default(),
            None,
            &PermutationOptions::default(),
        )
        .unwrap();
        assert_eq!(table.location_ids, outcome.location_ids());
        assert_eq!(table.z.len(), 4);
        assert!(table.fwer.is_none());
        assert!(table.seed.is_none());
    }

    #[test]
    // Purpose
    // -------
    // Mediation permutations produce a reproducible FWER column, enhanced
    // when TFCE is on.
    //
    // Given
    // -----
    // - The mediation fixture, P = 30, seed 4, chain adjacency with TFCE.
    //
    // Expect
    // ------
    // - pFWER in [1/30, 1] for all 4 locations; seed recorded.
    // - A second run gives identical FWER; the TFCE pair is present.
    fn mediation_permutations_add_fwer_column() {
        let (_, outcome) = fixture();
        let adj = AdjacencySet::from_neighbour_lists(&[vec![1], vec![2], vec![3], vec![]]).unwrap();
        let options = PermutationOptions::new(30, Some(4), Some(TfceParams::default()));
        let spec = mediation_spec();

        let table =
            run_mediation_analysis(&spec, &outcome, &PathModel::default(), Some(&adj), &options)
                .unwrap();
        let fwer = table.fwer.as_ref().unwrap();
        assert_eq!(fwer.len(), 4);
        assert!(fwer.iter().all(|&p| p >= 1.0 / 30.0 && p <= 1.0));
        assert_eq!(table.seed, Some(4));
        assert!(table.tfce.is_some());
        assert_eq!(table.header()[2], "tfce_Zval");

        let again =
            run_mediation_analysis(&spec, &outcome, &PathModel::default(), Some(&adj), &options)
                .unwrap();
        assert_eq!(again.fwer, table.fwer);
    }

    #[test]
    fn mediation_rejects_mixed_paths_with_permutations() {
        let (_, outcome) = fixture();
        let model = PathModel { kind: ModelKind::Mixed, ..Default::default() };
        assert!(matches!(
            run_mediation_analysis(
                &mediation_spec(),
                &outcome,
                &model,
                None,
                &PermutationOptions::new(10, Some(1), None),
            ),
            Err(AnalysisError::InvalidOptions { .. })
        ));
    }
}
