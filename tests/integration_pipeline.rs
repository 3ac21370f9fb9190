//! Integration tests for the in-memory mass-univariate pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path from a simulated design and outcome,
//!   through OLS estimation and permutation FWER, to BH FDR and the CSV
//!   report.
//! - Use a realistic null/effect mix rather than hand-built toy fields.
//!
//! Coverage
//! --------
//! - `analysis::run_mass_univariate` with permutations, with and without
//!   TFCE over a chain adjacency.
//! - `analysis::ResultTable::write_csv_path`.
//!
//! Exclusions
//! ----------
//! - Mixed-model fitting and mediation; those are covered by unit tests.
use ndarray::Array2;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use tfce_stats::{
    analysis::{AnalysisOptions, run_mass_univariate},
    design::{DesignMatrix, OutcomeMatrix, with_intercept},
    tfce::{AdjacencySet, TfceParams},
};

const N: usize = 40;
const M: usize = 100;
const EFFECT: std::ops::Range<usize> = 0..10;

fn simulate(seed: u64) -> (DesignMatrix, OutcomeMatrix) {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let x: Vec<f64> = (0..N).map(|_| normal.sample(&mut rng)).collect();
    let design = with_intercept(N, &[("x".to_string(), x.clone())]).unwrap();
    let y = Array2::from_shape_fn((N, M), |(i, l)| {
        let slope = if EFFECT.contains(&l) { 1.5 } else { 0.0 };
        slope * x[i] + normal.sample(&mut rng)
    });
    (design, OutcomeMatrix::from_values(y).unwrap())
}

#[test]
// Purpose
// -------
// Permutation FWER detects a strong effect and controls false positives.
//
// Given
// -----
// - n = 40, one regressor, 100 locations with a slope of 1.5 at 0..10.
// - P = 1000 free permutations, fixed seed.
//
// Expect
// ------
// - Every effect location has pFWER < 0.05 and pFDR < 0.05.
// - At most one null location has pFWER < 0.05.
// - q ≥ p everywhere and pFWER ≥ 1/P.
fn fwer_separates_effect_from_null_locations() {
    let (design, outcome) = simulate(20);
    let options = AnalysisOptions { permutations: 1000, seed: Some(42), ..Default::default() };

    let table = run_mass_univariate(&design, &outcome, None, None, &options).unwrap();
    let fwer = table.fwer.as_ref().unwrap();

    for l in EFFECT {
        assert!(fwer[[l, 0]] < 0.05, "location {l}: pFWER {}", fwer[[l, 0]]);
        assert!(table.qvalues[[l, 0]] < 0.05);
    }
    let false_hits = (EFFECT.end..M).filter(|&l| fwer[[l, 0]] < 0.05).count();
    assert!(false_hits <= 1, "{false_hits} null locations passed FWER");

    for l in 0..M {
        assert!(table.qvalues[[l, 0]] >= table.pvalues[[l, 0]] - 1e-15);
        assert!(fwer[[l, 0]] >= 1.0 / 1000.0);
    }
}

#[test]
fn tfce_fwer_over_chain_adjacency_favours_contiguous_effect() {
    let (design, outcome) = simulate(21);
    let lists: Vec<Vec<usize>> =
        (0..M).map(|i| if i + 1 < M { vec![i + 1] } else { Vec::new() }).collect();
    let adj = AdjacencySet::from_neighbour_lists(&lists).unwrap();
    let options = AnalysisOptions {
        permutations: 200,
        seed: Some(5),
        tfce: Some(TfceParams::default()),
        ..Default::default()
    };

    let table = run_mass_univariate(&design, &outcome, None, Some(&adj), &options).unwrap();
    let fwer = table.fwer.unwrap();

    let effect_mean: f64 = EFFECT.map(|l| fwer[[l, 0]]).sum::<f64>() / EFFECT.len() as f64;
    let null_mean: f64 =
        (EFFECT.end..M).map(|l| fwer[[l, 0]]).sum::<f64>() / (M - EFFECT.end) as f64;
    assert!(effect_mean < 0.05);
    assert!(null_mean > effect_mean);
}

#[test]
fn report_file_has_one_row_per_location() {
    let (design, outcome) = simulate(22);
    let options = AnalysisOptions { permutations: 20, seed: Some(1), ..Default::default() };
    let table = run_mass_univariate(&design, &outcome, None, None, &options).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    table.write_csv_path(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("ROI,tval_x,pval_x,pFDR_x,pFWER_x"));
    assert_eq!(lines.count(), M);
}
