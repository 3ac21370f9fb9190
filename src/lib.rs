//! tfce_stats — mass-univariate neuroimaging statistics with permutation
//! inference and threshold-free cluster enhancement.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the batched OLS statistic and the FDR step to Python via the
//! `_tfce_stats` extension module.
//!
//! Key behaviors
//! -------------
//! - `design` builds design, outcome and grouping inputs.
//! - `estimation` computes per-location t-statistics (OLS or random
//!   intercept mixed model) and raw p-values.
//! - `tfce` enhances statistic fields over a mesh or voxel adjacency.
//! - `permutation` builds maximum-statistic null distributions, `correction`
//!   turns them into FWER p-values and applies BH FDR.
//! - `mediation` runs the two-path indirect-effect test.
//! - `store` persists state so permutation ranges can run as independent
//!   jobs, and `analysis` chains everything into result tables.
//!
//! Invariants & assumptions
//! ------------------------
//! - The library never installs a `tracing` subscriber.
//! - This file performs only FFI glue and error mapping; all numerical work
//!   lives in the inner modules.
//!
//! Conventions
//! -----------
//! - Statistic matrices are k×m (regressors × locations) inside the crate
//!   and m×c (locations × contrasts) in result tables.

pub mod analysis;
pub mod correction;
pub mod design;
pub mod estimation;
pub mod mediation;
pub mod optimization;
pub mod permutation;
pub mod store;
pub mod tfce;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    estimation::OlsEstimator,
    utils::{extract_f64_matrix, extract_f64_vec},
};

/// OLS t-statistics for every column of `y`.
///
/// Parameters
/// ----------
/// - `x`: n×k design including any intercept column.
/// - `y`: n×m outcomes.
///
/// Returns
/// -------
/// k×m float64 array of t-statistics.
///
/// Errors
/// ------
/// - `ValueError` for misaligned rows or a rank-deficient design.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(x, y, /)")]
fn ols_tvalues<'py>(
    py: Python<'py>, x: &Bound<'py, PyAny>, y: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let x = extract_f64_matrix(x)?;
    let y = extract_f64_matrix(y)?;
    if x.nrows() != y.nrows() {
        return Err(pyo3::exceptions::PyValueError::new_err(format!(
            "x has {} rows but y has {}",
            x.nrows(),
            y.nrows()
        )));
    }
    let t = OlsEstimator::from_values(&x)?.tvalues(&y)?;
    Ok(t.into_pyarray(py))
}

/// Benjamini–Hochberg q-values; NaN p-values count as 1.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(p, /)")]
fn fdr_bh<'py>(py: Python<'py>, p: &Bound<'py, PyAny>) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let p = extract_f64_vec(p)?;
    Ok(correction::fdr_bh(&p).into_pyarray(py))
}

#[cfg(feature = "python-bindings")]
#[pymodule]
fn _tfce_stats<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ols_tvalues, m)?)?;
    m.add_function(wrap_pyfunction!(fdr_bh, m)?)?;
    Ok(())
}
