//! Shared helpers: NaN sentinels and Python argument extraction.
//!
//! NaN statistics and p-values must never reach a sort, a rank lookup or a
//! maximum. [`nan_to_zero`] is applied to statistics and [`nan_to_one`] to
//! raw p-values before any correction step.
use ndarray::Array2;

#[cfg(feature = "python-bindings")]
use numpy::{PyArrayMethods, PyReadonlyArray1, PyReadonlyArray2};
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

/// Replace NaN with `0.0`.
#[inline]
pub fn nan_to_zero(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v }
}

/// Replace NaN with `1.0`.
#[inline]
pub fn nan_to_one(v: f64) -> f64 {
    if v.is_nan() { 1.0 } else { v }
}

/// Element-wise [`nan_to_zero`].
pub fn sanitize_statistics(a: &Array2<f64>) -> Array2<f64> {
    a.mapv(nan_to_zero)
}

/// Element-wise [`nan_to_one`].
pub fn sanitize_pvalues(a: &Array2<f64>) -> Array2<f64> {
    a.mapv(nan_to_one)
}

/// Accept a 1-D float64 ndarray, a pandas Series (via `to_numpy`), or any
/// sequence of floats.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_vec(raw: &Bound<'_, PyAny>) -> PyResult<Vec<f64>> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray1<f64>>() {
        return Ok(arr.as_array().to_vec());
    }
    if let Ok(obj) = raw.call_method0("to_numpy") {
        if let Ok(arr) = obj.extract::<PyReadonlyArray1<f64>>() {
            return Ok(arr.as_array().to_vec());
        }
    }
    raw.extract::<Vec<f64>>().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })
}

/// Accept a 2-D float64 ndarray or a pandas DataFrame (via `to_numpy`).
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix(raw: &Bound<'_, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr.as_array().to_owned());
    }
    if let Ok(obj) = raw.call_method0("to_numpy") {
        if let Ok(arr) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(arr.as_array().to_owned());
        }
    }
    Err(PyTypeError::new_err("expected a 2-D numpy.ndarray or pandas.DataFrame of float64"))
}
