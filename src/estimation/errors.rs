//! Errors for field-wide statistic estimation.
//!
//! These are fatal for a whole pass. Per-location mixed-model failures are
//! not errors at this level; they are carried as
//! [`FitFailure`](super::mixed::FitFailure) values inside a successful
//! field result.
use crate::{design::errors::DesignError, optimization::errors::OptError};

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type EstimationResult<T> = Result<T, EstimationError>;

/// EstimationError — failures that stop a statistic pass.
///
/// Variants
/// --------
/// - `RankDeficient { min_eigenvalue, tolerance }`
///   `XᵀX` has an eigenvalue at or below the rejection tolerance.
/// - `DimensionMismatch { what, expected, found }`
///   An input does not align with the design.
/// - `NoResidualDf { n, k }`
///   `n <= k`, so no residual variance can be estimated.
/// - `TooFewGroups { found }`
///   A random-intercept model was requested with fewer than two blocks.
/// - `Design(DesignError)` / `Optimizer(OptError)`
///   Wrapped errors from the neighbouring layers.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimationError {
    RankDeficient { min_eigenvalue: f64, tolerance: f64 },
    DimensionMismatch { what: &'static str, expected: usize, found: usize },
    NoResidualDf { n: usize, k: usize },
    TooFewGroups { found: usize },
    Design(DesignError),
    Optimizer(OptError),
}

impl std::error::Error for EstimationError {}

impl std::fmt::Display for EstimationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimationError::RankDeficient { min_eigenvalue, tolerance } => write!(
                f,
                "Design is rank deficient: smallest eigenvalue of X'X is {min_eigenvalue:e} (tolerance {tolerance:e})."
            ),
            EstimationError::DimensionMismatch { what, expected, found } => {
                write!(f, "Dimension mismatch for {what}: expected {expected}, found {found}.")
            }
            EstimationError::NoResidualDf { n, k } => {
                write!(f, "No residual degrees of freedom: n = {n}, k = {k}.")
            }
            EstimationError::TooFewGroups { found } => {
                write!(f, "A random-intercept model needs at least two groups, found {found}.")
            }
            EstimationError::Design(err) => write!(f, "Design error: {err}"),
            EstimationError::Optimizer(err) => write!(f, "Optimizer error: {err}"),
        }
    }
}

impl From<DesignError> for EstimationError {
    fn from(err: DesignError) -> Self {
        EstimationError::Design(err)
    }
}

impl From<OptError> for EstimationError {
    fn from(err: OptError) -> Self {
        EstimationError::Optimizer(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<EstimationError> for PyErr {
    fn from(err: EstimationError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
