//! Errors for persisted out-of-core state.
use crate::{
    design::DesignError, estimation::EstimationError, mediation::MediationError,
    permutation::PermutationError, tfce::TfceError,
};
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};
use std::path::Path;

pub type StoreResult<T> = Result<T, StoreError>;

/// StoreError — filesystem, format and coverage failures.
///
/// Variants
/// --------
/// - `Io { path, text }`: reading or writing `path` failed.
/// - `Serialization { path, text }`: bincode/JSON encoding or decoding failed.
/// - `Corruption { path, text }`: bad magic, version or checksum.
/// - `MissingUpstreamState { what, path }`: a worker asked for state that was
///   never persisted. Workers never recompute it.
/// - `IncompleteNull { surface, expected, found }`: segments for a surface
///   do not cover `1..=P` exactly.
/// - `InvalidConfig { text }`: a configuration or surface layout that cannot
///   be run.
/// - `Design`, `Estimation`, `Mediation`, `Permutation`, `Tfce`: wrapped
///   component errors.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Io { path: String, text: String },
    Serialization { path: String, text: String },
    Corruption { path: String, text: String },
    MissingUpstreamState { what: &'static str, path: String },
    IncompleteNull { surface: usize, expected: String, found: String },
    InvalidConfig { text: String },
    Design(DesignError),
    Estimation(EstimationError),
    Mediation(MediationError),
    Permutation(PermutationError),
    Tfce(TfceError),
}

impl StoreError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        StoreError::Io { path: path.display().to_string(), text: err.to_string() }
    }

    pub(crate) fn serialization(path: &Path, err: impl std::fmt::Display) -> Self {
        StoreError::Serialization { path: path.display().to_string(), text: err.to_string() }
    }

    pub(crate) fn corruption(path: &Path, text: impl Into<String>) -> Self {
        StoreError::Corruption { path: path.display().to_string(), text: text.into() }
    }
}

impl std::error::Error for StoreError {}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io { path, text } => write!(f, "I/O error on '{path}': {text}"),
            StoreError::Serialization { path, text } => {
                write!(f, "Serialization error on '{path}': {text}")
            }
            StoreError::Corruption { path, text } => write!(f, "Corrupt state file '{path}': {text}"),
            StoreError::MissingUpstreamState { what, path } => write!(
                f,
                "Missing upstream state: {what} not found at '{path}'. Run the preparation step first."
            ),
            StoreError::IncompleteNull { surface, expected, found } => write!(
                f,
                "Null distribution for surface {surface} is incomplete: expected {expected}, found {found}."
            ),
            StoreError::InvalidConfig { text } => write!(f, "Invalid analysis configuration: {text}"),
            StoreError::Design(e) => write!(f, "{e}"),
            StoreError::Estimation(e) => write!(f, "{e}"),
            StoreError::Mediation(e) => write!(f, "{e}"),
            StoreError::Permutation(e) => write!(f, "{e}"),
            StoreError::Tfce(e) => write!(f, "{e}"),
        }
    }
}

impl From<DesignError> for StoreError {
    fn from(err: DesignError) -> Self {
        StoreError::Design(err)
    }
}

impl From<EstimationError> for StoreError {
    fn from(err: EstimationError) -> Self {
        StoreError::Estimation(err)
    }
}

impl From<MediationError> for StoreError {
    fn from(err: MediationError) -> Self {
        StoreError::Mediation(err)
    }
}

impl From<PermutationError> for StoreError {
    fn from(err: PermutationError) -> Self {
        StoreError::Permutation(err)
    }
}

impl From<TfceError> for StoreError {
    fn from(err: TfceError) -> Self {
        StoreError::Tfce(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<StoreError> for PyErr {
    fn from(err: StoreError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
