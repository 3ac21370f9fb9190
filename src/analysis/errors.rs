//! Top-level error for end-to-end analyses and report writing.
use crate::{
    design::DesignError, estimation::EstimationError, mediation::MediationError,
    permutation::PermutationError, store::StoreError, tfce::TfceError,
};
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// AnalysisError — any failure surfaced by a pipeline entry point.
///
/// Variants
/// --------
/// - `InvalidOptions { text }`: an option combination that cannot run
///   (mixed model with permutations, TFCE without adjacency).
/// - `Report { text }`: CSV or I/O failure while writing a table.
/// - One wrapping variant per component error.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    InvalidOptions { text: String },
    Report { text: String },
    Design(DesignError),
    Estimation(EstimationError),
    Tfce(TfceError),
    Permutation(PermutationError),
    Mediation(MediationError),
    Store(StoreError),
}

impl std::error::Error for AnalysisError {}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::InvalidOptions { text } => write!(f, "Invalid analysis options: {text}"),
            AnalysisError::Report { text } => write!(f, "Failed to write report: {text}"),
            AnalysisError::Design(e) => write!(f, "{e}"),
            AnalysisError::Estimation(e) => write!(f, "{e}"),
            AnalysisError::Tfce(e) => write!(f, "{e}"),
            AnalysisError::Permutation(e) => write!(f, "{e}"),
            AnalysisError::Mediation(e) => write!(f, "{e}"),
            AnalysisError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl From<DesignError> for AnalysisError {
    fn from(err: DesignError) -> Self {
        AnalysisError::Design(err)
    }
}

impl From<EstimationError> for AnalysisError {
    fn from(err: EstimationError) -> Self {
        AnalysisError::Estimation(err)
    }
}

impl From<TfceError> for AnalysisError {
    fn from(err: TfceError) -> Self {
        AnalysisError::Tfce(err)
    }
}

impl From<PermutationError> for AnalysisError {
    fn from(err: PermutationError) -> Self {
        AnalysisError::Permutation(err)
    }
}

impl From<MediationError> for AnalysisError {
    fn from(err: MediationError) -> Self {
        AnalysisError::Mediation(err)
    }
}

impl From<StoreError> for AnalysisError {
    fn from(err: StoreError) -> Self {
        AnalysisError::Store(err)
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(err: csv::Error) -> Self {
        AnalysisError::Report { text: err.to_string() }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::Report { text: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl From<AnalysisError> for PyErr {
    fn from(err: AnalysisError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
