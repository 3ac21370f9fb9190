//! Errors for mediation path construction and indirect-effect tests.
use crate::{design::DesignError, estimation::EstimationError};
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type MediationResult<T> = Result<T, MediationError>;

/// MediationError — invalid selections, domain violations and wrapped
/// estimation failures.
///
/// Variants
/// --------
/// - `InvalidMediationType { code }`: not one of `I`, `M`, `Y`.
/// - `InvalidAlgorithm { name }`: not one of `aroian`, `sobel`, `goodman`.
/// - `GoodmanDomain { index, radicand }`: `ta² + tb² − 1 <= 0`, so the
///   Goodman variance is not positive. Raised for a single location by
///   `IndirectAlgorithm::z`; field-wide runs record it per location
///   instead.
/// - `LengthMismatch { what, expected, found }`: path fields or inputs of
///   different lengths.
/// - `Design`, `Estimation`: wrapped component errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MediationError {
    InvalidMediationType { code: String },
    InvalidAlgorithm { name: String },
    GoodmanDomain { index: usize, radicand: f64 },
    LengthMismatch { what: &'static str, expected: usize, found: usize },
    Design(DesignError),
    Estimation(EstimationError),
}

impl std::error::Error for MediationError {}

impl std::fmt::Display for MediationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediationError::InvalidMediationType { code } => {
                write!(f, "Invalid mediation type '{code}' (expected I, M or Y).")
            }
            MediationError::InvalidAlgorithm { name } => write!(
                f,
                "Invalid indirect-effect algorithm '{name}' (expected aroian, sobel or goodman)."
            ),
            MediationError::GoodmanDomain { index, radicand } => write!(
                f,
                "Goodman variance is not positive at location {index} (ta² + tb² − 1 = {radicand})."
            ),
            MediationError::LengthMismatch { what, expected, found } => {
                write!(f, "Length mismatch for {what}: expected {expected}, found {found}.")
            }
            MediationError::Design(e) => write!(f, "{e}"),
            MediationError::Estimation(e) => write!(f, "{e}"),
        }
    }
}

impl From<DesignError> for MediationError {
    fn from(err: DesignError) -> Self {
        MediationError::Design(err)
    }
}

impl From<EstimationError> for MediationError {
    fn from(err: EstimationError) -> Self {
        MediationError::Estimation(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<MediationError> for PyErr {
    fn from(err: MediationError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
