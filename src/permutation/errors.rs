//! Errors for the permutation engine and null-distribution bookkeeping.
use crate::{
    design::DesignError, estimation::EstimationError, mediation::MediationError, tfce::TfceError,
};
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type PermutationResult<T> = Result<T, PermutationError>;

/// PermutationError — invalid inputs, ranges or null segments.
///
/// Variants
/// --------
/// - `NoContrasts`
///   The design has only the intercept; there is nothing to test.
/// - `InvalidRange { start, end }`
///   Permutation indices start at 1 and ranges must be non-empty.
/// - `SegmentGap { expected, found }` / `SegmentOverlap { expected, found }`
///   Concatenated null segments do not tile the index range exactly.
/// - `ShapeMismatch { what, expected, found }`
///   Two null distributions or fields disagree in size.
/// - `EmptyNull`
///   A null distribution with zero permutations cannot be finalized.
/// - `Design`, `Estimation`, `Mediation`, `Tfce`
///   Wrapped component errors.
#[derive(Debug, Clone, PartialEq)]
pub enum PermutationError {
    NoContrasts,
    InvalidRange { start: usize, end: usize },
    SegmentGap { expected: usize, found: usize },
    SegmentOverlap { expected: usize, found: usize },
    ShapeMismatch { what: &'static str, expected: usize, found: usize },
    EmptyNull,
    Design(DesignError),
    Estimation(EstimationError),
    Mediation(MediationError),
    Tfce(TfceError),
}

impl std::error::Error for PermutationError {}

impl std::fmt::Display for PermutationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermutationError::NoContrasts => {
                write!(f, "Design has no regressor besides the intercept.")
            }
            PermutationError::InvalidRange { start, end } => {
                write!(f, "Invalid permutation range {start}..={end}; indices start at 1.")
            }
            PermutationError::SegmentGap { expected, found } => write!(
                f,
                "Null segments leave a gap: expected permutation {expected}, next segment starts at {found}."
            ),
            PermutationError::SegmentOverlap { expected, found } => write!(
                f,
                "Null segments overlap: expected permutation {expected}, next segment starts at {found}."
            ),
            PermutationError::ShapeMismatch { what, expected, found } => {
                write!(f, "Shape mismatch for {what}: expected {expected}, found {found}.")
            }
            PermutationError::EmptyNull => write!(f, "Null distribution holds no permutations."),
            PermutationError::Design(e) => write!(f, "{e}"),
            PermutationError::Estimation(e) => write!(f, "{e}"),
            PermutationError::Mediation(e) => write!(f, "{e}"),
            PermutationError::Tfce(e) => write!(f, "{e}"),
        }
    }
}

impl From<DesignError> for PermutationError {
    fn from(err: DesignError) -> Self {
        PermutationError::Design(err)
    }
}

impl From<EstimationError> for PermutationError {
    fn from(err: EstimationError) -> Self {
        PermutationError::Estimation(err)
    }
}

impl From<MediationError> for PermutationError {
    fn from(err: MediationError) -> Self {
        PermutationError::Mediation(err)
    }
}

impl From<TfceError> for PermutationError {
    fn from(err: TfceError) -> Self {
        PermutationError::Tfce(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<PermutationError> for PyErr {
    fn from(err: PermutationError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
