//! Errors raised while maximizing a profile log-likelihood.
//!
//! `OptError` covers three sources: invalid optimizer configuration, invalid
//! evaluations reported by a [`LogLikelihood`](super::loglik_optimizer::LogLikelihood)
//! implementation, and backend failures surfaced by `argmin`. Backend errors
//! are flattened into text-carrying variants so nothing argmin-specific
//! crosses the module boundary.
use argmin::core::{ArgminError, Error};

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// No analytic gradient; finite differences are used instead.
    GradientNotImplemented,

    /// Gradient length differs from the parameter length.
    GradientDimMismatch { expected: usize, found: usize },

    /// Non-finite gradient entry.
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- MLEOptions ----
    InvalidTolGrad { tol: f64, reason: &'static str },
    InvalidTolCost { tol: f64, reason: &'static str },
    InvalidMaxIter { max_iter: usize, reason: &'static str },
    /// All of `tol_grad`, `tol_cost` and `max_iter` were `None`.
    NoTolerancesProvided,
    InvalidLineSearch { name: String, reason: &'static str },
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    // ---- Objective ----
    /// Objective returned NaN/±∞.
    NonFiniteCost { value: f64 },
    /// Parameter vector has the wrong length for the model.
    ThetaLengthMismatch { expected: usize, actual: usize },
    /// Parameter entry is NaN/±∞ before evaluation.
    InvalidThetaInput { index: usize, value: f64 },
    /// A matrix required by the objective is not positive definite.
    NotPositiveDefinite { what: &'static str },
    /// Residual quadratic form is non-positive, so the scale is not identified.
    DegenerateResidual { value: f64 },

    // ---- Optimizer outcome ----
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },
    MissingThetaHat,

    // ---- Argmin ----
    InvalidParameter { text: String },
    NotImplemented { text: String },
    NotInitialized { text: String },
    ConditionViolated { text: String },
    CheckPointNotFound { text: String },
    PotentialBug { text: String },
    ImpossibleError { text: String },
    BackendError { text: String },

    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptError::GradientNotImplemented => write!(f, "Analytic gradient not implemented"),
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => write!(f, "No tolerances provided"),
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }
            OptError::NonFiniteCost { value } => write!(f, "Non-finite objective value: {value}"),
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Parameter length mismatch: expected {expected}, actual {actual}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid parameter at index {index}: {value}, must be finite")
            }
            OptError::NotPositiveDefinite { what } => {
                write!(f, "{what} is not positive definite")
            }
            OptError::DegenerateResidual { value } => {
                write!(f, "Residual quadratic form {value} is not strictly positive")
            }
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => write!(f, "Optimizer returned no parameter estimate"),
            OptError::InvalidParameter { text } => write!(f, "Invalid parameter: {text}"),
            OptError::NotImplemented { text } => write!(f, "Not implemented: {text}"),
            OptError::NotInitialized { text } => write!(f, "Not initialized: {text}"),
            OptError::ConditionViolated { text } => write!(f, "Condition violated: {text}"),
            OptError::CheckPointNotFound { text } => write!(f, "Checkpoint not found: {text}"),
            OptError::PotentialBug { text } => write!(f, "Potential bug: {text}"),
            OptError::ImpossibleError { text } => write!(f, "Impossible error: {text}"),
            OptError::BackendError { text } => write!(f, "Backend error: {text}"),
            OptError::UnknownError => write!(f, "Unknown error"),
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(model_err) => return model_err,
            Err(other) => other,
        };
        match original_err.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<OptError> for PyErr {
    fn from(err: OptError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Round-tripping an `OptError` through `argmin::core::Error`.
    // - Mapping of argmin's own error kinds.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A model error raised inside a cost evaluation must come back out of the
    // solver as the same `OptError`, not as opaque backend text.
    //
    // Given
    // -----
    // - `NotPositiveDefinite` boxed into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - Conversion back yields the identical variant.
    fn from_argmin_error_recovers_model_error() {
        let boxed: Error = OptError::NotPositiveDefinite { what: "X'V^-1X" }.into();

        let recovered = OptError::from(boxed);

        assert_eq!(recovered, OptError::NotPositiveDefinite { what: "X'V^-1X" });
    }

    #[test]
    fn from_argmin_error_maps_condition_violated() {
        let boxed: Error = ArgminError::ConditionViolated { text: "line search".into() }.into();

        let mapped = OptError::from(boxed);

        assert_eq!(mapped, OptError::ConditionViolated { text: "line search".into() });
    }
}
