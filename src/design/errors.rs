//! Errors for design construction and input validation.
//!
//! Every variant here is fatal: it is raised while assembling the design,
//! outcome, or grouping inputs and before any statistic is computed.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for design construction paths.
pub type DesignResult<T> = Result<T, DesignError>;

/// DesignError — validation failures for designs, outcomes and group labels.
///
/// Variants
/// --------
/// - `EmptyDesign`
///   No observations or no regressors were supplied.
/// - `MissingColumn { name }`
///   A named column requested from a [`ColumnSource`](super::ColumnSource)
///   does not exist.
/// - `MismatchedRows { what, expected, found }`
///   Two inputs that must align row-for-row disagree in length.
/// - `NonFiniteValue { what, row, col, value }`
///   A NaN/±∞ entry; missing values must be removed upstream.
/// - `MissingIntercept { row, value }`
///   Column 0 is not all ones; statistics are reported for columns `1..k`
///   on the assumption that column 0 is the intercept.
/// - `TooFewObservations { n, k }`
///   The design has no residual degrees of freedom (`n <= k`).
/// - `NameCountMismatch { expected, found }`
///   Regressor or location names do not match the matrix width.
/// - `ZeroVariance { name }`
///   A column requested for standardisation is constant.
/// - `EmptyGroupList`
///   A composite grouping key was requested from zero factors.
/// - `UnknownOption { what, value, expected }`
///   A model selection string (estimator, likelihood criterion) is not one
///   of the accepted names.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignError {
    EmptyDesign,
    MissingColumn { name: String },
    MismatchedRows { what: &'static str, expected: usize, found: usize },
    NonFiniteValue { what: &'static str, row: usize, col: usize, value: f64 },
    MissingIntercept { row: usize, value: f64 },
    TooFewObservations { n: usize, k: usize },
    NameCountMismatch { expected: usize, found: usize },
    ZeroVariance { name: String },
    EmptyGroupList,
    UnknownOption { what: &'static str, value: String, expected: &'static str },
}

impl std::error::Error for DesignError {}

impl std::fmt::Display for DesignError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesignError::EmptyDesign => {
                write!(f, "Design must contain at least one observation and one regressor.")
            }
            DesignError::MissingColumn { name } => {
                write!(f, "Required column '{name}' was not found.")
            }
            DesignError::MismatchedRows { what, expected, found } => {
                write!(f, "Row count mismatch for {what}: expected {expected}, found {found}.")
            }
            DesignError::NonFiniteValue { what, row, col, value } => {
                write!(f, "Non-finite value {value} in {what} at row {row}, column {col}.")
            }
            DesignError::MissingIntercept { row, value } => write!(
                f,
                "Design column 0 must be the intercept (all ones); found {value} at row {row}."
            ),
            DesignError::TooFewObservations { n, k } => {
                write!(f, "Need more observations than regressors: n = {n}, k = {k}.")
            }
            DesignError::NameCountMismatch { expected, found } => {
                write!(f, "Expected {expected} names, found {found}.")
            }
            DesignError::ZeroVariance { name } => {
                write!(f, "Column '{name}' has zero variance and cannot be standardised.")
            }
            DesignError::EmptyGroupList => {
                write!(f, "At least one grouping column is required.")
            }
            DesignError::UnknownOption { what, value, expected } => {
                write!(f, "Unknown {what} '{value}' (expected {expected}).")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<DesignError> for PyErr {
    fn from(err: DesignError) -> PyErr {
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
    // - Payload embedding in `Display` messages.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure the offending column name reaches the message.
    //
    // Given
    // -----
    // - `DesignError::MissingColumn { name: "age" }`.
    //
    // Expect
    // ------
    // - The rendered message contains "age".
    fn missing_column_message_names_the_column() {
        let err = DesignError::MissingColumn { name: "age".to_string() };

        let msg = err.to_string();

        assert!(msg.contains("age"));
    }

    #[test]
    fn mismatched_rows_message_reports_both_counts() {
        let err = DesignError::MismatchedRows { what: "outcome", expected: 40, found: 39 };

        let msg = err.to_string();

        assert!(msg.contains("40") && msg.contains("39") && msg.contains("outcome"));
    }
}
