//! Errors for adjacency construction and TFCE.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type TfceResult<T> = Result<T, TfceError>;

/// TfceError — invalid adjacency, weights, parameters or fields.
///
/// Variants
/// --------
/// - `NeighbourOutOfRange { location, neighbour, len }`
///   An adjacency entry or face vertex points past the location count.
/// - `LengthMismatch { what, expected, found }`
///   A field, mask or density vector has the wrong length.
/// - `InvalidDensity { index, value }`
///   Density weights must be finite and strictly positive.
/// - `InvalidParameter { name, value, reason }`
///   A TFCE exponent or step is out of range.
/// - `InvalidConnectivity { value }`
///   Voxel connectivity other than 6, 18 or 26.
#[derive(Debug, Clone, PartialEq)]
pub enum TfceError {
    NeighbourOutOfRange { location: usize, neighbour: usize, len: usize },
    LengthMismatch { what: &'static str, expected: usize, found: usize },
    InvalidDensity { index: usize, value: f64 },
    InvalidParameter { name: &'static str, value: f64, reason: &'static str },
    InvalidConnectivity { value: u8 },
}

impl std::error::Error for TfceError {}

impl std::fmt::Display for TfceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TfceError::NeighbourOutOfRange { location, neighbour, len } => write!(
                f,
                "Location {location} lists neighbour {neighbour}, but only {len} locations exist."
            ),
            TfceError::LengthMismatch { what, expected, found } => {
                write!(f, "Length mismatch for {what}: expected {expected}, found {found}.")
            }
            TfceError::InvalidDensity { index, value } => {
                write!(f, "Density weight {value} at location {index} must be finite and > 0.")
            }
            TfceError::InvalidParameter { name, value, reason } => {
                write!(f, "Invalid TFCE parameter {name} = {value}: {reason}")
            }
            TfceError::InvalidConnectivity { value } => {
                write!(f, "Voxel connectivity must be 6, 18 or 26, got {value}.")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<TfceError> for PyErr {
    fn from(err: TfceError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
