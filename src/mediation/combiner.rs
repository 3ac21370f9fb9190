//! Indirect-effect z-statistics from path t-statistics.
//!
//! With path t-values `ta`, `tb` the three delta-method variants are
//!
//! - Aroian:  `z = ta·tb / √(ta² + tb² + 1)`
//! - Sobel:   `z = ta·tb / √(ta² + tb²)`
//! - Goodman: `z = ta·tb / √(ta² + tb² − 1)`
//!
//! which are the usual `1 / √(1/tb² + 1/ta² ± 1/(ta²tb²))` forms multiplied
//! through by `|ta·tb|`, with the sign of `ta·tb` kept. A zero path gives
//! `z = 0`; a NaN path gives NaN. Goodman's radicand can be non-positive:
//! [`IndirectAlgorithm::z`] reports that as a domain error, while
//! [`IndirectAlgorithm::combine`] marks the location as failed (NaN z) and
//! keeps going.
use crate::mediation::errors::{MediationError, MediationResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndirectAlgorithm {
    #[default]
    Aroian,
    Sobel,
    Goodman,
}

impl FromStr for IndirectAlgorithm {
    type Err = MediationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aroian" => Ok(IndirectAlgorithm::Aroian),
            "sobel" => Ok(IndirectAlgorithm::Sobel),
            "goodman" => Ok(IndirectAlgorithm::Goodman),
            _ => Err(MediationError::InvalidAlgorithm { name: s.to_string() }),
        }
    }
}

impl IndirectAlgorithm {
    fn correction(self) -> f64 {
        match self {
            IndirectAlgorithm::Aroian => 1.0,
            IndirectAlgorithm::Sobel => 0.0,
            IndirectAlgorithm::Goodman => -1.0,
        }
    }

    /// z-statistic for one location.
    ///
    /// Errors
    /// ------
    /// - `MediationError::GoodmanDomain` (with `index = 0`) when the
    ///   Goodman radicand is not positive.
    pub fn z(self, ta: f64, tb: f64) -> MediationResult<f64> {
        let product = ta * tb;
        if product == 0.0 {
            return Ok(0.0);
        }
        if product.is_nan() {
            return Ok(f64::NAN);
        }
        let radicand = ta * ta + tb * tb + self.correction();
        if radicand <= 0.0 {
            return Err(MediationError::GoodmanDomain { index: 0, radicand });
        }
        Ok(product / radicand.sqrt())
    }

    /// z-statistics for aligned path fields.
    ///
    /// A location whose Goodman radicand is not positive gets a NaN z and
    /// is listed in [`IndirectField::failures`] with its radicand.
    ///
    /// Errors
    /// ------
    /// - `MediationError::LengthMismatch` when `tb` has a different length.
    pub fn combine(self, ta: &[f64], tb: &[f64]) -> MediationResult<IndirectField> {
        if ta.len() != tb.len() {
            return Err(MediationError::LengthMismatch {
                what: "path B t-values",
                expected: ta.len(),
                found: tb.len(),
            });
        }
        let mut field = IndirectField { z: Vec::with_capacity(ta.len()), failures: Vec::new() };
        for (index, (&a, &b)) in ta.iter().zip(tb).enumerate() {
            match self.z(a, b) {
                Ok(z) => field.z.push(z),
                Err(MediationError::GoodmanDomain { radicand, .. }) => {
                    field.z.push(f64::NAN);
                    field.failures.push((index, radicand));
                }
                Err(other) => return Err(other),
            }
        }
        Ok(field)
    }
}

/// Combined z-field plus the locations where the variance was undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectField {
    pub z: Vec<f64>,
    /// `(location, radicand)` for every non-positive Goodman radicand.
    pub failures: Vec<(usize, f64)>,
}
