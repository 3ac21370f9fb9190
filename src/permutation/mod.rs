//! permutation — maximum-statistic null distributions by relabelling.
//!
//! Purpose
//! -------
//! Estimate the distribution of the field-wide maximum statistic under the
//! null hypothesis by permuting design rows (or, for mediation, the
//! non-imaging inputs) within their exchangeability structure, so observed
//! statistics can be given FWER-corrected p-values.
//!
//! Key behaviors
//! -------------
//! - [`Exchangeability`] draws free or within-block relabellings.
//! - [`PermutationEngine`] runs any inclusive range of permutation indices
//!   in parallel and returns a [`NullDistribution`] segment.
//! - Segments from independent workers are stitched with
//!   [`NullDistribution::concat`], combined across surfaces with
//!   [`NullDistribution::merge_max`] and sorted by
//!   [`NullDistribution::finalize`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Every permutation is a pure function of `(seed, index)`.
//! - A permutation either completes or is absent from the null; there is
//!   no partial column.
//!
//! Downstream usage
//! ----------------
//! - `store` persists segments per surface and range.
//! - `analysis` turns the finalized null into `pFWER` columns.

pub mod engine;
pub mod errors;
pub mod exchangeability;
pub mod null;
pub mod rng;

pub use self::engine::{ObservedField, PermutationEngine};
pub use self::errors::{PermutationError, PermutationResult};
pub use self::exchangeability::Exchangeability;
pub use self::null::{NullDistribution, SortedNull};
pub use self::rng::{counter_rng_seed, permutation_rng, seed_from_clock};

use crate::tfce::TfceParams;
use serde::{Deserialize, Serialize};

/// Permutation settings.
///
/// - `count`: number of permutations `P` (0 disables FWER).
/// - `seed`: base seed; `None` draws one from the clock.
/// - `tfce`: enhance each permuted field before taking maxima.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PermutationOptions {
    pub count: usize,
    pub seed: Option<u64>,
    pub tfce: Option<TfceParams>,
}

impl PermutationOptions {
    pub fn new(count: usize, seed: Option<u64>, tfce: Option<TfceParams>) -> Self {
        Self { count, seed, tfce }
    }

    /// The configured seed, or a fresh clock-derived one.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(seed_from_clock)
    }
}

pub mod prelude {
    pub use super::PermutationOptions;
    pub use super::engine::PermutationEngine;
    pub use super::errors::{PermutationError, PermutationResult};
    pub use super::exchangeability::Exchangeability;
    pub use super::null::{NullDistribution, SortedNull};
}
