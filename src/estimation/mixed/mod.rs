//! Random-intercept mixed-effects estimation, one location at a time.
//!
//! Purpose
//! -------
//! Fit `y = Xβ + u_group + ε` independently for every outcome column and
//! report fixed-effect Wald statistics, in parallel across locations.
//!
//! Key behaviors
//! -------------
//! - The variance ratio is found by maximizing the profiled REML (default)
//!   or ML likelihood through `optimization::loglik_optimizer::maximize`;
//!   fixed effects follow by GLS at the optimum.
//! - Every location yields a [`LocationFit`]. Failures (optimizer error,
//!   exhausted iterations, degenerate residuals) are zeroed in the field,
//!   logged with the location index and returned in
//!   [`MixedFieldFit::failures`]; they never abort the field.
//!
//! Invariants & assumptions
//! ------------------------
//! - Blocks come from [`GroupLabels`](crate::design::GroupLabels); at least
//!   two are required.
//! - Design sums are computed once per model; each location only costs
//!   O(n·k) plus a scalar optimization over k×k solves.

pub mod fit;
pub mod model;

pub use self::fit::{FitFailure, FixedEffects, LocationFit, MixedFieldFit, MixedModel};
pub use self::model::{Criterion, GroupMoments, LocationMoments, ProfileLikelihood};

use crate::optimization::loglik_optimizer::MLEOptions;
use serde::{Deserialize, Serialize};

/// Mixed-model configuration.
///
/// - `criterion`: REML (default) or ML.
/// - `mle`: optimizer tolerances and line search.
/// - `init_log_ratio`: starting `ln(σᵤ²/σₑ²)`; `0.0` starts at equal
///   variances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedOptions {
    pub criterion: Criterion,
    pub mle: MLEOptions,
    pub init_log_ratio: f64,
}

impl Default for MixedOptions {
    fn default() -> Self {
        Self { criterion: Criterion::Reml, mle: MLEOptions::default(), init_log_ratio: 0.0 }
    }
}
