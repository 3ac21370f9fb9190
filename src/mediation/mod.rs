//! mediation — indirect-effect tests at every location.
//!
//! Purpose
//! -------
//! Test whether a predictor's effect is transmitted through an intermediate
//! variable, with imaging data in the role selected by [`MediationType`],
//! by combining two path t-statistics per location into a z-statistic.
//!
//! Key behaviors
//! -------------
//! - [`IndirectAlgorithm`] is a closed choice of variance approximation,
//!   each with its own domain check (only Goodman can fail, and then only
//!   at the offending locations).
//! - [`run_mediation`] runs both paths with OLS or the mixed model and
//!   returns z, two-sided p and BH q per location.
//!
//! Invariants & assumptions
//! ------------------------
//! - Unknown type codes and algorithm names are fatal parse errors raised
//!   before any estimation.

pub mod combiner;
pub mod errors;
pub mod paths;

pub use self::combiner::{IndirectAlgorithm, IndirectField};
pub use self::errors::{MediationError, MediationResult};
pub use self::paths::{
    MediationInputs, MediationOutcome, MediationSpec, MediationType, PathModel, run_mediation,
};

pub mod prelude {
    pub use super::combiner::IndirectAlgorithm;
    pub use super::errors::{MediationError, MediationResult};
    pub use super::paths::{MediationInputs, MediationSpec, MediationType, PathModel, run_mediation};
}
