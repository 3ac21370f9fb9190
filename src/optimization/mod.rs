//! optimization — L-BFGS maximization of profile log-likelihoods.
//!
//! Purpose
//! -------
//! Host the argmin-backed optimizer used by the mixed-effects estimator to
//! find variance components, together with the single error surface
//! ([`errors::OptError`]) every optimizer path reports through.
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing `-ℓ(θ)`; outcomes report `ℓ`.
//! - Public entry points return [`errors::OptResult`]; raw argmin errors
//!   never cross this boundary.
//! - No logging happens here beyond an optional `debug!` of the starting
//!   point; per-location reporting belongs to the caller.

pub mod errors;
pub mod loglik_optimizer;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
}
