//! loglik_optimizer — argmin-backed maximization of profile log-likelihoods.
//!
//! Purpose
//! -------
//! Maximize a low-dimensional log-likelihood `ℓ(θ)` such as the restricted
//! likelihood of a variance-component model, profiled over the fixed effects
//! and residual scale. Callers implement [`LogLikelihood`] and call
//! [`maximize`].
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ` into the argmin cost `-ℓ`, with a
//!   central → forward finite-difference fallback when no gradient exists.
//! - [`solver::solve`] builds L-BFGS with More–Thuente or Hager–Zhang line
//!   search, runs it and returns an [`OptimOutcome`].
//! - [`validation`] holds the shared tolerance / parameter / output checks.
//!
//! Invariants & assumptions
//! ------------------------
//! - `θ` lives in unconstrained space; constrained quantities (variance
//!   ratios) are mapped by the model, not here.
//! - Model errors raised during a cost evaluation travel through argmin and
//!   are recovered as the original [`OptError`](crate::optimization::errors::OptError).
//!
//! Testing notes
//! -------------
//! - Unit tests cover sign conventions, finite-difference fallback, solver
//!   construction and convergence on toy concave objectives. The mixed
//!   model tests in `estimation::mixed` exercise the layer on real
//!   likelihoods.

pub mod adapter;
pub mod api;
pub mod solver;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
