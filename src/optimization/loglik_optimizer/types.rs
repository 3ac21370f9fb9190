//! Numeric aliases for the profile-likelihood optimizer.
//!
//! The optimizer layer talks in terms of [`Theta`], [`Grad`] and [`Cost`];
//! only this file names the concrete containers.
use ndarray::Array1;
use std::collections::HashMap;

/// Unconstrained parameter vector (for variance components: log ratios).
pub type Theta = Array1<f64>;

/// Gradient with the same shape as [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar cost `c(θ) = -ℓ(θ)`.
pub type Cost = f64;

/// Function-evaluation counters as reported by argmin (`"cost_count"`, ...).
pub type FnEvalMap = HashMap<String, u64>;

/// Default L-BFGS history size.
pub const DEFAULT_LBFGS_MEM: usize = 7;
