//! design — validated regression inputs for mass-univariate analyses.
//!
//! Purpose
//! -------
//! Hold the three inputs every statistic pass consumes: the design matrix
//! `X`, the outcome matrix `Y`, and optional exchangeability-block labels.
//! Construction is the only place input validation happens; downstream
//! modules assume these invariants.
//!
//! Key behaviors
//! -------------
//! - [`DesignMatrix`] / [`OutcomeMatrix`] wrap `ndarray` matrices with shape,
//!   finiteness and naming guards.
//! - [`DesignBuilder`] assembles a design from named columns of any
//!   [`ColumnSource`], prepending an intercept and optionally adding
//!   standardised columns and a two-way interaction.
//! - [`GroupLabels`] assigns rows to blocks, optionally from a composite of
//!   several categorical factors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Column 0 of every design is the intercept.
//! - Inputs are complete-case; NaN/±∞ is a fatal [`DesignError`].
//! - Full column rank is not checked here (see `estimation`).
//!
//! Downstream usage
//! ----------------
//! - `estimation`, `permutation` and `mediation` consume these types by
//!   reference; the permutation engine derives relabelled copies through
//!   [`DesignMatrix::permute_rows`].

pub mod builders;
pub mod data;
pub mod errors;
pub mod groups;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::builders::{
    ColumnSource, ColumnTable, DesignBuilder, group_labels, standardize, with_intercept,
};
pub use self::data::{DesignMatrix, OutcomeMatrix};
pub use self::errors::{DesignError, DesignResult};
pub use self::groups::GroupLabels;

pub mod prelude {
    pub use super::builders::{ColumnSource, ColumnTable, DesignBuilder};
    pub use super::data::{DesignMatrix, OutcomeMatrix};
    pub use super::errors::{DesignError, DesignResult};
    pub use super::groups::GroupLabels;
}
