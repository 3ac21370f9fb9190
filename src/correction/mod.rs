//! correction — multiple-testing adjustment of statistic fields.
//!
//! Both corrections are pure functions of already computed values:
//! [`fdr_bh`] / [`fdr_bh_columns`] for Benjamini–Hochberg q-values, and
//! [`fwer_pvalue`] (or [`SortedNull::fwer`]) for the empirical
//! maximum-statistic FWER lookup. Neither mutates its inputs.

pub mod fdr;
pub mod fwer;

pub use self::fdr::{fdr_bh, fdr_bh_columns};
pub use self::fwer::fwer_pvalue;
pub use crate::permutation::null::SortedNull;
