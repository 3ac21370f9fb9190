//! analysis — in-memory pipelines and CSV result tables.
//!
//! Purpose
//! -------
//! Offer single-call entry points for the common analyses and write their
//! results in the flat per-location layout downstream tools consume.
//!
//! Downstream usage
//! ----------------
//! - Out-of-core runs finalize through `store::PersistedState`, which
//!   builds the same [`ResultTable`] and [`MediationTable`] from persisted
//!   observed fields and the merged null.

pub mod errors;
pub mod pipeline;
pub mod report;

pub use self::errors::{AnalysisError, AnalysisResult};
pub use self::pipeline::{AnalysisOptions, run_mass_univariate, run_mediation_analysis};
pub use self::report::{MediationTable, ResultTable};

pub mod prelude {
    pub use super::errors::{AnalysisError, AnalysisResult};
    pub use super::pipeline::{AnalysisOptions, run_mass_univariate, run_mediation_analysis};
    pub use super::report::{MediationTable, ResultTable};
}
