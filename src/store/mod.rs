//! store — persisted state for out-of-core, distributed permutation runs.
//!
//! Purpose
//! -------
//! Replace implicit temp-directory conventions with an explicit handle and
//! schema, so that the observed pass and disjoint permutation ranges can be
//! computed by independent workers and aggregated afterwards.
//!
//! Key behaviors
//! -------------
//! - [`PersistedState::create`] writes `config.json`; the preparation step
//!   then writes one [`SurfaceState`] per surface.
//! - [`SurfaceWorker`] computes one surface's observed pass or one
//!   permutation range and writes its own file; no two workers share a
//!   write target when ranges are disjoint.
//! - [`PersistedState::collect_null`] checks full, non-overlapping coverage
//!   of the configured `1..=P` and merges surfaces into one null
//!   distribution.
//! - [`PersistedState::finalize_surface`] and
//!   [`PersistedState::finalize_mediation_surface`] turn one surface's
//!   observed pass plus the merged null into a report table.
//!
//! Invariants & assumptions
//! ------------------------
//! - Missing upstream state is an error, never a trigger to recompute.
//! - Binary files carry magic, version and CRC32; see [`schema`].

pub mod aggregate;
pub mod errors;
pub mod schema;
pub mod state;
pub mod worker;

pub use self::errors::{StoreError, StoreResult};
pub use self::schema::{AnalysisConfig, SurfaceModel, SurfaceState};
pub use self::state::PersistedState;
pub use self::worker::SurfaceWorker;

pub mod prelude {
    pub use super::errors::{StoreError, StoreResult};
    pub use super::schema::{AnalysisConfig, SurfaceState};
    pub use super::state::PersistedState;
    pub use super::worker::SurfaceWorker;
}
