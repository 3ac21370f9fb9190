//! tfce — threshold-free cluster enhancement over a fixed adjacency.
//!
//! Purpose
//! -------
//! Provide the spatial half of the inference engine: a read-only neighbour
//! structure per surface ([`AdjacencySet`]) and the transform that rewards
//! spatially contiguous signal without a cluster-forming threshold.
//!
//! Key behaviors
//! -------------
//! - [`TfceTransform`] is the in-memory strategy; it borrows the adjacency
//!   and can reuse a caller-held [`TfceWorkspace`] across many fields (one
//!   per permutation worker thread).
//! - [`StreamingTfce`] is the low-resource strategy: surfaces are pulled one
//!   at a time and their inputs are dropped once the sink has the output.
//! - Both strategies run the same sweep and produce identical results.
//!
//! Conventions
//! -----------
//! - Enhancement is one-sided; signed fields go through
//!   [`TfceTransform::enhance_signed`], which returns non-negative positive
//!   and negative magnitudes.
//! - Permutation maxima use the larger of the two magnitudes.

pub mod adjacency;
pub mod errors;
pub mod streaming;
pub mod transform;
pub mod workspace;

pub use self::adjacency::AdjacencySet;
pub use self::errors::{TfceError, TfceResult};
pub use self::streaming::{EnhancedSink, StreamingTfce, SurfaceField};
pub use self::transform::{SignedEnhancement, TfceParams, TfceStep, TfceTransform};
pub use self::workspace::TfceWorkspace;

pub mod prelude {
    pub use super::adjacency::AdjacencySet;
    pub use super::errors::{TfceError, TfceResult};
    pub use super::transform::{TfceParams, TfceStep, TfceTransform};
}
