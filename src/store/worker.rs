//! Independent worker bound to one persisted surface.
//!
//! Purpose
//! -------
//! Let separate processes (batch jobs, threads) compute the observed pass
//! or any permutation range for one surface from the shared persisted
//! state, each writing only its own output file.
//!
//! Key behaviors
//! -------------
//! - [`SurfaceWorker::open`] loads the configuration and the surface inputs
//!   and fails fast with `MissingUpstreamState` if either is absent.
//! - [`SurfaceWorker::run_observed`] writes `observed_<s>.bin`; for the
//!   mixed model it fits every location and zeroes failed ones.
//! - The configured [`SurfaceModel`] selects the statistic: regression t
//!   per contrast, or the mediation z-field (whose permutations relabel
//!   the non-imaging inputs).
//! - [`SurfaceWorker::run_range`] writes
//!   `null/surface_<s>_perm_<a>_<b>.bin`. Rerunning a range rewrites the
//!   identical segment, since permutations are pure functions of the seed.
//!
//! Invariants & assumptions
//! ------------------------
//! - Ranges must lie inside `1..=config.permutations`.
use crate::{
    estimation::{ModelKind, estimate_field},
    mediation::PathModel,
    permutation::{Exchangeability, NullDistribution, ObservedField, PermutationEngine},
    store::{
        errors::{StoreError, StoreResult},
        schema::{AnalysisConfig, SurfaceModel, SurfaceState},
        state::PersistedState,
    },
    tfce::{AdjacencySet, TfceTransform},
};
use std::ops::RangeInclusive;

#[derive(Debug, Clone)]
pub struct SurfaceWorker {
    state: PersistedState,
    surface: usize,
    config: AnalysisConfig,
    inputs: SurfaceState,
    adjacency: AdjacencySet,
}

impl SurfaceWorker {
    /// Errors
    /// ------
    /// - `StoreError::MissingUpstreamState` for an absent configuration or
    ///   surface file.
    /// - `StoreError::InvalidConfig` for a surface index outside the
    ///   configured count or data misaligned with the model inputs.
    pub fn open(state: &PersistedState, surface: usize) -> StoreResult<Self> {
        let config = state.config()?;
        if surface >= config.surfaces {
            return Err(StoreError::InvalidConfig {
                text: format!("surface {surface} requested, {} configured", config.surfaces),
            });
        }
        let inputs = state.read_surface(surface)?;
        if inputs.data().nrows() != config.target.nobs() {
            return Err(StoreError::InvalidConfig {
                text: format!(
                    "surface {surface} has {} rows, model inputs have {}",
                    inputs.data().nrows(),
                    config.target.nobs()
                ),
            });
        }
        let adjacency = inputs.masked_adjacency()?;
        Ok(Self { state: state.clone(), surface, config, inputs, adjacency })
    }

    pub fn surface(&self) -> usize {
        self.surface
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn tfce(&self) -> StoreResult<Option<TfceTransform<'_>>> {
        Ok(match self.config.tfce {
            None => None,
            Some(params) => Some(TfceTransform::new(&self.adjacency, params)?),
        })
    }

    fn engine(&self) -> StoreResult<PermutationEngine<'_>> {
        let exch =
            Exchangeability::from_groups(self.config.target.nobs(), self.config.groups.as_ref())?;
        let (data, seed) = (self.inputs.data(), self.config.seed);
        let engine = match &self.config.target {
            SurfaceModel::Regression(design) => PermutationEngine::new(design, data, exch, seed)?,
            SurfaceModel::Mediation(spec) => PermutationEngine::mediation(spec, data, exch, seed)?,
        };
        Ok(match self.tfce()? {
            None => engine,
            Some(tfce) => engine.with_tfce(tfce)?,
        })
    }

    /// Compute and persist the index-0 pass.
    pub fn run_observed(&self) -> StoreResult<ObservedField> {
        let observed = match (self.config.model, &self.config.target) {
            (ModelKind::Linear, _) => self.engine()?.observed()?,
            (ModelKind::Mixed, SurfaceModel::Regression(design)) => {
                let stats = estimate_field(
                    ModelKind::Mixed,
                    design,
                    self.inputs.data(),
                    self.config.groups.as_ref(),
                    &self.config.mixed,
                )?;
                ObservedField::from_field_statistics(stats, self.tfce()?.as_ref())?
            }
            (ModelKind::Mixed, SurfaceModel::Mediation(spec)) => {
                let model = PathModel {
                    kind: ModelKind::Mixed,
                    groups: self.config.groups.as_ref(),
                    mixed: self.config.mixed.clone(),
                };
                let outcome = spec.run(self.inputs.data(), &model)?;
                ObservedField::from_mediation(outcome, self.tfce()?.as_ref())?
            }
        };
        self.state.write_observed(self.surface, &observed)?;
        Ok(observed)
    }

    /// Compute and persist permutations `range`.
    ///
    /// Errors
    /// ------
    /// - `StoreError::InvalidConfig` for a range outside
    ///   `1..=config.permutations`.
    pub fn run_range(&self, range: RangeInclusive<usize>) -> StoreResult<NullDistribution> {
        let (start, end) = (*range.start(), *range.end());
        if start == 0 || start > end || end > self.config.permutations {
            return Err(StoreError::InvalidConfig {
                text: format!(
                    "permutation range {start}..={end} outside 1..={}",
                    self.config.permutations
                ),
            });
        }
        let segment = self.engine()?.run(range)?;
        let path = self.state.write_null_segment(self.surface, &segment)?;
        tracing::debug!(surface = self.surface, start, end, path = %path.display(), "Wrote null segment");
        Ok(segment)
    }
}
