//! FINALIZE across workers: stitch segments, merge surfaces, tabulate.
use crate::{
    analysis::{MediationTable, ResultTable},
    permutation::{NullDistribution, ObservedField, PermutationError, SortedNull},
    store::{
        errors::{StoreError, StoreResult},
        schema::{AnalysisConfig, SurfaceModel, SurfaceState},
        state::PersistedState,
    },
};

impl PersistedState {
    /// Null distribution over `1..=P` for the whole analysis, with `P` the
    /// configured permutation count.
    ///
    /// For every configured surface the persisted segments must tile
    /// `1..=P` exactly; the per-permutation maxima are then the maxima over
    /// surfaces.
    ///
    /// Errors
    /// ------
    /// - `StoreError::InvalidConfig` when the configuration holds no
    ///   permutations.
    /// - `StoreError::IncompleteNull` for a surface with no segments, a gap,
    ///   an overlap or a total range other than `1..=P`.
    /// - Configuration and I/O errors.
    pub fn collect_null(&self) -> StoreResult<NullDistribution> {
        let config = self.config()?;
        let permutations = config.permutations;
        if permutations == 0 {
            return Err(StoreError::InvalidConfig {
                text: "no permutations configured; there is no null to collect".into(),
            });
        }
        let expected = format!("1..={permutations}");
        let mut merged: Option<NullDistribution> = None;

        for surface in 0..config.surfaces {
            let segments = self.null_segments(surface)?;
            let full = NullDistribution::concat(segments).map_err(|e| match e {
                PermutationError::EmptyNull => StoreError::IncompleteNull {
                    surface,
                    expected: expected.clone(),
                    found: "no segments".into(),
                },
                PermutationError::SegmentGap { expected: at, found }
                | PermutationError::SegmentOverlap { expected: at, found } => {
                    StoreError::IncompleteNull {
                        surface,
                        expected: expected.clone(),
                        found: format!("segment starting at {found} where {at} was expected"),
                    }
                }
                other => StoreError::Permutation(other),
            })?;
            if full.range() != (1..=permutations) {
                return Err(StoreError::IncompleteNull {
                    surface,
                    expected: expected.clone(),
                    found: format!("{}..={}", full.range().start(), full.range().end()),
                });
            }
            merged = Some(match merged {
                None => full,
                Some(acc) => acc.merge_max(&full)?,
            });
        }

        let null = merged.ok_or(StoreError::InvalidConfig { text: "no surfaces configured".into() })?;
        tracing::debug!(surfaces = config.surfaces, permutations, "Collected null distribution");
        Ok(null)
    }

    /// Observed pass, surface inputs and (when permutations are configured)
    /// the sorted merged null for `surface`.
    fn finalize_inputs(
        &self, surface: usize,
    ) -> StoreResult<(AnalysisConfig, SurfaceState, ObservedField, Option<SortedNull>)> {
        let config = self.config()?;
        if surface >= config.surfaces {
            return Err(StoreError::InvalidConfig {
                text: format!("surface {surface} requested, {} configured", config.surfaces),
            });
        }
        let inputs = self.read_surface(surface)?;
        let observed = self.read_observed(surface)?;
        let null = match config.permutations {
            0 => None,
            _ => Some(self.collect_null()?.finalize()),
        };
        Ok((config, inputs, observed, null))
    }

    /// Report table of a regression analysis for `surface`.
    ///
    /// Location ids are the surface-local indices of the masked locations.
    /// The FWER block uses the null merged over every surface.
    ///
    /// Errors
    /// ------
    /// - `StoreError::InvalidConfig` for an unknown surface or a mediation
    ///   configuration.
    /// - `StoreError::MissingUpstreamState` / `IncompleteNull` when the
    ///   observed pass or any permutation segment is missing.
    pub fn finalize_surface(&self, surface: usize) -> StoreResult<ResultTable> {
        let (config, inputs, observed, null) = self.finalize_inputs(surface)?;
        let SurfaceModel::Regression(design) = &config.target else {
            return Err(StoreError::InvalidConfig {
                text: "mediation state; use finalize_mediation_surface".into(),
            });
        };
        let seed = null.as_ref().map(|_| config.seed);
        let table = ResultTable::from_observed(
            inputs.location_ids(),
            design.contrast_names().to_vec(),
            &observed,
            null.as_ref(),
            seed,
        )?;
        tracing::info!(surface, locations = table.location_ids.len(), "Finalized surface");
        Ok(table)
    }

    /// Report table of a mediation analysis for `surface`.
    ///
    /// Errors
    /// ------
    /// - As [`finalize_surface`](Self::finalize_surface), with the
    ///   configuration required to be a mediation one.
    pub fn finalize_mediation_surface(&self, surface: usize) -> StoreResult<MediationTable> {
        let (config, inputs, observed, null) = self.finalize_inputs(surface)?;
        if !matches!(config.target, SurfaceModel::Mediation(_)) {
            return Err(StoreError::InvalidConfig {
                text: "regression state; use finalize_surface".into(),
            });
        }
        let seed = null.as_ref().map(|_| config.seed);
        let table =
            MediationTable::from_observed(inputs.location_ids(), &observed, null.as_ref(), seed)?;
        tracing::info!(surface, locations = table.location_ids.len(), "Finalized mediation surface");
        Ok(table)
    }
}
