//! Explicit handle over a persisted analysis directory.
//!
//! A [`PersistedState`] is created once by the preparation step (config and
//! per-surface inputs) and then opened by any number of independent
//! workers. Reads of state that was never written fail with
//! [`StoreError::MissingUpstreamState`].
use crate::{
    permutation::{NullDistribution, ObservedField},
    store::{
        errors::{StoreError, StoreResult},
        schema::{
            AnalysisConfig, SurfaceState, config_path, null_dir, null_segment_path, observed_path,
            parse_null_segment_name, read_framed, surface_path, write_framed,
        },
    },
};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone)]
pub struct PersistedState {
    root: PathBuf,
}

impl PersistedState {
    /// Create (or reuse) `root` and write `config`.
    ///
    /// Errors
    /// ------
    /// - Validation errors from [`AnalysisConfig::validate`].
    /// - `StoreError::Io` / `Serialization` on write failure.
    pub fn create(root: impl AsRef<Path>, config: &AnalysisConfig) -> StoreResult<Self> {
        config.validate()?;
        let root = root.as_ref().to_path_buf();
        let nulls = null_dir(&root);
        fs::create_dir_all(&nulls).map_err(|e| StoreError::io(&nulls, e))?;

        let path = config_path(&root);
        let json = serde_json::to_vec_pretty(config).map_err(|e| StoreError::serialization(&path, e))?;
        fs::write(&path, json).map_err(|e| StoreError::io(&path, e))?;
        tracing::debug!(root = %root.display(), surfaces = config.surfaces, "Created persisted state");
        Ok(Self { root })
    }

    /// Open an existing state directory.
    ///
    /// Errors
    /// ------
    /// - `StoreError::MissingUpstreamState` when `config.json` is absent.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        let path = config_path(&root);
        if !path.is_file() {
            return Err(missing("analysis configuration", &path));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> StoreResult<AnalysisConfig> {
        let path = config_path(&self.root);
        if !path.is_file() {
            return Err(missing("analysis configuration", &path));
        }
        let bytes = fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
        let config: AnalysisConfig =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::serialization(&path, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn write_surface(&self, surface: usize, state: &SurfaceState) -> StoreResult<()> {
        write_framed(&surface_path(&self.root, surface), state)
    }

    pub fn read_surface(&self, surface: usize) -> StoreResult<SurfaceState> {
        let path = surface_path(&self.root, surface);
        if !path.is_file() {
            return Err(missing("surface state", &path));
        }
        read_framed(&path)
    }

    pub fn write_observed(&self, surface: usize, observed: &ObservedField) -> StoreResult<()> {
        write_framed(&observed_path(&self.root, surface), observed)
    }

    pub fn read_observed(&self, surface: usize) -> StoreResult<ObservedField> {
        let path = observed_path(&self.root, surface);
        if !path.is_file() {
            return Err(missing("observed statistics", &path));
        }
        read_framed(&path)
    }

    /// Persist one worker's segment under its own file name.
    pub fn write_null_segment(&self, surface: usize, segment: &NullDistribution) -> StoreResult<PathBuf> {
        let range = segment.range();
        let path = null_segment_path(&self.root, surface, *range.start(), *range.end());
        write_framed(&path, segment)?;
        Ok(path)
    }

    /// All segments written for `surface`, in file-name order.
    pub fn null_segments(&self, surface: usize) -> StoreResult<Vec<NullDistribution>> {
        let dir = null_dir(&self.root);
        if !dir.is_dir() {
            return Err(missing("null segment directory", &dir));
        }
        let mut found = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            let name = entry.file_name();
            let Some((s, start, end)) = name.to_str().and_then(parse_null_segment_name) else {
                continue;
            };
            if s == surface {
                found.push((start, end, entry.path()));
            }
        }
        found.sort_unstable_by_key(|(start, end, _)| (*start, *end));

        found
            .into_iter()
            .map(|(start, end, path)| {
                let segment: NullDistribution = read_framed(&path)?;
                if segment.range() != (start..=end) {
                    return Err(StoreError::corruption(
                        &path,
                        format!("file name says {start}..={end}, contents hold {:?}", segment.range()),
                    ));
                }
                Ok(segment)
            })
            .collect()
    }
}

fn missing(what: &'static str, path: &Path) -> StoreError {
    StoreError::MissingUpstreamState { what, path: path.display().to_string() }
}
