//! On-disk schema of persisted analysis state.
//!
//! Layout
//! ------
//! ```text
//! <root>/config.json                          AnalysisConfig (JSON)
//! <root>/surface_<s>.bin                      SurfaceState
//! <root>/observed_<s>.bin                     ObservedField (index-0 pass)
//! <root>/null/surface_<s>_perm_<a>_<b>.bin    NullDistribution for a..=b
//! ```
//!
//! Binary files are bincode frames `{magic, version, payload}` followed by
//! a little-endian CRC32 of the frame bytes. A bad checksum, magic number
//! or version is reported as corruption, never silently accepted.
use crate::{
    design::{DesignMatrix, GroupLabels},
    estimation::{MixedOptions, ModelKind},
    mediation::MediationSpec,
    store::errors::{StoreError, StoreResult},
    tfce::{AdjacencySet, TfceParams},
};
use ndarray::Array2;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

/// Magic number for state files ("TFCE" in ASCII).
const STATE_MAGIC: u32 = 0x5446_4345;

/// Current binary format version.
const STATE_VERSION: u16 = 1;

pub const CONFIG_FILE: &str = "config.json";
pub const NULL_DIR: &str = "null";

/// The statistic every surface is tested with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SurfaceModel {
    /// Mass-univariate regression: one t-field per non-intercept regressor.
    Regression(DesignMatrix),
    /// Indirect-effect z-field of a mediation model.
    Mediation(MediationSpec),
}

impl SurfaceModel {
    pub fn nobs(&self) -> usize {
        match self {
            SurfaceModel::Regression(design) => design.nobs(),
            SurfaceModel::Mediation(spec) => spec.nobs(),
        }
    }
}

/// Everything a worker needs besides the per-surface data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub model: ModelKind,
    pub mixed: MixedOptions,
    /// Total permutation count `P`; 0 means no FWER.
    pub permutations: usize,
    /// Base seed shared by every worker.
    pub seed: u64,
    pub tfce: Option<TfceParams>,
    /// Number of surfaces `0..surfaces`.
    pub surfaces: usize,
    pub target: SurfaceModel,
    pub groups: Option<GroupLabels>,
}

impl AnalysisConfig {
    /// Errors
    /// ------
    /// - `StoreError::InvalidConfig` for zero surfaces, or a mixed model
    ///   combined with permutations.
    /// - Wrapped errors for misaligned group labels or TFCE parameters.
    pub fn validate(&self) -> StoreResult<()> {
        if self.surfaces == 0 {
            return Err(StoreError::InvalidConfig { text: "at least one surface is required".into() });
        }
        if self.model == ModelKind::Mixed && self.permutations > 0 {
            return Err(StoreError::InvalidConfig {
                text: "permutation testing is only available for the linear model".into(),
            });
        }
        if let Some(groups) = &self.groups {
            groups.check_rows(self.target.nobs())?;
        }
        if let Some(params) = &self.tfce {
            params.validate()?;
        }
        Ok(())
    }
}

/// Per-surface inputs.
///
/// `adjacency` and `mask` cover every location of the surface; `data` holds
/// only the masked columns (n × count(mask)); `density`, when present,
/// covers every location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceState {
    adjacency: AdjacencySet,
    mask: Vec<bool>,
    data: Array2<f64>,
    density: Option<Vec<f64>>,
}

impl SurfaceState {
    /// Errors
    /// ------
    /// - `StoreError::InvalidConfig` when the mask, data or density sizes
    ///   disagree with the adjacency.
    pub fn new(
        adjacency: AdjacencySet, mask: Vec<bool>, data: Array2<f64>, density: Option<Vec<f64>>,
    ) -> StoreResult<Self> {
        if mask.len() != adjacency.len() {
            return Err(StoreError::InvalidConfig {
                text: format!("mask has {} entries for {} locations", mask.len(), adjacency.len()),
            });
        }
        let kept = mask.iter().filter(|&&b| b).count();
        if data.ncols() != kept {
            return Err(StoreError::InvalidConfig {
                text: format!("data has {} columns for {kept} masked locations", data.ncols()),
            });
        }
        if let Some(d) = &density {
            if d.len() != adjacency.len() {
                return Err(StoreError::InvalidConfig {
                    text: format!("density has {} entries for {} locations", d.len(), adjacency.len()),
                });
            }
        }
        Ok(Self { adjacency, mask, data, density })
    }

    pub fn adjacency(&self) -> &AdjacencySet {
        &self.adjacency
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn density(&self) -> Option<&[f64]> {
        self.density.as_deref()
    }

    /// Surface-local indices of the masked locations, as report ids.
    pub fn location_ids(&self) -> Vec<String> {
        self.mask.iter().enumerate().filter(|(_, keep)| **keep).map(|(i, _)| i.to_string()).collect()
    }

    /// Adjacency restricted to the mask, carrying masked density weights.
    pub fn masked_adjacency(&self) -> StoreResult<AdjacencySet> {
        let restricted = self.adjacency.restrict(&self.mask)?;
        match &self.density {
            None => Ok(restricted),
            Some(d) => {
                let masked: Vec<f64> =
                    d.iter().zip(&self.mask).filter(|(_, keep)| **keep).map(|(w, _)| *w).collect();
                Ok(restricted.with_density(masked)?)
            }
        }
    }
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn surface_path(root: &Path, surface: usize) -> PathBuf {
    root.join(format!("surface_{surface}.bin"))
}

pub fn observed_path(root: &Path, surface: usize) -> PathBuf {
    root.join(format!("observed_{surface}.bin"))
}

pub fn null_dir(root: &Path) -> PathBuf {
    root.join(NULL_DIR)
}

pub fn null_segment_path(root: &Path, surface: usize, start: usize, end: usize) -> PathBuf {
    null_dir(root).join(format!("surface_{surface}_perm_{start}_{end}.bin"))
}

/// `(surface, start, end)` from a segment file name.
pub fn parse_null_segment_name(name: &str) -> Option<(usize, usize, usize)> {
    let stem = name.strip_prefix("surface_")?.strip_suffix(".bin")?;
    let (surface, range) = stem.split_once("_perm_")?;
    let (start, end) = range.split_once('_')?;
    Some((surface.parse().ok()?, start.parse().ok()?, end.parse().ok()?))
}

#[derive(Serialize)]
struct FrameRef<'a, T> {
    magic: u32,
    version: u16,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Frame<T> {
    magic: u32,
    version: u16,
    payload: T,
}

/// Write `value` as a checksummed bincode frame.
pub fn write_framed<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let frame = FrameRef { magic: STATE_MAGIC, version: STATE_VERSION, payload: value };
    let data = bincode::serialize(&frame).map_err(|e| StoreError::serialization(path, e))?;
    let checksum = crc32fast::hash(&data);

    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&data).map_err(|e| StoreError::io(path, e))?;
    writer.write_all(&checksum.to_le_bytes()).map_err(|e| StoreError::io(path, e))?;
    writer.flush().map_err(|e| StoreError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = data.len() + 4, "Wrote state file");
    Ok(())
}

/// Read and verify a frame written by [`write_framed`].
pub fn read_framed<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let mut data = Vec::new();
    BufReader::new(file).read_to_end(&mut data).map_err(|e| StoreError::io(path, e))?;

    let Some(split) = data.len().checked_sub(4) else {
        return Err(StoreError::corruption(path, "file too small"));
    };
    let (body, tail) = data.split_at(split);
    let stored = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(StoreError::corruption(
            path,
            format!("checksum mismatch: stored {stored:08x}, computed {computed:08x}"),
        ));
    }

    let frame: Frame<T> = bincode::deserialize(body).map_err(|e| StoreError::serialization(path, e))?;
    if frame.magic != STATE_MAGIC {
        return Err(StoreError::corruption(path, format!("invalid magic number {:08x}", frame.magic)));
    }
    if frame.version != STATE_VERSION {
        return Err(StoreError::corruption(
            path,
            format!("unsupported version {} (expected {STATE_VERSION})", frame.version),
        ));
    }
    tracing::debug!(path = %path.display(), bytes = data.len(), "Read state file");
    Ok(frame.payload)
}
