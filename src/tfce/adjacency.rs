//! Static neighbour structure over the locations of one surface or volume.
//!
//! Purpose
//! -------
//! Store, for every location, the indices of its direct neighbours in
//! compressed-sparse-row form, plus optional per-location density weights
//! used to normalise cluster extent on irregular meshes.
//!
//! Key behaviors
//! -------------
//! - Constructors symmetrise the relation, drop self-loops and duplicates,
//!   and sort each neighbour row.
//! - [`AdjacencySet::from_faces`] reads triangle meshes,
//!   [`AdjacencySet::from_voxel_mask`] reads 3-D masks with 6/18/26
//!   connectivity (voxels numbered in row-major order over the mask).
//! - [`AdjacencySet::restrict`] keeps the subgraph induced by a location
//!   mask and renumbers the survivors densely.
//!
//! Invariants & assumptions
//! ------------------------
//! - `offsets.len() == len() + 1`, `offsets` is non-decreasing and the
//!   neighbours of `i` are `neighbours[offsets[i]..offsets[i + 1]]`.
//! - Density weights, when present, are finite and strictly positive.
//! - The structure is never mutated after construction; it is shared
//!   read-only by every pass over the surface.
use crate::tfce::errors::{TfceError, TfceResult};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencySet {
    offsets: Vec<usize>,
    neighbours: Vec<usize>,
    density: Option<Vec<f64>>,
}

impl AdjacencySet {
    /// Build from one neighbour list per location.
    ///
    /// Each listed pair is inserted in both directions, so a one-sided list
    /// is accepted.
    ///
    /// Errors
    /// ------
    /// - `TfceError::NeighbourOutOfRange` for an index `>= lists.len()`.
    pub fn from_neighbour_lists(lists: &[Vec<usize>]) -> TfceResult<Self> {
        let m = lists.len();
        let mut edges = Vec::new();
        for (i, row) in lists.iter().enumerate() {
            for &j in row {
                if j >= m {
                    return Err(TfceError::NeighbourOutOfRange { location: i, neighbour: j, len: m });
                }
                edges.push((i, j));
            }
        }
        Ok(Self::from_edges(m, edges))
    }

    /// Build from the triangle faces of a mesh with `m` vertices.
    ///
    /// Errors
    /// ------
    /// - `TfceError::NeighbourOutOfRange` for a vertex index `>= m`.
    pub fn from_faces(m: usize, faces: &[[usize; 3]]) -> TfceResult<Self> {
        let mut edges = Vec::with_capacity(faces.len() * 3);
        for face in faces {
            for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                if a >= m || b >= m {
                    let (location, neighbour) = if a >= m { (b, a) } else { (a, b) };
                    return Err(TfceError::NeighbourOutOfRange { location, neighbour, len: m });
                }
                edges.push((a, b));
            }
        }
        Ok(Self::from_edges(m, edges))
    }

    /// Build from a 3-D mask. Locations are the `true` voxels in row-major
    /// order; two voxels are neighbours when their offset has at most one
    /// (6), two (18) or three (26) non-zero axes.
    ///
    /// Errors
    /// ------
    /// - `TfceError::InvalidConnectivity` for any other connectivity.
    pub fn from_voxel_mask(mask: &Array3<bool>, connectivity: u8) -> TfceResult<Self> {
        let max_axes = match connectivity {
            6 => 1,
            18 => 2,
            26 => 3,
            value => return Err(TfceError::InvalidConnectivity { value }),
        };
        let (nx, ny, nz) = mask.dim();

        let mut index = Array3::<usize>::from_elem((nx, ny, nz), usize::MAX);
        let mut m = 0;
        for ((x, y, z), &inside) in mask.indexed_iter() {
            if inside {
                index[[x, y, z]] = m;
                m += 1;
            }
        }

        // Half of the offset cube is enough; edges are symmetrised later.
        let mut offsets = Vec::new();
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                for dz in -1i64..=1 {
                    let axes = [dx, dy, dz].iter().filter(|d| **d != 0).count();
                    if axes == 0 || axes > max_axes {
                        continue;
                    }
                    if (dx, dy, dz) > (0, 0, 0) {
                        offsets.push((dx, dy, dz));
                    }
                }
            }
        }

        let mut edges = Vec::new();
        for ((x, y, z), &i) in index.indexed_iter() {
            if i == usize::MAX {
                continue;
            }
            for &(dx, dy, dz) in &offsets {
                let (px, py, pz) = (x as i64 + dx, y as i64 + dy, z as i64 + dz);
                if px < 0 || py < 0 || pz < 0 {
                    continue;
                }
                let (px, py, pz) = (px as usize, py as usize, pz as usize);
                if px >= nx || py >= ny || pz >= nz {
                    continue;
                }
                let j = index[[px, py, pz]];
                if j != usize::MAX {
                    edges.push((i, j));
                }
            }
        }
        Ok(Self::from_edges(m, edges))
    }

    fn from_edges(m: usize, edges: Vec<(usize, usize)>) -> Self {
        let mut rows: Vec<Vec<usize>> = vec![Vec::new(); m];
        for (a, b) in edges {
            if a != b {
                rows[a].push(b);
                rows[b].push(a);
            }
        }

        let mut offsets = Vec::with_capacity(m + 1);
        let mut neighbours = Vec::new();
        offsets.push(0);
        for mut row in rows {
            row.sort_unstable();
            row.dedup();
            neighbours.extend_from_slice(&row);
            offsets.push(neighbours.len());
        }
        Self { offsets, neighbours, density: None }
    }

    /// Attach per-location density (area) weights.
    ///
    /// Errors
    /// ------
    /// - `TfceError::LengthMismatch` when `density.len() != len()`.
    /// - `TfceError::InvalidDensity` for a non-finite or non-positive weight.
    pub fn with_density(mut self, density: Vec<f64>) -> TfceResult<Self> {
        if density.len() != self.len() {
            return Err(TfceError::LengthMismatch {
                what: "density",
                expected: self.len(),
                found: density.len(),
            });
        }
        if let Some((index, &value)) =
            density.iter().enumerate().find(|(_, w)| !w.is_finite() || **w <= 0.0)
        {
            return Err(TfceError::InvalidDensity { index, value });
        }
        self.density = Some(density);
        Ok(self)
    }

    /// Subgraph induced by the locations where `mask` is `true`, renumbered
    /// in ascending original order. Density weights follow their locations.
    ///
    /// Errors
    /// ------
    /// - `TfceError::LengthMismatch` when `mask.len() != len()`.
    pub fn restrict(&self, mask: &[bool]) -> TfceResult<Self> {
        if mask.len() != self.len() {
            return Err(TfceError::LengthMismatch {
                what: "mask",
                expected: self.len(),
                found: mask.len(),
            });
        }
        let mut new_index = vec![usize::MAX; mask.len()];
        let mut kept = 0;
        for (i, &inside) in mask.iter().enumerate() {
            if inside {
                new_index[i] = kept;
                kept += 1;
            }
        }

        let mut offsets = Vec::with_capacity(kept + 1);
        let mut neighbours = Vec::new();
        offsets.push(0);
        for i in (0..self.len()).filter(|&i| mask[i]) {
            neighbours.extend(
                self.neighbours(i).iter().map(|&j| new_index[j]).filter(|&j| j != usize::MAX),
            );
            offsets.push(neighbours.len());
        }
        let density = self.density.as_ref().map(|d| {
            d.iter().zip(mask).filter(|(_, inside)| **inside).map(|(w, _)| *w).collect()
        });
        Ok(Self { offsets, neighbours, density })
    }

    /// Number of locations.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted neighbours of location `i`.
    #[inline]
    pub fn neighbours(&self, i: usize) -> &[usize] {
        &self.neighbours[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Density weight of location `i` (1.0 without weights).
    #[inline]
    pub fn weight(&self, i: usize) -> f64 {
        self.density.as_ref().map_or(1.0, |d| d[i])
    }

    pub fn density(&self) -> Option<&[f64]> {
        self.density.as_deref()
    }

    /// Total number of directed neighbour entries (twice the edge count).
    pub fn nnz(&self) -> usize {
        self.neighbours.len()
    }
}
