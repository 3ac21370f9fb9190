//! Exchangeability structure: which rows may trade places under the null.
//!
//! Purpose
//! -------
//! Produce row index permutations for the design, either unrestricted or
//! confined to exchangeability blocks.
//!
//! Key behaviors
//! -------------
//! - `Free`: a uniform shuffle of `0..n`.
//! - `Blocks`: each block's row positions are shuffled among themselves and
//!   spliced back into the same positions, so no row ever leaves its block.
//!
//! Conventions
//! -----------
//! - The returned vector `index` means "new row `i` is old row `index[i]`",
//!   matching [`DesignMatrix::permute_rows`](crate::design::DesignMatrix::permute_rows).
use crate::design::{DesignResult, GroupLabels};
use rand::{Rng, seq::SliceRandom};

#[derive(Debug, Clone, PartialEq)]
pub enum Exchangeability {
    Free { n: usize },
    Blocks { n: usize, blocks: Vec<Vec<usize>> },
}

impl Exchangeability {
    pub fn free(n: usize) -> Self {
        Exchangeability::Free { n }
    }

    pub fn blocks(groups: &GroupLabels) -> Self {
        Exchangeability::Blocks { n: groups.len(), blocks: groups.blocks() }
    }

    /// Blocks when labels are supplied (checked against `n`), otherwise free.
    pub fn from_groups(n: usize, groups: Option<&GroupLabels>) -> DesignResult<Self> {
        match groups {
            None => Ok(Self::free(n)),
            Some(g) => {
                g.check_rows(n)?;
                Ok(Self::blocks(g))
            }
        }
    }

    pub fn nobs(&self) -> usize {
        match self {
            Exchangeability::Free { n } | Exchangeability::Blocks { n, .. } => *n,
        }
    }

    /// Draw one relabelling.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        match self {
            Exchangeability::Free { n } => {
                let mut index: Vec<usize> = (0..*n).collect();
                index.shuffle(rng);
                index
            }
            Exchangeability::Blocks { n, blocks } => {
                let mut index: Vec<usize> = (0..*n).collect();
                for positions in blocks {
                    let mut shuffled = positions.clone();
                    shuffled.shuffle(rng);
                    for (&pos, &src) in positions.iter().zip(&shuffled) {
                        index[pos] = src;
                    }
                }
                index
            }
        }
    }
}
