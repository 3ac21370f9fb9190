//! Exchangeability-block labels.
//!
//! A [`GroupLabels`] value assigns every observation to one categorical
//! block (typically a subject with repeated measurements). Several grouping
//! factors collapse into a single key by joining their values with `_`, so a
//! block is the set of rows that agree on every factor.
use crate::design::errors::{DesignError, DesignResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-observation block labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLabels {
    labels: Vec<String>,
}

impl GroupLabels {
    pub fn new(labels: Vec<String>) -> DesignResult<Self> {
        if labels.is_empty() {
            return Err(DesignError::EmptyDesign);
        }
        Ok(Self { labels })
    }

    /// Build one composite key per row from several categorical factors.
    ///
    /// Row `i` receives `f0[i] + "_" + f1[i] + ...`. A single factor is used
    /// as-is.
    ///
    /// Errors
    /// ------
    /// - `DesignError::EmptyGroupList` when `factors` is empty.
    /// - `DesignError::MismatchedRows` when factors disagree in length.
    pub fn composite(factors: &[&[String]]) -> DesignResult<Self> {
        let first = factors.first().ok_or(DesignError::EmptyGroupList)?;
        let n = first.len();
        for factor in factors.iter().skip(1) {
            if factor.len() != n {
                return Err(DesignError::MismatchedRows {
                    what: "grouping factor",
                    expected: n,
                    found: factor.len(),
                });
            }
        }
        let labels = (0..n)
            .map(|i| factors.iter().map(|f| f[i].as_str()).collect::<Vec<_>>().join("_"))
            .collect();
        Self::new(labels)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Row indices of every block, blocks ordered by first appearance and
    /// rows ascending within a block.
    pub fn blocks(&self) -> Vec<Vec<usize>> {
        let mut slot: HashMap<&str, usize> = HashMap::new();
        let mut blocks: Vec<Vec<usize>> = Vec::new();
        for (row, label) in self.labels.iter().enumerate() {
            let next = blocks.len();
            let b = *slot.entry(label.as_str()).or_insert(next);
            if b == next {
                blocks.push(Vec::new());
            }
            blocks[b].push(row);
        }
        blocks
    }

    pub fn check_rows(&self, nobs: usize) -> DesignResult<()> {
        if self.labels.len() != nobs {
            return Err(DesignError::MismatchedRows {
                what: "group labels",
                expected: nobs,
                found: self.labels.len(),
            });
        }
        Ok(())
    }
}
