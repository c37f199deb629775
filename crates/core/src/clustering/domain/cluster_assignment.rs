use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::clustering::domain::cluster_error::ClusterError;

/// How a label propagation run ended. Both are valid results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Converged,
    IterationBudgetExhausted,
}

/// Per-vertex cluster labels from one clustering run.
///
/// Labels are raw vertex indices and are generally sparse: a cluster's
/// label is the index of whichever vertex its label originated from.
/// Use [`ClusterAssignment::compacted`] for dense `0..K` labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterAssignment {
    labels: Vec<u32>,
    cluster_count: u32,
    iterations: u32,
    termination: Termination,
}

impl ClusterAssignment {
    pub fn new(labels: Vec<u32>, iterations: u32, termination: Termination) -> Self {
        let cluster_count = labels.iter().collect::<HashSet<_>>().len() as u32;
        Self {
            labels,
            cluster_count,
            iterations,
            termination,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, Termination::Converged)
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn into_labels(self) -> Vec<u32> {
        self.labels
    }

    /// Number of distinct label values, not the label range.
    pub fn cluster_count(&self) -> u32 {
        self.cluster_count
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label_of(&self, index: usize) -> Option<u32> {
        self.labels.get(index).copied()
    }

    /// Propagation passes actually run.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn is_converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Vertex indices per cluster, each group ascending, groups ordered by
    /// their smallest member.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut by_label: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (index, &label) in self.labels.iter().enumerate() {
            by_label.entry(label).or_default().push(index);
        }
        let mut groups: Vec<Vec<usize>> = by_label.into_values().collect();
        groups.sort_by_key(|g| g[0]);
        groups
    }

    /// Renumbers labels densely into `0..cluster_count` in order of first
    /// appearance. The partition is unchanged.
    pub fn compacted(&self) -> ClusterAssignment {
        let mut dense: HashMap<u32, u32> = HashMap::new();
        let labels = self
            .labels
            .iter()
            .map(|label| {
                let next = dense.len() as u32;
                *dense.entry(*label).or_insert(next)
            })
            .collect();
        ClusterAssignment {
            labels,
            cluster_count: self.cluster_count,
            iterations: self.iterations,
            termination: self.termination,
        }
    }

    /// Pairs each label with the caller's per-face metadata, in order.
    pub fn join<T>(&self, metadata: Vec<T>) -> Result<Vec<(T, u32)>, ClusterError> {
        if metadata.len() != self.labels.len() {
            return Err(ClusterError::LengthMismatch {
                labels: self.labels.len(),
                metadata: metadata.len(),
            });
        }
        Ok(metadata.into_iter().zip(self.labels.iter().copied()).collect())
    }
}
