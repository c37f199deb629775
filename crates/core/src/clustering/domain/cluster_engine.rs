use std::collections::BTreeMap;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::clustering::domain::cluster_assignment::ClusterAssignment;
use crate::clustering::domain::similarity_graph::SimilarityGraph;

/// Domain interface for partitioning a similarity graph into clusters.
///
/// The random source is always supplied by the caller so that a fixed
/// seed pins the visitation order and every tie-break.
pub trait ClusterEngine: Send {
    fn cluster(
        &self,
        graph: &SimilarityGraph,
        max_iterations: u32,
        rng: &mut dyn RngCore,
    ) -> ClusterAssignment;
}

/// When a propagation pass counts as a fixed point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvergenceRule {
    /// No label changed and no vote was a tie: every vertex already holds
    /// the strict majority label of its neighbourhood.
    #[default]
    Settled,
    /// No label changed during the pass, even if some ties happened to
    /// resolve to the current label.
    Unchanged,
}

impl ConvergenceRule {
    pub fn is_stable(&self, changed: usize, ties: usize) -> bool {
        match self {
            ConvergenceRule::Settled => changed == 0 && ties == 0,
            ConvergenceRule::Unchanged => changed == 0,
        }
    }
}

impl std::fmt::Display for ConvergenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvergenceRule::Settled => write!(f, "settled"),
            ConvergenceRule::Unchanged => write!(f, "unchanged"),
        }
    }
}

impl std::str::FromStr for ConvergenceRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "settled" => Ok(ConvergenceRule::Settled),
            "unchanged" => Ok(ConvergenceRule::Unchanged),
            other => Err(format!(
                "Convergence rule must be 'settled' or 'unchanged', got '{other}'"
            )),
        }
    }
}

/// Outcome of one vertex's neighbourhood vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vote {
    pub label: u32,
    /// More than one label shared the top tally and `rng` picked one.
    pub tied: bool,
}

/// Majority label among `neighbors`, read from `labels`.
///
/// Ties are broken uniformly at random. Tied labels are ordered ascending
/// before the draw so the choice depends only on the RNG state. Returns
/// `None` for a vertex with no neighbours.
pub fn majority_label(neighbors: &[usize], labels: &[u32], rng: &mut dyn RngCore) -> Option<Vote> {
    let mut tally: BTreeMap<u32, u32> = BTreeMap::new();
    for &u in neighbors {
        *tally.entry(labels[u]).or_insert(0) += 1;
    }

    let best = tally.values().copied().max()?;
    let tied: Vec<u32> = tally
        .into_iter()
        .filter(|&(_, count)| count == best)
        .map(|(label, _)| label)
        .collect();

    if tied.len() == 1 {
        Some(Vote {
            label: tied[0],
            tied: false,
        })
    } else {
        Some(Vote {
            label: tied[rng.gen_range(0..tied.len())],
            tied: true,
        })
    }
}
