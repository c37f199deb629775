use rand::seq::SliceRandom;
use rand::RngCore;

use crate::clustering::domain::cluster_assignment::{ClusterAssignment, Termination};
use crate::clustering::domain::cluster_engine::{majority_label, ClusterEngine, ConvergenceRule};
use crate::clustering::domain::similarity_graph::SimilarityGraph;

/// Chinese Whispers label propagation, updating labels in place.
///
/// Every vertex starts in its own cluster. Each pass visits the vertices
/// in a fresh random order and moves each one to the majority label of
/// its neighbourhood (itself included), so later vertices in a pass see
/// labels already updated earlier in the same pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChineseWhispers {
    convergence: ConvergenceRule,
}

impl ChineseWhispers {
    pub fn new(convergence: ConvergenceRule) -> Self {
        Self { convergence }
    }
}

impl ClusterEngine for ChineseWhispers {
    fn cluster(
        &self,
        graph: &SimilarityGraph,
        max_iterations: u32,
        rng: &mut dyn RngCore,
    ) -> ClusterAssignment {
        let n = graph.vertex_count();
        if n == 0 {
            return ClusterAssignment::empty();
        }

        let neighbors = graph.neighbors();
        let mut labels: Vec<u32> = (0..n).map(|i| i as u32).collect();
        let mut order: Vec<usize> = (0..n).collect();

        for iteration in 1..=max_iterations {
            order.shuffle(rng);

            let mut changed = 0;
            let mut ties = 0;
            for &v in &order {
                let Some(vote) = majority_label(&neighbors[v], &labels, rng) else {
                    continue;
                };
                if vote.tied {
                    ties += 1;
                }
                if vote.label != labels[v] {
                    labels[v] = vote.label;
                    changed += 1;
                }
            }
            log::trace!("Pass {iteration}: {changed} labels changed, {ties} ties");

            if self.convergence.is_stable(changed, ties) {
                log::debug!("Label propagation converged after {iteration} passes");
                return ClusterAssignment::new(labels, iteration, Termination::Converged);
            }
        }

        log::debug!("Label propagation stopped at the {max_iterations}-pass budget");
        ClusterAssignment::new(labels, max_iterations, Termination::IterationBudgetExhausted)
    }
}
