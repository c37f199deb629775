//! Multi-threaded Chinese Whispers with double-buffered labels.
//!
//! Every vote in a pass reads the labels as they were when the pass
//! began, so vertices can be processed on any thread in any grouping.
//! The caller's RNG is consumed only on the calling thread: one shuffle
//! and one tie-break seed per vertex per pass. Output is therefore
//! identical for every thread count under a fixed seed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};

use crate::clustering::domain::cluster_assignment::{ClusterAssignment, Termination};
use crate::clustering::domain::cluster_engine::{
    majority_label, ClusterEngine, ConvergenceRule, Vote,
};
use crate::clustering::domain::similarity_graph::SimilarityGraph;

pub struct SnapshotChineseWhispers {
    threads: usize,
    convergence: ConvergenceRule,
}

struct VertexUpdate {
    vertex: usize,
    vote: Vote,
}

struct PassOutcome {
    labels: Vec<u32>,
    changed: usize,
    ties: usize,
}

impl SnapshotChineseWhispers {
    pub fn new(threads: usize, convergence: ConvergenceRule) -> Self {
        Self {
            threads: threads.max(1),
            convergence,
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    fn run_pass(
        &self,
        order: &[usize],
        seeds: &[u64],
        neighbors: &[Vec<usize>],
        snapshot: &[u32],
    ) -> PassOutcome {
        let chunk_size = order.len().div_ceil(self.threads).max(1);
        let (update_tx, update_rx) = crossbeam_channel::unbounded::<Vec<VertexUpdate>>();

        std::thread::scope(|scope| {
            for (vertices, vertex_seeds) in order.chunks(chunk_size).zip(seeds.chunks(chunk_size)) {
                let update_tx = update_tx.clone();
                scope.spawn(move || {
                    let updates: Vec<VertexUpdate> = vertices
                        .iter()
                        .zip(vertex_seeds)
                        .filter_map(|(&vertex, &seed)| {
                            let mut rng = StdRng::seed_from_u64(seed);
                            majority_label(&neighbors[vertex], snapshot, &mut rng)
                                .map(|vote| VertexUpdate { vertex, vote })
                        })
                        .collect();
                    // Receiver outlives the scope; a send can only fail if it was dropped.
                    let _ = update_tx.send(updates);
                });
            }
        });
        drop(update_tx);

        let mut labels = snapshot.to_vec();
        let mut changed = 0;
        let mut ties = 0;
        for updates in update_rx.iter() {
            for update in updates {
                if update.vote.tied {
                    ties += 1;
                }
                if update.vote.label != snapshot[update.vertex] {
                    labels[update.vertex] = update.vote.label;
                    changed += 1;
                }
            }
        }
        PassOutcome {
            labels,
            changed,
            ties,
        }
    }
}

impl Default for SnapshotChineseWhispers {
    fn default() -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(threads, ConvergenceRule::default())
    }
}

impl ClusterEngine for SnapshotChineseWhispers {
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
            let seeds: Vec<u64> = order.iter().map(|_| rng.next_u64()).collect();

            let outcome = self.run_pass(&order, &seeds, &neighbors, &labels);
            labels = outcome.labels;
            log::trace!(
                "Pass {iteration}: {} labels changed, {} ties ({} threads)",
                outcome.changed,
                outcome.ties,
                self.threads
            );

            if self.convergence.is_stable(outcome.changed, outcome.ties) {
                log::debug!("Snapshot propagation converged after {iteration} passes");
                return ClusterAssignment::new(labels, iteration, Termination::Converged);
            }
        }

        log::debug!("Snapshot propagation stopped at the {max_iterations}-pass budget");
        ClusterAssignment::new(labels, max_iterations, Termination::IterationBudgetExhausted)
    }
}
