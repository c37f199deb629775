use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::clustering::domain::chinese_whispers::ChineseWhispers;
use crate::clustering::domain::cluster_assignment::ClusterAssignment;
use crate::clustering::domain::cluster_engine::ClusterEngine;
use crate::clustering::domain::cluster_error::{validate_threshold, ClusterError};
use crate::clustering::domain::similarity_graph::SimilarityGraph;
use crate::shared::embedding::{Embedding, EmbeddingSet};

/// Embeddings in, cluster labels out: builds the similarity graph and
/// hands it to a [`ClusterEngine`].
pub struct FaceClusterer {
    engine: Box<dyn ClusterEngine>,
    threshold: f64,
    max_iterations: u32,
}

impl FaceClusterer {
    pub fn new(
        engine: Box<dyn ClusterEngine>,
        threshold: f64,
        max_iterations: u32,
    ) -> Result<Self, ClusterError> {
        validate_threshold(threshold)?;
        Ok(Self {
            engine,
            threshold,
            max_iterations,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn build_graph(&self, embeddings: &EmbeddingSet) -> Result<SimilarityGraph, ClusterError> {
        SimilarityGraph::build(embeddings, self.threshold)
    }

    pub fn cluster_graph(&self, graph: &SimilarityGraph, rng: &mut dyn RngCore) -> ClusterAssignment {
        self.engine.cluster(graph, self.max_iterations, rng)
    }

    pub fn cluster(
        &self,
        embeddings: &EmbeddingSet,
        rng: &mut dyn RngCore,
    ) -> Result<ClusterAssignment, ClusterError> {
        let graph = self.build_graph(embeddings)?;
        Ok(self.cluster_graph(&graph, rng))
    }
}

/// Clusters raw embeddings with sequential Chinese Whispers seeded by `seed`.
pub fn cluster_embeddings(
    embeddings: &[Embedding],
    threshold: f64,
    max_iterations: u32,
    seed: u64,
) -> Result<ClusterAssignment, ClusterError> {
    let set = EmbeddingSet::new(embeddings)?;
    let clusterer = FaceClusterer::new(
        Box::new(ChineseWhispers::default()),
        threshold,
        max_iterations,
    )?;
    let mut rng = StdRng::seed_from_u64(seed);
    clusterer.cluster(&set, &mut rng)
}
