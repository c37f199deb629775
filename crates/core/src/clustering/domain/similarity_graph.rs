use std::collections::BTreeSet;

use crate::clustering::domain::cluster_error::{validate_threshold, ClusterError};
use crate::shared::embedding::EmbeddingSet;

/// Unordered vertex pair, normalized so that `a <= b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    a: usize,
    b: usize,
}

impl Edge {
    pub fn new(i: usize, j: usize) -> Self {
        if i <= j {
            Self { a: i, b: j }
        } else {
            Self { a: j, b: i }
        }
    }

    pub fn a(&self) -> usize {
        self.a
    }

    pub fn b(&self) -> usize {
        self.b
    }

    pub fn is_self_loop(&self) -> bool {
        self.a == self.b
    }
}

/// Unweighted graph linking faces whose embeddings are close.
///
/// Vertices are `0..vertex_count`. Every vertex carries a self-loop so it
/// always votes for its own label during propagation. Edges are kept
/// sorted, which makes `contains_edge` a binary search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimilarityGraph {
    vertex_count: usize,
    edges: Vec<Edge>,
}

impl SimilarityGraph {
    /// Links every pair `i <= j` whose Euclidean distance is strictly below
    /// `threshold`. O(N²) distance evaluations.
    pub fn build(embeddings: &EmbeddingSet, threshold: f64) -> Result<Self, ClusterError> {
        validate_threshold(threshold)?;

        let n = embeddings.len();
        let mut edges = Vec::with_capacity(n);
        for i in 0..n {
            edges.push(Edge::new(i, i));
            for j in (i + 1)..n {
                if embeddings.distance(i, j) < threshold {
                    edges.push(Edge::new(i, j));
                }
            }
        }

        log::debug!(
            "Built similarity graph: {n} vertices, {} edges (threshold={threshold})",
            edges.len()
        );
        Ok(Self {
            vertex_count: n,
            edges,
        })
    }

    /// Graph over `vertex_count` vertices from explicit pairs.
    ///
    /// Pairs may be given in either orientation and may repeat; missing
    /// self-loops are added.
    pub fn from_edges(vertex_count: usize, pairs: &[(usize, usize)]) -> Result<Self, ClusterError> {
        let mut edges: BTreeSet<Edge> = (0..vertex_count).map(|i| Edge::new(i, i)).collect();
        for &(a, b) in pairs {
            if a >= vertex_count || b >= vertex_count {
                return Err(ClusterError::EdgeOutOfRange { a, b, vertex_count });
            }
            edges.insert(Edge::new(a, b));
        }
        Ok(Self {
            vertex_count,
            edges: edges.into_iter().collect(),
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Order-insensitive edge lookup.
    pub fn contains_edge(&self, i: usize, j: usize) -> bool {
        self.edges.binary_search(&Edge::new(i, j)).is_ok()
    }

    /// Adjacency lists. A self-loop lists the vertex once; `(i, j)` lists
    /// `j` under `i` and `i` under `j`.
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.vertex_count];
        for edge in &self.edges {
            adjacency[edge.a].push(edge.b);
            if !edge.is_self_loop() {
                adjacency[edge.b].push(edge.a);
            }
        }
        adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::EMBEDDING_DIM;
    use crate::shared::embedding::Embedding;

    fn on_axis(value: f64) -> Embedding {
        let mut e = [0.0; EMBEDDING_DIM];
        e[0] = value;
        e
    }

    fn set(values: &[f64]) -> EmbeddingSet {
        let embeddings: Vec<Embedding> = values.iter().map(|&v| on_axis(v)).collect();
        EmbeddingSet::new(&embeddings).unwrap()
    }

    #[test]
    fn test_empty_embeddings_give_empty_graph() {
        let graph = SimilarityGraph::build(&EmbeddingSet::empty(), 0.6).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_every_vertex_has_self_loop() {
        let graph = SimilarityGraph::build(&set(&[0.0, 5.0, 10.0]), 0.6).unwrap();
        for i in 0..3 {
            assert!(graph.contains_edge(i, i));
        }
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_self_loop_kept_with_zero_threshold() {
        let graph = SimilarityGraph::build(&set(&[0.0, 0.0]), 0.0).unwrap();
        assert!(graph.contains_edge(0, 0));
        assert!(graph.contains_edge(1, 1));
        assert!(!graph.contains_edge(0, 1));
    }

    #[test]
    fn test_star_scenario_edges() {
        // d(0,1) = 0.3, d(0,2) = 0.4, d(1,2) = 0.7
        let graph = SimilarityGraph::build(&set(&[0.0, 0.3, -0.4]), 0.6).unwrap();
        let expected = vec![
            Edge::new(0, 0),
            Edge::new(0, 1),
            Edge::new(0, 2),
            Edge::new(1, 1),
            Edge::new(2, 2),
        ];
        assert_eq!(graph.edges(), expected.as_slice());
    }

    #[test]
    fn test_threshold_is_strict() {
        let embeddings = set(&[0.0, 0.5]);
        let at = SimilarityGraph::build(&embeddings, 0.5).unwrap();
        assert!(!at.contains_edge(0, 1));
        let above = SimilarityGraph::build(&embeddings, 0.500_001).unwrap();
        assert!(above.contains_edge(0, 1));
    }

    #[test]
    fn test_lookup_is_symmetric() {
        let graph = SimilarityGraph::build(&set(&[0.0, 0.1, 3.0]), 0.6).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(graph.contains_edge(i, j), graph.contains_edge(j, i));
            }
        }
        assert!(graph.edges().iter().all(|e| e.a() <= e.b()));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err = SimilarityGraph::build(&set(&[0.0]), -1.0).unwrap_err();
        assert_eq!(err, ClusterError::InvalidThreshold(-1.0));
    }

    #[test]
    fn test_neighbors_count_self_once() {
        let graph = SimilarityGraph::from_edges(3, &[(1, 0), (0, 2)]).unwrap();
        let adjacency = graph.neighbors();
        assert_eq!(adjacency[0], vec![0, 1, 2]);
        assert_eq!(adjacency[1], vec![0, 1]);
        assert_eq!(adjacency[2], vec![0, 2]);
    }

    #[test]
    fn test_from_edges_normalizes_and_deduplicates() {
        let graph = SimilarityGraph::from_edges(2, &[(1, 0), (0, 1), (1, 1)]).unwrap();
        assert_eq!(
            graph.edges(),
            &[Edge::new(0, 0), Edge::new(0, 1), Edge::new(1, 1)]
        );
    }

    #[test]
    fn test_from_edges_rejects_out_of_range() {
        let err = SimilarityGraph::from_edges(2, &[(0, 2)]).unwrap_err();
        assert_eq!(
            err,
            ClusterError::EdgeOutOfRange {
                a: 0,
                b: 2,
                vertex_count: 2
            }
        );
    }
}
