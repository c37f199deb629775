use ndarray::{Array2, ArrayView1};

use crate::clustering::domain::cluster_error::ClusterError;
use crate::shared::constants::EMBEDDING_DIM;

/// A face descriptor in the learned similarity space.
pub type Embedding = [f64; EMBEDDING_DIM];

/// Ordered embeddings for one clustering run, one row per detected face.
///
/// Row `i` becomes vertex `i` of the similarity graph. Components are
/// validated on construction so graph building never sees NaN or
/// infinite values.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingSet {
    vectors: Array2<f64>,
}

impl EmbeddingSet {
    pub fn new(embeddings: &[Embedding]) -> Result<Self, ClusterError> {
        for (index, embedding) in embeddings.iter().enumerate() {
            check_finite(index, embedding)?;
        }
        let vectors =
            Array2::from_shape_fn((embeddings.len(), EMBEDDING_DIM), |(i, j)| embeddings[i][j]);
        Ok(Self { vectors })
    }

    /// Builds a set from variable-length rows, rejecting any row whose
    /// length differs from [`EMBEDDING_DIM`].
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ClusterError> {
        for (index, row) in rows.iter().enumerate() {
            if row.len() != EMBEDDING_DIM {
                return Err(ClusterError::DimensionMismatch {
                    index,
                    expected: EMBEDDING_DIM,
                    actual: row.len(),
                });
            }
            check_finite(index, row)?;
        }
        let vectors = Array2::from_shape_fn((rows.len(), EMBEDDING_DIM), |(i, j)| rows[i][j]);
        Ok(Self { vectors })
    }

    /// Wraps an `(N, EMBEDDING_DIM)` matrix.
    pub fn from_array(vectors: Array2<f64>) -> Result<Self, ClusterError> {
        if vectors.nrows() == 0 {
            return Ok(Self::empty());
        }
        if vectors.ncols() != EMBEDDING_DIM {
            return Err(ClusterError::DimensionMismatch {
                index: 0,
                expected: EMBEDDING_DIM,
                actual: vectors.ncols(),
            });
        }
        for (index, row) in vectors.rows().into_iter().enumerate() {
            if row.iter().any(|x| !x.is_finite()) {
                return Err(ClusterError::NonFiniteComponent { index });
            }
        }
        Ok(Self { vectors })
    }

    pub fn empty() -> Self {
        Self {
            vectors: Array2::zeros((0, EMBEDDING_DIM)),
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.vectors.row(index)
    }

    /// Euclidean distance between embeddings `i` and `j`.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        euclidean_distance(self.row(i), self.row(j))
    }
}

/// Component-wise squared differences are order-independent, so
/// `d(a, b) == d(b, a)` holds bit-for-bit.
pub fn euclidean_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn check_finite(index: usize, components: &[f64]) -> Result<(), ClusterError> {
    if components.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(ClusterError::NonFiniteComponent { index })
    }
}
