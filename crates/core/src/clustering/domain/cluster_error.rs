use thiserror::Error;

/// Invalid input to the clustering core.
///
/// Every variant is raised before graph construction; once inputs pass
/// validation, graph building and label propagation cannot fail.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClusterError {
    #[error("similarity threshold must be a non-negative number, got {0}")]
    InvalidThreshold(f64),
    #[error("embedding {index} has {actual} components, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("embedding {index} contains a non-finite component")]
    NonFiniteComponent { index: usize },
    #[error("clustered {labels} faces but {metadata} detections were supplied")]
    LengthMismatch { labels: usize, metadata: usize },
    #[error("face {index} has an invalid bounding box")]
    InvalidBoundingBox { index: usize },
    #[error("edge ({a}, {b}) references a vertex outside 0..{vertex_count}")]
    EdgeOutOfRange {
        a: usize,
        b: usize,
        vertex_count: usize,
    },
}

pub fn validate_threshold(threshold: f64) -> Result<(), ClusterError> {
    if threshold >= 0.0 {
        Ok(())
    } else {
        Err(ClusterError::InvalidThreshold(threshold))
    }
}
