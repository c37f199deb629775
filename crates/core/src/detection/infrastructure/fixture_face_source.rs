//! Face detection and embedding backed by precomputed results.
//!
//! Reads a JSON document of the form
//! `{ "faces": [ { "bounding_box": {x, y, width, height}, "embedding": [..128 floats] } ] }`
//! and replays it through the [`FaceDetector`] and [`FaceEmbedder`]
//! interfaces, standing in for the detector and recognition network.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clustering::domain::cluster_error::ClusterError;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::EMBEDDING_DIM;
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;

/// Minimum overlap for a queried box to reuse a recorded embedding.
pub const MIN_MATCH_IOU: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixtureFace {
    pub bounding_box: BoundingBox,
    pub embedding: Vec<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceFixture {
    pub faces: Vec<FixtureFace>,
}

type RecordedFaces = Arc<Vec<(BoundingBox, Embedding)>>;

pub struct FixtureFaceSource {
    faces: RecordedFaces,
}

impl FixtureFaceSource {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read face fixture {}: {e}", path.display()))?;
        let fixture: FaceFixture = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid face fixture {}: {e}", path.display()))?;
        let source = Self::from_fixture(fixture)?;
        log::info!(
            "Loaded {} recorded faces from {}",
            source.len(),
            path.display()
        );
        Ok(source)
    }

    pub fn from_fixture(fixture: FaceFixture) -> Result<Self, ClusterError> {
        let mut faces = Vec::with_capacity(fixture.faces.len());
        for (index, face) in fixture.faces.into_iter().enumerate() {
            let embedding = Embedding::try_from(face.embedding.as_slice()).map_err(|_| {
                ClusterError::DimensionMismatch {
                    index,
                    expected: EMBEDDING_DIM,
                    actual: face.embedding.len(),
                }
            })?;
            if !face.bounding_box.is_valid() {
                return Err(ClusterError::InvalidBoundingBox { index });
            }
            faces.push((face.bounding_box, embedding));
        }
        Ok(Self::from_faces(faces))
    }

    pub fn from_faces(faces: Vec<(BoundingBox, Embedding)>) -> Self {
        Self {
            faces: Arc::new(faces),
        }
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn detector(&self) -> FixtureFaceDetector {
        FixtureFaceDetector {
            faces: Arc::clone(&self.faces),
        }
    }

    pub fn embedder(&self) -> FixtureFaceEmbedder {
        FixtureFaceEmbedder {
            faces: Arc::clone(&self.faces),
        }
    }
}

/// Reports every recorded box, in file order.
pub struct FixtureFaceDetector {
    faces: RecordedFaces,
}

impl FaceDetector for FixtureFaceDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        Ok(self.faces.iter().map(|(b, _)| *b).collect())
    }
}

/// Looks up the recorded embedding for a box: exact match first, then the
/// best-overlapping recorded box with IoU of at least [`MIN_MATCH_IOU`].
pub struct FixtureFaceEmbedder {
    faces: RecordedFaces,
}

impl FaceEmbedder for FixtureFaceEmbedder {
    fn embed(
        &mut self,
        _frame: &Frame,
        face: &BoundingBox,
    ) -> Result<Embedding, Box<dyn std::error::Error>> {
        if let Some((_, embedding)) = self.faces.iter().find(|(b, _)| b == face) {
            return Ok(*embedding);
        }

        let best = self
            .faces
            .iter()
            .map(|(b, e)| (b.iou(face), e))
            .filter(|(iou, _)| *iou >= MIN_MATCH_IOU)
            .max_by(|a, b| a.0.total_cmp(&b.0));

        match best {
            Some((_, embedding)) => Ok(*embedding),
            None => Err(format!(
                "No recorded embedding for face at ({}, {}) {}x{}",
                face.x, face.y, face.width, face.height
            )
            .into()),
        }
    }
}
