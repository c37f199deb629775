use crate::shared::bounding_box::BoundingBox;
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;

/// Domain interface for the landmark + recognition network stage.
///
/// Maps one detected face to a point in embedding space where faces of
/// the same person lie close together.
pub trait FaceEmbedder: Send {
    fn embed(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<Embedding, Box<dyn std::error::Error>>;

    /// Embeds every face in order. Batched networks may override this.
    fn embed_all(
        &mut self,
        frame: &Frame,
        faces: &[BoundingBox],
    ) -> Result<Vec<Embedding>, Box<dyn std::error::Error>> {
        faces.iter().map(|face| self.embed(frame, face)).collect()
    }
}
