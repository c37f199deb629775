use crate::rendering::domain::palette::Color;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for marking a face on the image.
///
/// Implementations modify the frame in-place.
pub trait BoxRenderer: Send {
    fn draw_rectangle(
        &self,
        frame: &mut Frame,
        face: &BoundingBox,
        color: Color,
        thickness: u32,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
