use crate::rendering::domain::box_renderer::BoxRenderer;
use crate::rendering::domain::palette::Color;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Draws rectangle outlines straight into the frame's pixel buffer.
///
/// The outline grows inward from the box edges. Boxes that cross the
/// image border are clipped; boxes entirely outside are skipped.
pub struct FrameBoxRenderer;

impl FrameBoxRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FrameBoxRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl BoxRenderer for FrameBoxRenderer {
    fn draw_rectangle(
        &self,
        frame: &mut Frame,
        face: &BoundingBox,
        color: Color,
        thickness: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() < 3 {
            return Err(format!(
                "Cannot draw colored boxes on a {}-channel frame",
                frame.channels()
            )
            .into());
        }
        let Some(visible) = face.clamp_to(frame.width(), frame.height()) else {
            log::debug!("Skipping face outside the image: {face:?}");
            return Ok(());
        };

        let t = thickness.max(1).min(i32::MAX as u32) as i32;
        let rgb = color.rgb();
        let mut pixels = frame.as_ndarray_mut();

        for y in visible.y..visible.bottom() {
            let on_horizontal_edge =
                y < face.y.saturating_add(t) || y >= face.bottom().saturating_sub(t);
            for x in visible.x..visible.right() {
                let on_vertical_edge =
                    x < face.x.saturating_add(t) || x >= face.right().saturating_sub(t);
                if !(on_horizontal_edge || on_vertical_edge) {
                    continue;
                }
                for (c, value) in rgb.iter().enumerate() {
                    pixels[[y as usize, x as usize, c]] = *value;
                }
            }
        }
        Ok(())
    }
}
