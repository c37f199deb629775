use std::path::Path;

use crate::rendering::domain::image_reader::ImageReader;
use crate::shared::frame::Frame;

/// Decodes any format supported by the `image` crate into an RGB frame.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::open(path)
            .map_err(|e| format!("Failed to open image {}: {e}", path.display()))?
            .to_rgb8();
        let (width, height) = img.dimensions();
        log::debug!("Decoded {} ({width}x{height})", path.display());
        Ok(Frame::new(img.into_raw(), width, height, 3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_png_as_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        let img = image::RgbImage::from_pixel(6, 4, image::Rgb([9, 8, 7]));
        img.save(&path).unwrap();

        let frame = ImageFileReader::new().read(&path).unwrap();
        assert_eq!(frame.width(), 6);
        assert_eq!(frame.height(), 4);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.pixel(5, 3), &[9, 8, 7]);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ImageFileReader::new().read(&dir.path().join("nope.png"));
        assert!(result.is_err());
    }
}
