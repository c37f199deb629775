pub mod box_renderer;
pub mod image_reader;
pub mod image_writer;
pub mod palette;
