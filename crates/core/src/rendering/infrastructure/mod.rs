pub mod frame_box_renderer;
pub mod image_file_reader;
pub mod image_file_writer;
