pub mod bounding_box;
pub mod constants;
pub mod embedding;
pub mod frame;
pub mod settings;
