/// Length of every face embedding produced by the recognition network.
pub const EMBEDDING_DIM: usize = 128;

/// Faces closer than this in embedding space are linked in the similarity graph.
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 0.6;

/// Label propagation passes before giving up on convergence.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

pub const DEFAULT_PALETTE_SIZE: usize = 50;

/// Outline width in pixels for cluster rectangles.
pub const DEFAULT_BOX_THICKNESS: u32 = 4;

pub const DEFAULT_OUTPUT_PATH: &str = "output/output.jpg";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
