pub mod clustering;
pub mod detection;
pub mod pipeline;
pub mod rendering;
pub mod shared;
