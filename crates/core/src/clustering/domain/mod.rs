pub mod chinese_whispers;
pub mod cluster_assignment;
pub mod cluster_engine;
pub mod cluster_error;
pub mod face_clusterer;
pub mod similarity_graph;
