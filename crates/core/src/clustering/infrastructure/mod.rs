pub mod engine_factory;
pub mod snapshot_chinese_whispers;
