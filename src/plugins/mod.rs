pub mod core;
pub mod player;
pub mod saveload;
pub mod streaming;
pub mod worldgen;
