// File: fitroom-core/src/prompts/mod.rs

pub mod avatar;
pub mod score;
pub mod tryon;
