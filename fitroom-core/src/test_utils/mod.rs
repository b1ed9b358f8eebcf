// File: fitroom-core/src/test_utils/mod.rs

pub mod fixtures;
pub mod helpers;
pub mod memory;
pub mod transport;
