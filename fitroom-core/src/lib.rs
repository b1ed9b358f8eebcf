// src/lib.rs

pub mod config;
pub mod db;
pub mod imaging;
pub mod prompts;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod test_utils;

pub use config::GenerationSettings;
pub use db::Database;
pub use fitroom_common::error::Error;
pub use services::lease::{Lease, LeaseManager};
pub use services::outfit_service::{AvatarAnalysisOutcome, OutfitService};
