// src/services/mod.rs

pub mod content_key;
pub mod lease;
pub mod outfit_service;

pub use content_key::{derive_outfit_key, derive_tryon_key};
pub use lease::{Lease, LeaseManager};
pub use outfit_service::{AvatarAnalysisOutcome, OutfitService, OutfitStores};
