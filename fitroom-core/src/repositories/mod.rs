// src/repositories/mod.rs

pub mod postgres;

pub use fitroom_common::traits::repository_traits::{
    AvatarRepository, GarmentRepository, LeaseRepository, OutfitRepository, TryonRepository,
};
