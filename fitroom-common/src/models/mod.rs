// File: fitroom-common/src/models/mod.rs
pub mod generation;
pub mod score;
pub mod avatar;
pub mod garment;
pub mod outfit;
pub mod tryon;

pub use generation::{FailureCode, GenerationStatus, LeaseKind};
pub use score::{OutfitScore, ScoreBreakdown, Verdict};
pub use avatar::{
    Avatar, AvatarAnalysis, AvatarAnalysisError, AvatarAnalysisErrorCode, AvatarAnalysisResult,
    AvatarBodyProfile,
};
pub use garment::{BoundingBox, Garment};
pub use outfit::{AvatarOutfits, CreatedOutfit, Outfit, OutfitDetail, OutfitSummary, ScoreState};
pub use tryon::{Tryon, TryonState};
