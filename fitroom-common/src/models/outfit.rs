// File: fitroom-common/src/models/outfit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::garment::Garment;
use crate::models::generation::GenerationStatus;
use crate::models::score::{OutfitScore, Verdict};
use crate::models::tryon::{Tryon, TryonState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outfit {
    pub outfit_id: String,
    pub user_id: String,
    pub avatar_id: String,
    /// Trimmed, lowercased occasion.
    pub occasion: String,
    /// Content key over avatar + garment set + occasion. Never changes after insert.
    pub outfit_key: String,
    /// Content key over avatar + garment set, shared with every same-garment outfit.
    pub tryon_key: String,
    pub status: GenerationStatus,
    pub score: Option<OutfitScore>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub generation_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Outfit {
    pub fn new_pending(
        user_id: &str,
        avatar_id: &str,
        occasion: &str,
        outfit_key: &str,
        tryon_key: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            outfit_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            avatar_id: avatar_id.to_string(),
            occasion: occasion.to_string(),
            outfit_key: outfit_key.to_string(),
            tryon_key: tryon_key.to_string(),
            status: GenerationStatus::Pending,
            score: None,
            error_code: None,
            error_message: None,
            generation_started_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn score_state(&self) -> ScoreState {
        ScoreState {
            status: self.status,
            score: self.score.clone(),
            error_code: self.error_code.clone(),
            error_message: self.error_message.clone(),
        }
    }
}

/// Result of `create_outfit`: `cached` is true when an identical outfit already existed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOutfit {
    pub outfit_id: String,
    pub cached: bool,
}

/// Scoring state as returned to callers of `generate_score`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreState {
    pub status: GenerationStatus,
    pub score: Option<OutfitScore>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitDetail {
    pub outfit_id: String,
    pub avatar_id: String,
    pub occasion: String,
    pub score: ScoreState,
    pub garments: Vec<Garment>,
    pub tryon: Option<TryonState>,
    pub created_at: DateTime<Utc>,
}

impl OutfitDetail {
    pub fn new(outfit: &Outfit, garments: Vec<Garment>, tryon: Option<&Tryon>) -> Self {
        Self {
            outfit_id: outfit.outfit_id.clone(),
            avatar_id: outfit.avatar_id.clone(),
            occasion: outfit.occasion.clone(),
            score: outfit.score_state(),
            garments,
            tryon: tryon.map(Tryon::state),
            created_at: outfit.created_at,
        }
    }
}

/// List row with the score and try-on status denormalized in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutfitSummary {
    pub outfit_id: String,
    pub avatar_id: String,
    pub occasion: String,
    pub status: GenerationStatus,
    pub overall_score: Option<i64>,
    pub verdict: Option<Verdict>,
    pub tryon_status: Option<GenerationStatus>,
    pub tryon_image_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OutfitSummary {
    pub fn new(outfit: &Outfit, tryon: Option<&Tryon>) -> Self {
        Self {
            outfit_id: outfit.outfit_id.clone(),
            avatar_id: outfit.avatar_id.clone(),
            occasion: outfit.occasion.clone(),
            status: outfit.status,
            overall_score: outfit.score.as_ref().map(|s| s.scores.overall),
            verdict: outfit.score.as_ref().map(|s| s.verdict),
            tryon_status: tryon.map(|t| t.status),
            tryon_image_key: tryon.and_then(|t| t.image_key.clone()),
            created_at: outfit.created_at,
        }
    }
}

/// Summaries for one avatar, as returned by `list_outfits_by_avatars`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarOutfits {
    pub avatar_id: String,
    pub outfits: Vec<OutfitSummary>,
}
