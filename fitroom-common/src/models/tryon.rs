// File: fitroom-common/src/models/tryon.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::generation::GenerationStatus;

/// Virtual try-on for one avatar wearing one garment set. Occasion independent,
/// so several outfits can point at the same row through `tryon_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tryon {
    pub tryon_id: String,
    pub user_id: String,
    pub avatar_id: String,
    pub tryon_key: String,
    pub status: GenerationStatus,
    pub image_key: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub generation_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tryon {
    pub fn new_pending(user_id: &str, avatar_id: &str, tryon_key: &str) -> Self {
        let now = Utc::now();
        Self {
            tryon_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            avatar_id: avatar_id.to_string(),
            tryon_key: tryon_key.to_string(),
            status: GenerationStatus::Pending,
            image_key: None,
            error_code: None,
            error_message: None,
            generation_started_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> TryonState {
        TryonState {
            id: self.tryon_id.clone(),
            status: self.status,
            image_key: self.image_key.clone(),
            error_code: self.error_code.clone(),
            error_message: self.error_message.clone(),
        }
    }
}

/// Try-on state as returned to callers of `generate_tryon`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TryonState {
    pub id: String,
    pub status: GenerationStatus,
    pub image_key: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}
