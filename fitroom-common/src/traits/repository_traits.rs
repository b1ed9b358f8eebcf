use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use crate::error::Error;
use crate::models::{Avatar, AvatarAnalysis, Garment, LeaseKind, Outfit, OutfitScore, Tryon};

/// Conditional status transition used by the lease manager.
#[async_trait]
pub trait LeaseRepository: Send + Sync {
    /// Atomically moves the row to `running` with `generation_started_at = now`, but only
    /// when it is `pending`, `failed`, or `running` with a lease older than `stale_before`.
    /// Must be a single guarded write; returns whether this caller won the claim.
    async fn try_claim(
        &self,
        kind: LeaseKind,
        id: &str,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<bool, Error>;
}

#[async_trait]
pub trait OutfitRepository: Send + Sync {
    /// Insert unless `(avatar_id, outfit_key)` already exists. `true` when a row was written.
    async fn insert_if_absent(&self, outfit: &Outfit) -> Result<bool, Error>;
    async fn get_outfit(&self, outfit_id: &str) -> Result<Option<Outfit>, Error>;
    async fn get_by_key(&self, avatar_id: &str, outfit_key: &str) -> Result<Option<Outfit>, Error>;
    async fn list_for_avatars(&self, user_id: &str, avatar_ids: &[String]) -> Result<Vec<Outfit>, Error>;

    /// Idempotent: an existing `(outfit, garment)` pair is left alone.
    async fn add_item(&self, outfit_id: &str, garment_id: &str) -> Result<(), Error>;
    async fn list_garment_ids(&self, outfit_id: &str) -> Result<Vec<String>, Error>;

    /// Completion writes only apply while the row still holds the lease stamped at
    /// `lease_started_at`. `false` means the lease was lost and nothing was written.
    async fn complete_score(
        &self,
        outfit_id: &str,
        lease_started_at: DateTime<Utc>,
        score: &OutfitScore,
    ) -> Result<bool, Error>;
    async fn fail_score(
        &self,
        outfit_id: &str,
        lease_started_at: DateTime<Utc>,
        error_code: &str,
        error_message: &str,
    ) -> Result<bool, Error>;
}

#[async_trait]
pub trait TryonRepository: Send + Sync {
    /// Insert unless `(avatar_id, tryon_key)` already exists. `true` when a row was written.
    async fn insert_if_absent(&self, tryon: &Tryon) -> Result<bool, Error>;
    async fn get_tryon(&self, tryon_id: &str) -> Result<Option<Tryon>, Error>;
    async fn get_by_key(&self, avatar_id: &str, tryon_key: &str) -> Result<Option<Tryon>, Error>;
    async fn list_for_avatars(&self, avatar_ids: &[String]) -> Result<Vec<Tryon>, Error>;

    async fn complete_tryon(
        &self,
        tryon_id: &str,
        lease_started_at: DateTime<Utc>,
        image_key: &str,
    ) -> Result<bool, Error>;
    async fn fail_tryon(
        &self,
        tryon_id: &str,
        lease_started_at: DateTime<Utc>,
        error_code: &str,
        error_message: &str,
    ) -> Result<bool, Error>;
}

#[async_trait]
pub trait AvatarRepository: Send + Sync {
    async fn get_avatar(&self, user_id: &str, avatar_id: &str) -> Result<Option<Avatar>, Error>;
    async fn latest_analysis(&self, avatar_id: &str) -> Result<Option<AvatarAnalysis>, Error>;
    async fn insert_analysis(&self, analysis: &AvatarAnalysis) -> Result<(), Error>;
    async fn set_body_profile(&self, avatar_id: &str, profile: &Value) -> Result<(), Error>;
}

#[async_trait]
pub trait GarmentRepository: Send + Sync {
    /// Returns the subset of `garment_ids` owned by `user_id`, in no particular order.
    async fn get_garments(&self, user_id: &str, garment_ids: &[String]) -> Result<Vec<Garment>, Error>;
}

/// Which user a stored object belongs to, judged by the rows that reference it.
#[async_trait]
pub trait ObjectOwnershipRepository: Send + Sync {
    /// `true` when `key` is an avatar photo, garment image, garment source photo or
    /// try-on result owned by `user_id`.
    async fn owns_object(&self, user_id: &str, key: &str) -> Result<bool, Error>;
}
