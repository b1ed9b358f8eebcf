// File: fitroom-core/src/services/outfit_service.rs
//
// Outfit creation, scoring and try-on. Every decision is re-derived from persisted
// state; concurrent requests are coordinated only through leases.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use sqlx::{Pool, Postgres};
use tracing::{debug, info, warn};
use uuid::Uuid;

use fitroom_ai::{ContentPart, GatewayError, GenerationGateway, ImageInput, ImageRequest, JsonRequest};
use fitroom_common::models::{
    AvatarAnalysis, AvatarAnalysisError, AvatarAnalysisResult, AvatarBodyProfile, AvatarOutfits,
    CreatedOutfit, FailureCode, Garment, LeaseKind, Outfit, OutfitDetail, OutfitScore,
    OutfitSummary, ScoreState, Tryon, TryonState,
};
use fitroom_common::traits::repository_traits::{
    AvatarRepository, GarmentRepository, LeaseRepository, ObjectOwnershipRepository, OutfitRepository,
    TryonRepository,
};
use fitroom_common::traits::storage_traits::BlobStore;

use crate::config::GenerationSettings;
use crate::imaging;
use crate::prompts::avatar::build_avatar_prompt;
use crate::prompts::score::{build_score_prompt, ScoreInput};
use crate::prompts::tryon::build_tryon_prompt;
use crate::repositories::postgres::{
    PostgresAvatarRepository, PostgresGarmentRepository, PostgresLeaseRepository,
    PostgresObjectRepository, PostgresOutfitRepository, PostgresTryonRepository,
};
use crate::services::content_key::{canonical_ids, canonical_occasion, derive_outfit_key, derive_tryon_key};
use crate::services::lease::{Lease, LeaseManager};
use crate::Error;

/// Persistence and storage collaborators of [`OutfitService`].
#[derive(Clone)]
pub struct OutfitStores {
    pub outfits: Arc<dyn OutfitRepository>,
    pub tryons: Arc<dyn TryonRepository>,
    pub avatars: Arc<dyn AvatarRepository>,
    pub garments: Arc<dyn GarmentRepository>,
    pub leases: Arc<dyn LeaseRepository>,
    pub objects: Arc<dyn ObjectOwnershipRepository>,
    pub blobs: Arc<dyn BlobStore>,
}

impl OutfitStores {
    pub fn postgres(pool: Pool<Postgres>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            outfits: Arc::new(PostgresOutfitRepository::new(pool.clone())),
            tryons: Arc::new(PostgresTryonRepository::new(pool.clone())),
            avatars: Arc::new(PostgresAvatarRepository::new(pool.clone())),
            garments: Arc::new(PostgresGarmentRepository::new(pool.clone())),
            leases: Arc::new(PostgresLeaseRepository::new(pool.clone())),
            objects: Arc::new(PostgresObjectRepository::new(pool)),
            blobs,
        }
    }
}

/// What came of an avatar body analysis.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AvatarAnalysisOutcome {
    /// Profile stored on the avatar.
    Analyzed { profile: AvatarBodyProfile },
    /// The model refused the photo (several people, not full body, ...).
    Rejected { error: AvatarAnalysisError },
    /// The model call itself failed.
    Failed { error_code: String, error_message: String },
}

/// Reason a claimed generation ended in `failed`.
#[derive(Debug)]
struct GenerationFailure {
    code: &'static str,
    message: String,
}

impl GenerationFailure {
    fn new(code: FailureCode, message: impl Into<String>) -> Self {
        Self { code: code.as_str(), message: message.into() }
    }
}

impl From<GatewayError> for GenerationFailure {
    fn from(err: GatewayError) -> Self {
        Self { code: err.code(), message: err.to_string() }
    }
}

impl From<Error> for GenerationFailure {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::NotFound(_) | Error::Storage(_) | Error::Io(_) => FailureCode::StorageError,
            _ => FailureCode::GenerationError,
        };
        Self::new(code, err.to_string())
    }
}

/// First `max_chars` characters of `message`.
pub fn bound_message(message: &str, max_chars: usize) -> String {
    message.chars().take(max_chars).collect()
}

/// A raw analysis row is either the tagged envelope or a bare profile.
fn profile_from_analysis(raw: Value) -> Option<Value> {
    match raw.get("success").and_then(Value::as_bool) {
        Some(true) => raw.get("data").cloned(),
        Some(false) => None,
        None => Some(raw),
    }
}

pub struct OutfitService {
    stores: OutfitStores,
    leases: LeaseManager,
    gateway: Arc<GenerationGateway>,
    settings: GenerationSettings,
}

impl OutfitService {
    pub fn new(stores: OutfitStores, gateway: Arc<GenerationGateway>, settings: GenerationSettings) -> Self {
        let leases = LeaseManager::new(stores.leases.clone(), settings.stale_lease_after);
        Self { stores, leases, gateway, settings }
    }

    // ---------------------------------------------------------------------
    // Creation and reads
    // ---------------------------------------------------------------------

    /// Creates the outfit for `(avatar, garment set, occasion)` or returns the existing one.
    pub async fn create_outfit(
        &self,
        user_id: &str,
        avatar_id: &str,
        garment_ids: &[String],
        occasion: &str,
    ) -> Result<CreatedOutfit, Error> {
        let occasion = canonical_occasion(occasion);
        let ids = canonical_ids(garment_ids);
        if ids.is_empty() {
            return Err(Error::InvalidInput("at least one garment is required".into()));
        }
        if occasion.is_empty() {
            return Err(Error::InvalidInput("occasion is required".into()));
        }

        if self.stores.avatars.get_avatar(user_id, avatar_id).await?.is_none() {
            return Err(Error::AvatarNotFound(avatar_id.to_string()));
        }

        let owned_ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        let found: HashSet<String> = self.stores.garments
            .get_garments(user_id, &owned_ids)
            .await?
            .into_iter()
            .map(|g| g.garment_id)
            .collect();
        let missing: Vec<String> = owned_ids.iter().filter(|id| !found.contains(*id)).cloned().collect();
        if !missing.is_empty() {
            return Err(Error::MissingGarments(missing));
        }

        let outfit_key = derive_outfit_key(avatar_id, &owned_ids, &occasion);
        let tryon_key = derive_tryon_key(avatar_id, &owned_ids);

        let candidate = Outfit::new_pending(user_id, avatar_id, &occasion, &outfit_key, &tryon_key);
        let (outfit_id, cached) = if self.stores.outfits.insert_if_absent(&candidate).await? {
            (candidate.outfit_id, false)
        } else {
            let existing = self.stores.outfits
                .get_by_key(avatar_id, &outfit_key)
                .await?
                .ok_or_else(|| Error::NotFound(format!("outfit with key {outfit_key}")))?;
            (existing.outfit_id, true)
        };

        for garment_id in &owned_ids {
            self.stores.outfits.add_item(&outfit_id, garment_id).await?;
        }
        self.ensure_tryon(user_id, avatar_id, &tryon_key).await?;

        info!(outfit_id = %outfit_id, avatar_id, occasion = %occasion, cached, "outfit ready");
        Ok(CreatedOutfit { outfit_id, cached })
    }

    pub async fn get_outfit(&self, user_id: &str, outfit_id: &str) -> Result<OutfitDetail, Error> {
        let outfit = self.owned_outfit(user_id, outfit_id).await?;
        let garments = self.outfit_garments(user_id, &outfit).await?;
        let tryon = self.stores.tryons.get_by_key(&outfit.avatar_id, &outfit.tryon_key).await?;
        Ok(OutfitDetail::new(&outfit, garments, tryon.as_ref()))
    }

    /// Bytes of a stored object the user owns. Anything else reads as not found.
    pub async fn read_object(&self, user_id: &str, key: &str) -> Result<Vec<u8>, Error> {
        if !self.stores.objects.owns_object(user_id, key).await? {
            debug!(user_id, key, "object not owned by caller");
            return Err(Error::NotFound(format!("object {key}")));
        }
        self.stores.blobs.get(key).await
    }

    pub async fn list_outfits(&self, user_id: &str, avatar_id: &str) -> Result<Vec<OutfitSummary>, Error> {
        if self.stores.avatars.get_avatar(user_id, avatar_id).await?.is_none() {
            return Err(Error::AvatarNotFound(avatar_id.to_string()));
        }
        let mut groups = self.list_outfits_by_avatars(user_id, &[avatar_id.to_string()]).await?;
        Ok(groups.pop().map(|g| g.outfits).unwrap_or_default())
    }

    /// One group per requested avatar, in request order, newest outfit first.
    pub async fn list_outfits_by_avatars(
        &self,
        user_id: &str,
        avatar_ids: &[String],
    ) -> Result<Vec<AvatarOutfits>, Error> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = avatar_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let outfits = self.stores.outfits.list_for_avatars(user_id, &ids).await?;
        let tryons: HashMap<(String, String), Tryon> = self.stores.tryons
            .list_for_avatars(&ids)
            .await?
            .into_iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| ((t.avatar_id.clone(), t.tryon_key.clone()), t))
            .collect();

        let mut grouped: HashMap<String, Vec<OutfitSummary>> = HashMap::new();
        for outfit in &outfits {
            let tryon = tryons.get(&(outfit.avatar_id.clone(), outfit.tryon_key.clone()));
            grouped
                .entry(outfit.avatar_id.clone())
                .or_default()
                .push(OutfitSummary::new(outfit, tryon));
        }

        Ok(ids
            .into_iter()
            .map(|avatar_id| {
                let mut outfits = grouped.remove(&avatar_id).unwrap_or_default();
                outfits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                AvatarOutfits { avatar_id, outfits }
            })
            .collect())
    }

    // ---------------------------------------------------------------------
    // Scoring
    // ---------------------------------------------------------------------

    /// Scores the outfit unless another caller holds a live lease, in which case the
    /// current state is returned without calling the model.
    pub async fn generate_score(&self, user_id: &str, outfit_id: &str) -> Result<ScoreState, Error> {
        let outfit = self.owned_outfit(user_id, outfit_id).await?;

        let Some(lease) = self.leases.try_claim(LeaseKind::Outfit, &outfit.outfit_id).await? else {
            info!(outfit_id, status = %outfit.status, "score lease not acquired");
            return Ok(self.owned_outfit(user_id, outfit_id).await?.score_state());
        };

        match self.run_score(user_id, &outfit).await {
            Ok(score) => {
                let applied = self.stores.outfits.complete_score(outfit_id, lease.started_at, &score).await?;
                if applied {
                    info!(outfit_id, overall = score.scores.overall, verdict = ?score.verdict, "outfit scored");
                } else {
                    warn!(outfit_id, "score lease lost before completion; result dropped");
                }
            }
            Err(failure) => self.record_score_failure(outfit_id, &lease, failure).await?,
        }

        Ok(self.owned_outfit(user_id, outfit_id).await?.score_state())
    }

    async fn run_score(&self, user_id: &str, outfit: &Outfit) -> Result<OutfitScore, GenerationFailure> {
        let Some(profile) = self.resolve_profile(user_id, &outfit.avatar_id).await? else {
            return Err(GenerationFailure::new(
                FailureCode::AvatarNotAnalyzed,
                "Avatar has no body profile; analyze the avatar first",
            ));
        };

        let garments = self.outfit_garments(user_id, outfit).await?;
        let input = ScoreInput::new(&profile, &outfit.occasion, &garments);
        let prompt = build_score_prompt(&input).map_err(Error::from)?;

        let request = JsonRequest::new(&self.settings.score_model, prompt)
            .with_timeout(self.settings.score_timeout);
        Ok(self.gateway.generate_json::<OutfitScore>(&request).await?)
    }

    async fn record_score_failure(
        &self,
        outfit_id: &str,
        lease: &Lease,
        failure: GenerationFailure,
    ) -> Result<(), Error> {
        let message = bound_message(&failure.message, self.settings.max_error_message_chars);
        warn!(outfit_id, code = failure.code, error = %message, "outfit scoring failed");
        let applied = self.stores.outfits
            .fail_score(outfit_id, lease.started_at, failure.code, &message)
            .await?;
        if !applied {
            warn!(outfit_id, "score lease lost before failure was recorded");
        }
        Ok(())
    }

    /// Stored clean profile, else the latest raw analysis.
    async fn resolve_profile(&self, user_id: &str, avatar_id: &str) -> Result<Option<Value>, Error> {
        let Some(avatar) = self.stores.avatars.get_avatar(user_id, avatar_id).await? else {
            return Ok(None);
        };
        if let Some(profile) = avatar.body_profile.filter(|p| !p.is_null()) {
            return Ok(Some(profile));
        }
        Ok(self.stores.avatars
            .latest_analysis(avatar_id)
            .await?
            .and_then(|a| profile_from_analysis(a.raw_json)))
    }

    // ---------------------------------------------------------------------
    // Try-on
    // ---------------------------------------------------------------------

    /// Generates (or returns) the try-on shared by every outfit with this avatar and garment set.
    pub async fn generate_tryon(&self, user_id: &str, outfit_id: &str) -> Result<TryonState, Error> {
        let outfit = self.owned_outfit(user_id, outfit_id).await?;
        let tryon = self.ensure_tryon(user_id, &outfit.avatar_id, &outfit.tryon_key).await?;

        let Some(lease) = self.leases.try_claim(LeaseKind::Tryon, &tryon.tryon_id).await? else {
            info!(outfit_id, tryon_id = %tryon.tryon_id, status = %tryon.status, "try-on lease not acquired");
            return self.tryon_state(&tryon.tryon_id).await;
        };

        match self.run_tryon(user_id, &outfit).await {
            Ok(image_key) => {
                let applied = self.stores.tryons
                    .complete_tryon(&tryon.tryon_id, lease.started_at, &image_key)
                    .await?;
                if applied {
                    info!(outfit_id, tryon_id = %tryon.tryon_id, image_key = %image_key, "try-on generated");
                } else {
                    warn!(tryon_id = %tryon.tryon_id, "try-on lease lost before completion; discarding image");
                    if let Err(e) = self.stores.blobs.delete(&image_key).await {
                        warn!(image_key = %image_key, error = %e, "failed to delete orphaned try-on image");
                    }
                }
            }
            Err(failure) => {
                let message = bound_message(&failure.message, self.settings.max_error_message_chars);
                warn!(tryon_id = %tryon.tryon_id, code = failure.code, error = %message, "try-on failed");
                let applied = self.stores.tryons
                    .fail_tryon(&tryon.tryon_id, lease.started_at, failure.code, &message)
                    .await?;
                if !applied {
                    warn!(tryon_id = %tryon.tryon_id, "try-on lease lost before failure was recorded");
                }
            }
        }

        self.tryon_state(&tryon.tryon_id).await
    }

    async fn run_tryon(&self, user_id: &str, outfit: &Outfit) -> Result<String, GenerationFailure> {
        let photo_key = self.stores.avatars
            .get_avatar(user_id, &outfit.avatar_id)
            .await?
            .and_then(|a| a.source_photo_key)
            .ok_or_else(|| GenerationFailure::new(FailureCode::AvatarNoPhoto, "Avatar has no source photo"))?;

        let garments = self.outfit_garments(user_id, outfit).await?;
        if garments.is_empty() {
            return Err(GenerationFailure::new(FailureCode::OutfitNoGarments, "Outfit has no garments"));
        }

        let person = self.load_image(&photo_key).await?;
        let garment_images = try_join_all(garments.iter().map(|g| self.garment_image(g))).await?;

        let mut parts = Vec::with_capacity(garment_images.len() + 2);
        parts.push(ContentPart::Text(build_tryon_prompt(&garments)));
        parts.push(ContentPart::Image(person));
        parts.extend(garment_images.into_iter().map(ContentPart::Image));

        info!(outfit_id = %outfit.outfit_id, images = garments.len() + 1, "requesting try-on image");
        let request = ImageRequest::new(&self.settings.tryon_model, parts)
            .with_timeout(self.settings.tryon_timeout);
        let generated = self.gateway.generate_image(&request).await?;

        let jpeg = imaging::normalize_to_jpeg(&generated.data)?;
        let image_key = format!("tryons/{}.jpg", Uuid::new_v4());
        self.stores.blobs.put(&image_key, &jpeg, "image/jpeg").await?;
        Ok(image_key)
    }

    async fn load_image(&self, key: &str) -> Result<ImageInput, Error> {
        let bytes = self.stores.blobs.get(key).await?;
        let mime = imaging::sniff_mime(&bytes);
        Ok(ImageInput::new(bytes, mime))
    }

    /// Full garment image, or a padded crop of the shared source photo when a box is known.
    async fn garment_image(&self, garment: &Garment) -> Result<ImageInput, Error> {
        let Some((source_key, bbox)) = garment.crop_source() else {
            return self.load_image(&garment.image_key).await;
        };

        let source = self.stores.blobs.get(source_key).await?;
        let padding = self.settings.bbox_padding;
        let cropped = tokio::task::spawn_blocking(move || imaging::crop_to_jpeg(&source, &bbox, padding))
            .await
            .map_err(|e| Error::Image(format!("crop task failed: {e}")))??;
        Ok(ImageInput::new(cropped, "image/jpeg"))
    }

    async fn ensure_tryon(&self, user_id: &str, avatar_id: &str, tryon_key: &str) -> Result<Tryon, Error> {
        if let Some(existing) = self.stores.tryons.get_by_key(avatar_id, tryon_key).await? {
            return Ok(existing);
        }
        self.stores.tryons
            .insert_if_absent(&Tryon::new_pending(user_id, avatar_id, tryon_key))
            .await?;
        self.stores.tryons
            .get_by_key(avatar_id, tryon_key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("try-on with key {tryon_key}")))
    }

    async fn tryon_state(&self, tryon_id: &str) -> Result<TryonState, Error> {
        self.stores.tryons
            .get_tryon(tryon_id)
            .await?
            .map(|t| t.state())
            .ok_or_else(|| Error::NotFound(format!("try-on {tryon_id}")))
    }

    // ---------------------------------------------------------------------
    // Avatar analysis
    // ---------------------------------------------------------------------

    /// Runs body analysis on the avatar photo. The raw model answer is always kept;
    /// only a successful profile becomes the avatar's body profile.
    pub async fn analyze_avatar(&self, user_id: &str, avatar_id: &str) -> Result<AvatarAnalysisOutcome, Error> {
        let avatar = self.stores.avatars
            .get_avatar(user_id, avatar_id)
            .await?
            .ok_or_else(|| Error::AvatarNotFound(avatar_id.to_string()))?;
        let photo_key = avatar
            .source_photo_key
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("avatar has no source photo".into()))?;

        let photo = self.load_image(photo_key).await?;
        let request = JsonRequest::new(&self.settings.analysis_model, build_avatar_prompt(avatar.height_cm))
            .with_images(vec![photo])
            .with_timeout(self.settings.analysis_timeout);

        let result = match self.gateway.generate_json::<AvatarAnalysisResult>(&request).await {
            Ok(result) => result,
            Err(err) => {
                warn!(avatar_id, code = err.code(), error = %err, "avatar analysis failed");
                return Ok(AvatarAnalysisOutcome::Failed {
                    error_code: err.code().to_string(),
                    error_message: bound_message(&err.to_string(), self.settings.max_error_message_chars),
                });
            }
        };

        self.stores.avatars
            .insert_analysis(&AvatarAnalysis {
                analysis_id: Uuid::new_v4().to_string(),
                avatar_id: avatar_id.to_string(),
                model: self.settings.analysis_model.clone(),
                raw_json: serde_json::to_value(&result)?,
                created_at: chrono::Utc::now(),
            })
            .await?;

        match result {
            AvatarAnalysisResult::Profile(profile) => {
                self.stores.avatars
                    .set_body_profile(avatar_id, &serde_json::to_value(&profile)?)
                    .await?;
                info!(avatar_id, shape = %profile.body_shape_label, "avatar analyzed");
                Ok(AvatarAnalysisOutcome::Analyzed { profile })
            }
            AvatarAnalysisResult::Rejected(error) => {
                info!(avatar_id, code = ?error.code, "avatar photo rejected by analysis");
                Ok(AvatarAnalysisOutcome::Rejected { error })
            }
        }
    }

    // ---------------------------------------------------------------------
    // Shared lookups
    // ---------------------------------------------------------------------

    async fn owned_outfit(&self, user_id: &str, outfit_id: &str) -> Result<Outfit, Error> {
        self.stores.outfits
            .get_outfit(outfit_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("outfit {outfit_id}")))
    }

    /// Garments of the outfit in item order. Garments deleted since creation are skipped.
    async fn outfit_garments(&self, user_id: &str, outfit: &Outfit) -> Result<Vec<Garment>, Error> {
        let ids = self.stores.outfits.list_garment_ids(&outfit.outfit_id).await?;
        let mut by_id: HashMap<String, Garment> = self.stores.garments
            .get_garments(user_id, &ids)
            .await?
            .into_iter()
            .map(|g| (g.garment_id.clone(), g))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}
