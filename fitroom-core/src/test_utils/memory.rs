// File: fitroom-core/src/test_utils/memory.rs

use std::collections::HashMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use fitroom_common::models::{
    Avatar, AvatarAnalysis, Garment, GenerationStatus, LeaseKind, Outfit, OutfitScore, Tryon,
};
use fitroom_common::traits::repository_traits::{
    AvatarRepository, GarmentRepository, LeaseRepository, ObjectOwnershipRepository, OutfitRepository,
    TryonRepository,
};
use fitroom_common::traits::storage_traits::BlobStore;

use crate::Error;

#[derive(Default)]
struct State {
    avatars: HashMap<String, Avatar>,
    analyses: Vec<AvatarAnalysis>,
    garments: HashMap<String, Garment>,
    outfits: HashMap<String, Outfit>,
    items: Vec<(String, String)>,
    tryons: HashMap<String, Tryon>,
}

/// In-memory stand-in for every repository. One mutex guards all tables, so each
/// trait call is atomic the way a single SQL statement is.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn claimable(status: GenerationStatus, started: Option<DateTime<Utc>>, stale_before: DateTime<Utc>) -> bool {
    match status {
        GenerationStatus::Pending | GenerationStatus::Failed => true,
        GenerationStatus::Running => started.is_none_or(|t| t < stale_before),
        GenerationStatus::Succeeded => false,
    }
}

fn holds_lease(status: GenerationStatus, started: Option<DateTime<Utc>>, lease: DateTime<Utc>) -> bool {
    status == GenerationStatus::Running && started == Some(lease)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_avatar(&self, avatar: Avatar) {
        self.state.lock().avatars.insert(avatar.avatar_id.clone(), avatar);
    }

    pub fn insert_garment(&self, garment: Garment) {
        self.state.lock().garments.insert(garment.garment_id.clone(), garment);
    }

    pub fn remove_garment(&self, garment_id: &str) {
        self.state.lock().garments.remove(garment_id);
    }

    /// Inserts a pending outfit with throwaway keys and returns its id.
    pub fn seed_outfit(&self, user_id: &str, avatar_id: &str, occasion: &str) -> String {
        let key = uuid::Uuid::new_v4().to_string();
        let outfit = Outfit::new_pending(user_id, avatar_id, occasion, &key, &key);
        let id = outfit.outfit_id.clone();
        self.state.lock().outfits.insert(id.clone(), outfit);
        id
    }

    pub fn outfit(&self, outfit_id: &str) -> Option<Outfit> {
        self.state.lock().outfits.get(outfit_id).cloned()
    }

    pub fn outfit_count(&self) -> usize {
        self.state.lock().outfits.len()
    }

    pub fn tryon(&self, tryon_id: &str) -> Option<Tryon> {
        self.state.lock().tryons.get(tryon_id).cloned()
    }

    pub fn tryon_count(&self) -> usize {
        self.state.lock().tryons.len()
    }

    pub fn item_count(&self, outfit_id: &str) -> usize {
        self.state.lock().items.iter().filter(|(o, _)| o == outfit_id).count()
    }

    pub fn avatar(&self, avatar_id: &str) -> Option<Avatar> {
        self.state.lock().avatars.get(avatar_id).cloned()
    }

    pub fn analyses(&self, avatar_id: &str) -> Vec<AvatarAnalysis> {
        self.state.lock().analyses.iter().filter(|a| a.avatar_id == avatar_id).cloned().collect()
    }

    /// Puts the row into `running` with the given lease timestamp, as a crashed worker would leave it.
    pub fn force_running(&self, kind: LeaseKind, id: &str, started_at: DateTime<Utc>) {
        let mut state = self.state.lock();
        match kind {
            LeaseKind::Outfit => {
                if let Some(o) = state.outfits.get_mut(id) {
                    o.status = GenerationStatus::Running;
                    o.generation_started_at = Some(started_at);
                }
            }
            LeaseKind::Tryon => {
                if let Some(t) = state.tryons.get_mut(id) {
                    t.status = GenerationStatus::Running;
                    t.generation_started_at = Some(started_at);
                }
            }
        }
    }
}

#[async_trait]
impl LeaseRepository for MemoryStore {
    async fn try_claim(
        &self,
        kind: LeaseKind,
        id: &str,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let mut state = self.state.lock();
        let claimed = match kind {
            LeaseKind::Outfit => match state.outfits.get_mut(id) {
                Some(o) if claimable(o.status, o.generation_started_at, stale_before) => {
                    o.status = GenerationStatus::Running;
                    o.generation_started_at = Some(now);
                    o.error_code = None;
                    o.error_message = None;
                    o.updated_at = now;
                    true
                }
                _ => false,
            },
            LeaseKind::Tryon => match state.tryons.get_mut(id) {
                Some(t) if claimable(t.status, t.generation_started_at, stale_before) => {
                    t.status = GenerationStatus::Running;
                    t.generation_started_at = Some(now);
                    t.error_code = None;
                    t.error_message = None;
                    t.updated_at = now;
                    true
                }
                _ => false,
            },
        };
        Ok(claimed)
    }
}

#[async_trait]
impl OutfitRepository for MemoryStore {
    async fn insert_if_absent(&self, outfit: &Outfit) -> Result<bool, Error> {
        let mut state = self.state.lock();
        let exists = state
            .outfits
            .values()
            .any(|o| o.avatar_id == outfit.avatar_id && o.outfit_key == outfit.outfit_key);
        if exists {
            return Ok(false);
        }
        state.outfits.insert(outfit.outfit_id.clone(), outfit.clone());
        Ok(true)
    }

    async fn get_outfit(&self, outfit_id: &str) -> Result<Option<Outfit>, Error> {
        Ok(self.outfit(outfit_id))
    }

    async fn get_by_key(&self, avatar_id: &str, outfit_key: &str) -> Result<Option<Outfit>, Error> {
        Ok(self
            .state
            .lock()
            .outfits
            .values()
            .find(|o| o.avatar_id == avatar_id && o.outfit_key == outfit_key)
            .cloned())
    }

    async fn list_for_avatars(&self, user_id: &str, avatar_ids: &[String]) -> Result<Vec<Outfit>, Error> {
        let mut outfits: Vec<Outfit> = self
            .state
            .lock()
            .outfits
            .values()
            .filter(|o| o.user_id == user_id && avatar_ids.contains(&o.avatar_id))
            .cloned()
            .collect();
        outfits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(outfits)
    }

    async fn add_item(&self, outfit_id: &str, garment_id: &str) -> Result<(), Error> {
        let mut state = self.state.lock();
        let pair = (outfit_id.to_string(), garment_id.to_string());
        if !state.items.contains(&pair) {
            state.items.push(pair);
        }
        Ok(())
    }

    async fn list_garment_ids(&self, outfit_id: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .state
            .lock()
            .items
            .iter()
            .filter(|(o, _)| o == outfit_id)
            .map(|(_, g)| g.clone())
            .collect())
    }

    async fn complete_score(
        &self,
        outfit_id: &str,
        lease_started_at: DateTime<Utc>,
        score: &OutfitScore,
    ) -> Result<bool, Error> {
        let mut state = self.state.lock();
        match state.outfits.get_mut(outfit_id) {
            Some(o) if holds_lease(o.status, o.generation_started_at, lease_started_at) => {
                o.status = GenerationStatus::Succeeded;
                o.score = Some(score.clone());
                o.error_code = None;
                o.error_message = None;
                o.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn fail_score(
        &self,
        outfit_id: &str,
        lease_started_at: DateTime<Utc>,
        error_code: &str,
        error_message: &str,
    ) -> Result<bool, Error> {
        let mut state = self.state.lock();
        match state.outfits.get_mut(outfit_id) {
            Some(o) if holds_lease(o.status, o.generation_started_at, lease_started_at) => {
                o.status = GenerationStatus::Failed;
                o.error_code = Some(error_code.to_string());
                o.error_message = Some(error_message.to_string());
                o.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TryonRepository for MemoryStore {
    async fn insert_if_absent(&self, tryon: &Tryon) -> Result<bool, Error> {
        let mut state = self.state.lock();
        let exists = state
            .tryons
            .values()
            .any(|t| t.avatar_id == tryon.avatar_id && t.tryon_key == tryon.tryon_key);
        if exists {
            return Ok(false);
        }
        state.tryons.insert(tryon.tryon_id.clone(), tryon.clone());
        Ok(true)
    }

    async fn get_tryon(&self, tryon_id: &str) -> Result<Option<Tryon>, Error> {
        Ok(self.tryon(tryon_id))
    }

    async fn get_by_key(&self, avatar_id: &str, tryon_key: &str) -> Result<Option<Tryon>, Error> {
        Ok(self
            .state
            .lock()
            .tryons
            .values()
            .find(|t| t.avatar_id == avatar_id && t.tryon_key == tryon_key)
            .cloned())
    }

    async fn list_for_avatars(&self, avatar_ids: &[String]) -> Result<Vec<Tryon>, Error> {
        Ok(self
            .state
            .lock()
            .tryons
            .values()
            .filter(|t| avatar_ids.contains(&t.avatar_id))
            .cloned()
            .collect())
    }

    async fn complete_tryon(
        &self,
        tryon_id: &str,
        lease_started_at: DateTime<Utc>,
        image_key: &str,
    ) -> Result<bool, Error> {
        let mut state = self.state.lock();
        match state.tryons.get_mut(tryon_id) {
            Some(t) if holds_lease(t.status, t.generation_started_at, lease_started_at) => {
                t.status = GenerationStatus::Succeeded;
                t.image_key = Some(image_key.to_string());
                t.error_code = None;
                t.error_message = None;
                t.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn fail_tryon(
        &self,
        tryon_id: &str,
        lease_started_at: DateTime<Utc>,
        error_code: &str,
        error_message: &str,
    ) -> Result<bool, Error> {
        let mut state = self.state.lock();
        match state.tryons.get_mut(tryon_id) {
            Some(t) if holds_lease(t.status, t.generation_started_at, lease_started_at) => {
                t.status = GenerationStatus::Failed;
                t.error_code = Some(error_code.to_string());
                t.error_message = Some(error_message.to_string());
                t.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl AvatarRepository for MemoryStore {
    async fn get_avatar(&self, user_id: &str, avatar_id: &str) -> Result<Option<Avatar>, Error> {
        Ok(self.avatar(avatar_id).filter(|a| a.user_id == user_id))
    }

    async fn latest_analysis(&self, avatar_id: &str) -> Result<Option<AvatarAnalysis>, Error> {
        Ok(self
            .state
            .lock()
            .analyses
            .iter()
            .filter(|a| a.avatar_id == avatar_id)
            .max_by_key(|a| a.created_at)
            .cloned())
    }

    async fn insert_analysis(&self, analysis: &AvatarAnalysis) -> Result<(), Error> {
        self.state.lock().analyses.push(analysis.clone());
        Ok(())
    }

    async fn set_body_profile(&self, avatar_id: &str, profile: &Value) -> Result<(), Error> {
        if let Some(a) = self.state.lock().avatars.get_mut(avatar_id) {
            a.body_profile = Some(profile.clone());
            a.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl GarmentRepository for MemoryStore {
    async fn get_garments(&self, user_id: &str, garment_ids: &[String]) -> Result<Vec<Garment>, Error> {
        let state = self.state.lock();
        Ok(garment_ids
            .iter()
            .filter_map(|id| state.garments.get(id))
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ObjectOwnershipRepository for MemoryStore {
    async fn owns_object(&self, user_id: &str, key: &str) -> Result<bool, Error> {
        let state = self.state.lock();
        let key = Some(key);
        Ok(state.avatars.values().any(|a| a.user_id == user_id && a.source_photo_key.as_deref() == key)
            || state.garments.values().any(|g| {
                g.user_id == user_id
                    && (Some(g.image_key.as_str()) == key || g.source_photo_key.as_deref() == key)
            })
            || state.tryons.values().any(|t| t.user_id == user_id && t.image_key.as_deref() == key))
    }
}

/// Blob store backed by a map. `put` overwrites.
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, bytes: Vec<u8>, mime_type: &str) {
        self.objects.lock().insert(key.to_string(), (bytes, mime_type.to_string()));
    }

    pub fn mime_type(&self, key: &str) -> Option<String> {
        self.objects.lock().get(key).map(|(_, m)| m.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, Error> {
        self.objects
            .lock()
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| Error::NotFound(format!("object {key}")))
    }

    async fn put(&self, key: &str, bytes: &[u8], mime_type: &str) -> Result<(), Error> {
        self.insert(key, bytes.to_vec(), mime_type);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.objects.lock().remove(key);
        Ok(())
    }
}
