// File: fitroom-core/src/test_utils/fixtures.rs

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use image::{ImageBuffer, ImageFormat, Rgb};
use serde_json::{json, Value};
use fitroom_ai::{GenerationGateway, RetryPolicy};
use fitroom_common::models::{Avatar, BoundingBox, Garment};

use crate::config::GenerationSettings;
use crate::services::outfit_service::{OutfitService, OutfitStores};
use crate::test_utils::memory::{InMemoryBlobStore, MemoryStore};
use crate::test_utils::transport::ScriptedTransport;

pub const USER: &str = "user-1";
pub const OTHER_USER: &str = "user-2";

/// A complete, valid body profile.
pub fn body_profile() -> Value {
    json!({
        "shoulder_width_class": "average",
        "hip_vs_shoulder": "equal",
        "waist_definition": "defined",
        "torso_vs_legs": "balanced",
        "body_shape_label": "hourglass",
        "body_volume": "average",
        "verticality": "regular",
        "shoulder_slope": "neutral",
        "neck_length": "average",
        "undertone": "warm",
        "contrast_level": "medium",
        "confidence": {
            "shoulder_width_class": 0.9,
            "hip_vs_shoulder": 0.8,
            "waist_definition": 0.8,
            "torso_vs_legs": 0.7,
            "body_shape_label": 0.8,
            "body_volume": 0.7,
            "verticality": 0.6,
            "shoulder_slope": 0.7,
            "neck_length": 0.6,
            "undertone": 0.6,
            "contrast_level": 0.7
        },
        "issues": []
    })
}

/// Valid `OutfitScore` JSON with the given overall score.
pub fn score_json(overall: i64) -> String {
    let verdict = match overall {
        75.. => "great",
        50..=74 => "ok",
        _ => "not_recommended",
    };
    json!({
        "scores": {
            "fit_balance": overall,
            "proportions": overall,
            "color_harmony": overall,
            "occasion_match": overall,
            "season_material": overall,
            "overall": overall
        },
        "verdict": verdict,
        "why": ["Balanced silhouette"],
        "improvements": ["Add a belt"],
        "alternatives": []
    })
    .to_string()
}

/// Small PNG with a gradient, decodable by the `image` crate.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut out = Cursor::new(Vec::new());
    // Encoding an in-memory RGB buffer as PNG cannot fail.
    let _ = img.write_to(&mut out, ImageFormat::Png);
    out.into_inner()
}

pub fn avatar(user_id: &str, avatar_id: &str, photo_key: Option<&str>, profile: Option<Value>) -> Avatar {
    let now = Utc::now();
    Avatar {
        avatar_id: avatar_id.to_string(),
        user_id: user_id.to_string(),
        name: format!("Avatar {avatar_id}"),
        source_photo_key: photo_key.map(str::to_string),
        body_profile: profile,
        height_cm: Some(170),
        created_at: now,
        updated_at: now,
    }
}

pub fn garment(user_id: &str, garment_id: &str, name: &str, category: Option<&str>) -> Garment {
    Garment {
        garment_id: garment_id.to_string(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        category: category.map(str::to_string),
        profile: Some(json!({ "color": "navy", "material": "wool" })),
        image_key: format!("garments/{garment_id}.png"),
        source_photo_key: None,
        bbox: None,
        created_at: Utc::now(),
    }
}

/// Garment detected inside a shared photo.
pub fn garment_in_photo(user_id: &str, garment_id: &str, source_photo_key: &str, bbox: BoundingBox) -> Garment {
    Garment {
        source_photo_key: Some(source_photo_key.to_string()),
        bbox: Some(bbox),
        ..garment(user_id, garment_id, "Detected garment", Some("outerwear"))
    }
}

impl OutfitStores {
    pub fn in_memory(store: Arc<MemoryStore>, blobs: Arc<InMemoryBlobStore>) -> Self {
        Self {
            outfits: store.clone(),
            tryons: store.clone(),
            avatars: store.clone(),
            garments: store.clone(),
            leases: store.clone(),
            objects: store,
            blobs,
        }
    }
}

/// Service wired to in-memory stores and a scripted model.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub transport: Arc<ScriptedTransport>,
    pub service: Arc<OutfitService>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_settings(GenerationSettings::default())
    }

    pub fn with_settings(settings: GenerationSettings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = GenerationGateway::new(transport.clone()).with_retry_policy(RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        });
        let service = OutfitService::new(
            OutfitStores::in_memory(store.clone(), blobs.clone()),
            Arc::new(gateway),
            settings,
        );
        Self { store, blobs, transport, service: Arc::new(service) }
    }

    /// `A1` (analyzed, with photo) and garments `G1` (top), `G2` (pants) for [`USER`].
    pub fn seed_wardrobe(&self) {
        self.blobs.insert("avatars/A1.png", sample_png(64, 128), "image/png");
        self.store.insert_avatar(avatar(USER, "A1", Some("avatars/A1.png"), Some(body_profile())));
        for (id, name, category) in [("G1", "White Shirt", "top"), ("G2", "Navy Trousers", "pants")] {
            self.blobs.insert(&format!("garments/{id}.png"), sample_png(32, 32), "image/png");
            self.store.insert_garment(garment(USER, id, name, Some(category)));
        }
    }
}
