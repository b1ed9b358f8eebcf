// File: fitroom-common/src/models/garment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized (0..1) bounding box into a shared source photo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    /// Expands the box by `padding` of its own width/height on every side,
    /// clamped to the unit square. Returns `(x1, y1, x2, y2)`.
    pub fn padded(&self, padding: f64) -> (f64, f64, f64, f64) {
        let pad_x = self.w * padding;
        let pad_y = self.h * padding;
        (
            (self.x - pad_x).max(0.0),
            (self.y - pad_y).max(0.0),
            (self.x + self.w + pad_x).min(1.0),
            (self.y + self.h + pad_y).min(1.0),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Garment {
    pub garment_id: String,
    pub user_id: String,
    pub name: String,
    pub category: Option<String>,
    pub profile: Option<Value>,
    /// Full image of the garment on its own.
    pub image_key: String,
    /// Shared photo the garment was detected in, if any.
    pub source_photo_key: Option<String>,
    pub bbox: Option<BoundingBox>,
    pub created_at: DateTime<Utc>,
}

impl Garment {
    /// The crop region to use for try-on, when the garment was detected in a shared photo.
    pub fn crop_source(&self) -> Option<(&str, BoundingBox)> {
        match (&self.source_photo_key, self.bbox) {
            (Some(key), Some(bbox)) => Some((key.as_str(), bbox)),
            _ => None,
        }
    }
}
