// File: fitroom-common/src/models/avatar.rs

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::traits::schema_traits::ResponseSchema;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avatar {
    pub avatar_id: String,
    pub user_id: String,
    pub name: String,
    pub source_photo_key: Option<String>,
    /// Clean body profile, set once an analysis succeeded.
    pub body_profile: Option<Value>,
    pub height_cm: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw record of one body analysis call, kept whether or not it succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarAnalysis {
    pub analysis_id: String,
    pub avatar_id: String,
    pub model: String,
    pub raw_json: Value,
    pub created_at: DateTime<Utc>,
}

/// Categorical labels accepted per body profile field; `unknown` is always allowed.
const PROFILE_FIELDS: &[(&str, &[&str])] = &[
    ("shoulder_width_class", &["narrow", "average", "wide"]),
    ("hip_vs_shoulder", &["hips_wider", "equal", "shoulders_wider"]),
    ("waist_definition", &["defined", "moderate", "low"]),
    ("torso_vs_legs", &["short_torso", "balanced", "long_torso"]),
    ("body_shape_label", &["hourglass", "pear", "rectangle", "apple", "inverted_triangle"]),
    ("body_volume", &["slim", "average", "curvy", "plus"]),
    ("verticality", &["petite", "regular", "tall"]),
    ("shoulder_slope", &["sloped", "neutral", "square"]),
    ("neck_length", &["short", "average", "long"]),
    ("undertone", &["cool", "neutral", "warm", "olive"]),
    ("contrast_level", &["low", "medium", "high"]),
];

/// Styling-oriented body description inferred from a single full-body photo.
/// Not a biometric profile: labels only, no measurements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvatarBodyProfile {
    pub shoulder_width_class: String,
    pub hip_vs_shoulder: String,
    pub waist_definition: String,
    pub torso_vs_legs: String,
    pub body_shape_label: String,
    pub body_volume: String,
    pub verticality: String,
    pub shoulder_slope: String,
    pub neck_length: String,
    pub undertone: String,
    pub contrast_level: String,
    pub confidence: BTreeMap<String, f64>,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl AvatarBodyProfile {
    fn label(&self, field: &str) -> &str {
        match field {
            "shoulder_width_class" => &self.shoulder_width_class,
            "hip_vs_shoulder" => &self.hip_vs_shoulder,
            "waist_definition" => &self.waist_definition,
            "torso_vs_legs" => &self.torso_vs_legs,
            "body_shape_label" => &self.body_shape_label,
            "body_volume" => &self.body_volume,
            "verticality" => &self.verticality,
            "shoulder_slope" => &self.shoulder_slope,
            "neck_length" => &self.neck_length,
            "undertone" => &self.undertone,
            _ => &self.contrast_level,
        }
    }
}

impl ResponseSchema for AvatarBodyProfile {
    fn validate(&self) -> Result<(), String> {
        for (field, allowed) in PROFILE_FIELDS {
            let value = self.label(field);
            if value != "unknown" && !allowed.contains(&value) {
                return Err(format!("{field}: '{value}' is not an allowed value"));
            }
            match self.confidence.get(*field) {
                Some(c) if (0.0..=1.0).contains(c) => {}
                Some(c) => return Err(format!("confidence.{field} must be within 0..=1, got {c}")),
                None => return Err(format!("confidence.{field} is missing")),
            }
        }
        Ok(())
    }
}

/// Reasons the analysis model may refuse a photo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvatarAnalysisErrorCode {
    MultiplePeople,
    MultipleFaces,
    NotFullBody,
    TooOccluded,
    LowQuality,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvatarAnalysisError {
    pub code: AvatarAnalysisErrorCode,
    pub message: String,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Wire shape: `{"success": true, "data": {...}}` or `{"success": false, "error": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisEnvelope {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<AvatarBodyProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<AvatarAnalysisError>,
}

/// Tagged outcome of a body analysis call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "AnalysisEnvelope", into = "AnalysisEnvelope")]
pub enum AvatarAnalysisResult {
    Profile(AvatarBodyProfile),
    Rejected(AvatarAnalysisError),
}

impl TryFrom<AnalysisEnvelope> for AvatarAnalysisResult {
    type Error = String;

    fn try_from(env: AnalysisEnvelope) -> Result<Self, Self::Error> {
        match (env.success, env.data, env.error) {
            (true, Some(data), _) => Ok(AvatarAnalysisResult::Profile(data)),
            (false, _, Some(error)) => Ok(AvatarAnalysisResult::Rejected(error)),
            (true, None, _) => Err("success=true requires `data`".to_string()),
            (false, _, None) => Err("success=false requires `error`".to_string()),
        }
    }
}

impl From<AvatarAnalysisResult> for AnalysisEnvelope {
    fn from(result: AvatarAnalysisResult) -> Self {
        match result {
            AvatarAnalysisResult::Profile(data) => AnalysisEnvelope { success: true, data: Some(data), error: None },
            AvatarAnalysisResult::Rejected(error) => AnalysisEnvelope { success: false, data: None, error: Some(error) },
        }
    }
}

impl ResponseSchema for AvatarAnalysisResult {
    fn validate(&self) -> Result<(), String> {
        match self {
            AvatarAnalysisResult::Profile(profile) => profile.validate(),
            AvatarAnalysisResult::Rejected(_) => Ok(()),
        }
    }
}
