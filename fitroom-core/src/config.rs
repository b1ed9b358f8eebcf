// File: fitroom-core/src/config.rs

use std::time::Duration;

pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_SCORE_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TRYON_MODEL: &str = "gemini-2.5-flash-image";

/// Knobs for the generation workflows. Defaults match production.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// A `running` lease older than this may be reclaimed.
    pub stale_lease_after: Duration,
    /// Persisted error messages are cut to this many characters.
    pub max_error_message_chars: usize,
    pub analysis_model: String,
    pub score_model: String,
    pub tryon_model: String,
    pub analysis_timeout: Duration,
    pub score_timeout: Duration,
    pub tryon_timeout: Duration,
    /// Fraction of the box size added on every side before cropping a garment.
    pub bbox_padding: f64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            stale_lease_after: Duration::from_secs(5 * 60),
            max_error_message_chars: 500,
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            score_model: DEFAULT_SCORE_MODEL.to_string(),
            tryon_model: DEFAULT_TRYON_MODEL.to_string(),
            analysis_timeout: Duration::from_secs(25),
            score_timeout: Duration::from_secs(30),
            tryon_timeout: Duration::from_secs(60),
            bbox_padding: 0.15,
        }
    }
}
