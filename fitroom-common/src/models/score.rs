// File: fitroom-common/src/models/score.rs

use serde::{Deserialize, Serialize};
use crate::traits::schema_traits::ResponseSchema;

/// Per-criterion scores, each an integer in `0..=100`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub fit_balance: i64,
    pub proportions: i64,
    pub color_harmony: i64,
    pub occasion_match: i64,
    pub season_material: i64,
    pub overall: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Great,
    Ok,
    NotRecommended,
}

/// Structured outfit score returned by the scoring model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutfitScore {
    pub scores: ScoreBreakdown,
    pub verdict: Verdict,
    pub why: Vec<String>,
    pub improvements: Vec<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

fn check_range(name: &str, value: i64) -> Result<(), String> {
    if (0..=100).contains(&value) {
        Ok(())
    } else {
        Err(format!("scores.{name} must be within 0..=100, got {value}"))
    }
}

fn check_len(name: &str, len: usize, min: usize, max: usize) -> Result<(), String> {
    if len < min || len > max {
        return Err(format!("{name} must have {min}..={max} items, got {len}"));
    }
    Ok(())
}

impl ResponseSchema for OutfitScore {
    fn validate(&self) -> Result<(), String> {
        let s = &self.scores;
        check_range("fit_balance", s.fit_balance)?;
        check_range("proportions", s.proportions)?;
        check_range("color_harmony", s.color_harmony)?;
        check_range("occasion_match", s.occasion_match)?;
        check_range("season_material", s.season_material)?;
        check_range("overall", s.overall)?;
        check_len("why", self.why.len(), 1, 8)?;
        check_len("improvements", self.improvements.len(), 1, 8)?;
        check_len("alternatives", self.alternatives.len(), 0, 6)?;
        Ok(())
    }
}
