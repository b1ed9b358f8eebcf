// File: fitroom-common/src/models/generation.rs

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Lifecycle of a generated artifact (outfit score or try-on image).
///
/// `pending -> running -> {succeeded, failed}`; `failed -> running` and a stale
/// `running -> running` are only reachable through a lease claim.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Running => "running",
            GenerationStatus::Succeeded => "succeeded",
            GenerationStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Succeeded | GenerationStatus::Failed)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(GenerationStatus::Pending),
            "running" => Ok(GenerationStatus::Running),
            "succeeded" => Ok(GenerationStatus::Succeeded),
            "failed" => Ok(GenerationStatus::Failed),
            _ => Err(format!("Unknown generation status: {}", s)),
        }
    }
}

/// Error codes persisted on failed generations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FailureCode {
    AvatarNotAnalyzed,
    AvatarNoPhoto,
    OutfitNoGarments,
    AiTimeout,
    AiApiError,
    AiParseError,
    AiError,
    StorageError,
    GenerationError,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::AvatarNotAnalyzed => "AVATAR_NOT_ANALYZED",
            FailureCode::AvatarNoPhoto => "AVATAR_NO_PHOTO",
            FailureCode::OutfitNoGarments => "OUTFIT_NO_GARMENTS",
            FailureCode::AiTimeout => "AI_TIMEOUT",
            FailureCode::AiApiError => "AI_API_ERROR",
            FailureCode::AiParseError => "AI_PARSE_ERROR",
            FailureCode::AiError => "AI_ERROR",
            FailureCode::StorageError => "STORAGE_ERROR",
            FailureCode::GenerationError => "GENERATION_ERROR",
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which table a lease is taken on.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum LeaseKind {
    Outfit,
    Tryon,
}

impl fmt::Display for LeaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaseKind::Outfit => write!(f, "outfit"),
            LeaseKind::Tryon => write!(f, "tryon"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            GenerationStatus::Pending,
            GenerationStatus::Running,
            GenerationStatus::Succeeded,
            GenerationStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<GenerationStatus>(), Ok(status));
        }
        assert!("done".parse::<GenerationStatus>().is_err());
    }

    #[test]
    fn only_outcomes_are_terminal() {
        assert!(!GenerationStatus::Pending.is_terminal());
        assert!(!GenerationStatus::Running.is_terminal());
        assert!(GenerationStatus::Succeeded.is_terminal());
        assert!(GenerationStatus::Failed.is_terminal());
    }
}
