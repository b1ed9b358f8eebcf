// ================================================================
// File: fitroom-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Avatar not found: {0}")]
    AvatarNotFound(String),

    /// One or more referenced garments do not exist for the requesting user.
    #[error("Missing garments: {}", .0.join(", "))]
    MissingGarments(Vec<String>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Request-level errors are rejected before any entity is touched and map to 4xx responses.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::AvatarNotFound(_)
                | Error::MissingGarments(_)
                | Error::InvalidInput(_)
                | Error::Unauthorized(_)
        )
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_are_classified() {
        assert!(Error::MissingGarments(vec!["G9".into()]).is_request_error());
        assert!(Error::Unauthorized("t".into()).is_request_error());
        assert!(!Error::Storage("disk".into()).is_request_error());
        assert!(!Error::from("bad status").is_request_error());
    }

    #[test]
    fn string_errors_become_parse_errors() {
        assert!(matches!(Error::from("x".to_string()), Error::Parse(m) if m == "x"));
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(Error::from(io), Error::Io(_)));
    }
}
