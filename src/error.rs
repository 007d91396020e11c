//! Error types for hammerspace

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, HammerspaceError>;

#[derive(Error, Debug)]
pub enum HammerspaceError {
    /// Referenced collection, item or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Access engine (or owner-only rule) denied the requested action
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Operation needs an authenticated principal
    #[error("Authentication required: {0}")]
    Auth(String),

    /// Self-share or malformed permission level
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness constraint (collection name per owner, username)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HammerspaceError {
    /// HTTP-style status code a boundary layer should surface for this error.
    ///
    /// Whether a `Forbidden` read is reported as 404 to avoid leaking
    /// existence is left to the boundary; this returns 403.
    pub fn status_code(&self) -> u16 {
        match self {
            HammerspaceError::NotFound(_) => 404,
            HammerspaceError::Forbidden(_) => 403,
            HammerspaceError::Auth(_) => 401,
            HammerspaceError::InvalidGrant(_)
            | HammerspaceError::InvalidInput(_)
            | HammerspaceError::Json(_) => 400,
            HammerspaceError::Conflict(_) => 409,
            _ => 500,
        }
    }

    /// True for the deterministic decision errors produced by the access core
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            HammerspaceError::Forbidden(_) | HammerspaceError::Auth(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(HammerspaceError::NotFound("x".into()).status_code(), 404);
        assert_eq!(HammerspaceError::Forbidden("x".into()).status_code(), 403);
        assert_eq!(HammerspaceError::Auth("x".into()).status_code(), 401);
        assert_eq!(HammerspaceError::InvalidGrant("x".into()).status_code(), 400);
        assert_eq!(HammerspaceError::Conflict("x".into()).status_code(), 409);
        assert_eq!(HammerspaceError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_denials() {
        assert!(HammerspaceError::Forbidden("no".into()).is_denial());
        assert!(!HammerspaceError::NotFound("gone".into()).is_denial());
    }
}
