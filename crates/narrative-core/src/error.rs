//! Error types for narrative classification and ranking

use thiserror::Error;

/// Narrative analysis errors
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// Unrecognized regime value
    #[error("Invalid regime: {0}")]
    InvalidRegime(String),

    /// An operation ran before its inputs were ready
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Narrative or claim id not registered
    #[error("Not found: {0}")]
    NotFound(String),

    /// Narrative or claim id already registered
    #[error("Conflict: {0} already exists")]
    Conflict(String),

    /// Malformed input record
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for narrative operations
pub type Result<T> = std::result::Result<T, NarrativeError>;
