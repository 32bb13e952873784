//! Error types for Lectern.

use thiserror::Error;

/// Library-level error type for Lectern operations.
#[derive(Error, Debug)]
pub enum LecternError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to parse AI response: {0}")]
    MalformedResponse(String),

    #[error("Upstream provider error: {0}")]
    Upstream(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("No transcript available: {0}")]
    NoTranscriptAvailable(String),

    #[error("Transcripts are disabled for this video: {0}")]
    TranscriptsDisabled(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),
}

impl LecternError {
    /// HTTP status code a route layer should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            LecternError::InvalidInput(_) => 400,
            LecternError::NoTranscriptAvailable(_)
            | LecternError::TranscriptsDisabled(_)
            | LecternError::VideoNotFound(_) => 404,
            LecternError::ServiceUnavailable(_) => 503,
            _ => 500,
        }
    }
}

/// Result type alias for Lectern operations.
pub type Result<T> = std::result::Result<T, LecternError>;
