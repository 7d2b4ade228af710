//! Error types for TextServe

use std::path::PathBuf;

/// Result type alias using TextServe's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for TextServe operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Artifact file missing at the expected local path
    #[error("artifact not found: {}", .path.display())]
    ArtifactNotFound { path: PathBuf },

    /// Remote artifact fetch failed, with the HTTP status when one was received
    #[error("artifact download failed ({}): {url}", describe_status(.status))]
    ArtifactDownloadFailed { status: Option<u16>, url: String },

    /// Artifact bytes could not be decoded into a model object
    #[error("artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    /// Model is not loaded, so predictions cannot be served
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Transform or predict failed for a given input
    #[error("prediction failed: {0}")]
    PredictionFailed(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "no response".to_string(),
    }
}

impl Error {
    /// Create a new artifact-not-found error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::ArtifactNotFound { path: path.into() }
    }

    /// Create a new download error
    pub fn download_failed(status: Option<u16>, url: impl Into<String>) -> Self {
        Self::ArtifactDownloadFailed {
            status,
            url: url.into(),
        }
    }

    /// Create a new corrupt-artifact error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::ArtifactCorrupt(msg.into())
    }

    /// Create a new service-unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// Create a new prediction error
    pub fn prediction(msg: impl Into<String>) -> Self {
        Self::PredictionFailed(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error came from artifact acquisition or decoding
    pub fn is_artifact_error(&self) -> bool {
        matches!(
            self,
            Self::ArtifactNotFound { .. }
                | Self::ArtifactDownloadFailed { .. }
                | Self::ArtifactCorrupt(_)
        )
    }
}
