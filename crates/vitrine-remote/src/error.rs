//! Remote-specific error types and conversions.

use vitrine_core::error::VitrineError;

/// Transport-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<RemoteError> for VitrineError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Json(e) => VitrineError::Serialization(e.to_string()),
            RemoteError::InvalidUrl(url) => VitrineError::Validation {
                message: format!("invalid remote URL: {url}"),
            },
            other => VitrineError::Remote(other.to_string()),
        }
    }
}
