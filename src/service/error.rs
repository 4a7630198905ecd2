//! Service-layer errors.

use thiserror::Error;

/// Failure of a call to an external summarization, vision or embedding service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Whether the call may succeed if retried later.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ServiceError::RateLimited => true,
            ServiceError::Api { status, .. } => *status == 429,
            _ => false,
        }
    }
}

impl From<ServiceError> for crate::Error {
    fn from(err: ServiceError) -> Self {
        crate::Error::Service(err.to_string())
    }
}
