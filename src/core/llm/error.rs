//! LLM Error Types
//!
//! Defines error types for text, structured, and image generation calls,
//! plus the asset-store and lesson-store capability boundaries.

/// Errors that can occur while talking to a generation provider or to one
/// of the external storage capabilities.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("No JSON extractable from response: {0}")]
    Parse(String),

    #[error("Asset upload failed: {0}")]
    Upload(String),

    #[error("Lesson save failed: {0}")]
    Save(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LlmError>;

impl LlmError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::RateLimited { .. } => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::Generation(_) | LlmError::InvalidResponse(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::RateLimited { retry_after_secs: 5 }.is_retryable());
        assert!(LlmError::Api { status: 503, message: "overloaded".into() }.is_retryable());
        assert!(!LlmError::Api { status: 400, message: "bad request".into() }.is_retryable());
        assert!(!LlmError::Auth("bad key".into()).is_retryable());
    }
}
