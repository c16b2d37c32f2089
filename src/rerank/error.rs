use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RerankerError {
    #[error("invalid reranker configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("{backend} rejected the credential")]
    Unauthorized { backend: String },

    #[error("{backend} rate limit exceeded")]
    RateLimited { backend: String },

    #[error("{backend} request failed: {reason}")]
    Network { backend: String, reason: String },

    #[error("{backend} request timed out after {timeout_ms}ms")]
    Timeout { backend: String, timeout_ms: u64 },

    #[error("{backend} returned HTTP {status}: {body}")]
    Http {
        backend: String,
        status: u16,
        body: String,
    },

    #[error("invalid rerank response: {reason}")]
    InvalidResponse { reason: String },

    #[error("invalid rerank input: {reason}")]
    InvalidInput { reason: String },
}

impl RerankerError {
    /// Failures that are absorbed by switching to mock scores.
    pub fn is_backend(&self) -> bool {
        !matches!(
            self,
            RerankerError::InvalidConfig { .. } | RerankerError::InvalidInput { .. }
        )
    }
}
