use thiserror::Error;

/// Failures of a single embedding attempt.
///
/// None of these reach callers of [`EmbeddingProvider`](super::EmbeddingProvider): they are
/// logged, recorded as [`last_error`](super::EmbeddingProvider::last_error) and the
/// fallback vector is substituted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbeddingError {
    #[error("invalid provider configuration: {reason}")]
    Configuration { reason: String },

    #[error("{provider} rejected the credential")]
    Unauthorized { provider: String },

    #[error("{provider} rate limit exceeded")]
    RateLimited { provider: String },

    #[error("{provider} quota exhausted")]
    QuotaExceeded { provider: String },

    #[error("{provider} request failed: {reason}")]
    Network { provider: String, reason: String },

    #[error("{provider} request timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("invalid embedding response: {reason}")]
    InvalidResponse { reason: String },
}

impl EmbeddingError {
    /// Missing, malformed or unknown configuration. Detected before any I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(self, EmbeddingError::Configuration { .. })
    }

    /// Failure of a live call that was actually attempted.
    pub fn is_provider(&self) -> bool {
        !self.is_configuration()
    }
}
