//! Embedding generation.
//!
//! - [`provider`] calls a live backend (OpenAI, Gemini) and substitutes fallback vectors
//!   per text on failure.
//! - [`fallback`] is the deterministic n-gram hashing embedder used in that case.

mod error;
/// Deterministic hashing embedder.
pub mod fallback;
/// Live providers and per-request provider instances.
pub mod provider;

pub use error::EmbeddingError;
pub use fallback::fallback_embedding;
pub use provider::{
    EmbeddingBatch, EmbeddingProvider, EmbeddingSource, FALLBACK_MODEL_ID, ProviderConfig,
    ProviderKind, ProviderState,
};

/// Embeds one text with a fresh provider built from `config`.
pub async fn generate_embedding(text: &str, config: &ProviderConfig) -> Vec<f32> {
    EmbeddingProvider::new(config.clone())
        .generate_embedding(text)
        .await
}

/// Embeds a batch with a fresh provider built from `config`.
pub async fn generate_embeddings<S: AsRef<str>>(
    texts: &[S],
    config: &ProviderConfig,
) -> EmbeddingBatch {
    EmbeddingProvider::new(config.clone())
        .generate_embeddings(texts)
        .await
}
