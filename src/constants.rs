//! Cross-cutting, shared constants.
//!
//! # Dimension Invariants
//!
//! Vector length is a property of the (provider, model) pair, not of the call site. Live
//! responses and fallback vectors must agree on it, otherwise one ranking request could mix
//! lengths. [`embedding_dimension`] is the single lookup every module goes through.

/// Dimension used for unknown (provider, model) pairs and for the local fallback provider.
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Default number of passages returned by similarity ranking.
pub const DEFAULT_TOP_K: usize = 5;

/// Default number of ranked passages handed to the rerank stage.
pub const DEFAULT_RERANK_TOP_N: usize = 10;

/// Default bound on every live provider call.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default capacity of the per-instance live embedding memo.
pub const DEFAULT_CACHE_CAPACITY: u64 = 1024;

/// Character n-gram sizes used by the fallback embedder.
pub const CHAR_NGRAM_MIN: usize = 2;
pub const CHAR_NGRAM_MAX: usize = 4;

/// Word n-gram sizes used by the fallback embedder.
pub const WORD_NGRAM_MIN: usize = 1;
pub const WORD_NGRAM_MAX: usize = 3;

/// Fusion weights: `final = EMBEDDING_WEIGHT * embedding + RERANK_WEIGHT * rerank`.
pub const DEFAULT_EMBEDDING_WEIGHT: f32 = 0.7;
pub const DEFAULT_RERANK_WEIGHT: f32 = 0.3;

/// Half-width of the mock rerank perturbation, in percentage points.
pub const MOCK_RERANK_SPREAD: f32 = 10.0;

/// Maximum number of replacement candidates per flagged token.
pub const MAX_SUGGESTIONS: usize = 5;

/// Known output dimensions keyed by canonical provider id and model id.
const DIMENSION_TABLE: &[(&str, &str, usize)] = &[
    ("openai", "text-embedding-3-small", 1536),
    ("openai", "text-embedding-3-large", 3072),
    ("openai", "text-embedding-ada-002", 1536),
    ("gemini", "text-embedding-004", 768),
    ("gemini", "embedding-001", 768),
    ("gemini", "gemini-embedding-001", 3072),
];

/// Returns the declared output dimension for `(provider_id, model_id)`.
///
/// Lookup is case-insensitive and accepts the `models/` prefix Gemini uses in resource
/// names. Anything not in the table maps to [`DEFAULT_EMBEDDING_DIM`].
///
/// ```
/// use semrank::constants::{embedding_dimension, DEFAULT_EMBEDDING_DIM};
///
/// assert_eq!(embedding_dimension("openai", "text-embedding-3-large"), 3072);
/// assert_eq!(embedding_dimension("local", "anything"), DEFAULT_EMBEDDING_DIM);
/// ```
pub fn embedding_dimension(provider_id: &str, model_id: &str) -> usize {
    let provider = provider_id.trim().to_ascii_lowercase();
    let provider = match provider.as_str() {
        "google" => "gemini",
        other => other,
    };
    let model = model_id.trim().to_ascii_lowercase();
    let model = model.strip_prefix("models/").unwrap_or(&model);

    DIMENSION_TABLE
        .iter()
        .find(|(p, m, _)| *p == provider && *m == model)
        .map(|(_, _, dim)| *dim)
        .unwrap_or(DEFAULT_EMBEDDING_DIM)
}
