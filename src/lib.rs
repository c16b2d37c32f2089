//! Semrank library crate (used by the CLI and integration tests).
//!
//! Ranks text passages against a query by embedding similarity, optionally fuses the
//! result with a second-stage reranker, and flags query-irrelevant tokens.
//!
//! # Public API Surface
//!
//! ## Embedding
//! - [`EmbeddingProvider`], [`ProviderConfig`] - Per-request live provider with
//!   per-item fallback
//! - [`fallback_embedding`] - Deterministic n-gram hashing embedder
//!
//! ## Ranking & Rerank
//! - [`cosine_similarity`], [`find_most_similar`] - Top-k passage selection
//! - [`Reranker`], [`RerankConfig`], [`rerank_passages`] - Score fusion
//!
//! ## Analysis
//! - [`generate_token_suggestions`] - Unmatched-token suggestions
//!
//! ## Orchestration
//! - [`search`] - Embed, rank and rerank in one call
//! - [`Config`] - `SEMRANK_*` environment configuration
//!
//! Every provider and reranker is built from an explicit config for one request; nothing
//! in this crate holds process-wide mutable state.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod pipeline;
pub mod ranking;
pub mod rerank;
pub mod suggest;
pub mod text;

pub use config::{Config, ConfigError};
pub use constants::embedding_dimension;
pub use embedding::{
    EmbeddingBatch, EmbeddingError, EmbeddingProvider, EmbeddingSource, ProviderConfig,
    ProviderKind, ProviderState, fallback_embedding, generate_embedding, generate_embeddings,
};
pub use pipeline::{PipelineError, SearchRequest, SearchResponse, search};
pub use ranking::{
    RankingError, SimilarityRanker, SimilarityResult, cosine_similarity, find_most_similar,
};
pub use rerank::{
    MockScoreMode, RerankBackendKind, RerankConfig, RerankResult, Reranker, RerankerError,
    fuse_and_rank, rerank_passages, similarity_to_percent,
};
pub use suggest::{TokenSuggestion, generate_token_suggestions};
pub use text::{normalize, token_similarity, tokenize_words};
