//! End-to-end search: embed, rank, optionally rerank.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::DEFAULT_TOP_K;
use crate::embedding::{EmbeddingProvider, EmbeddingSource, ProviderConfig};
use crate::ranking::{RankingError, SimilarityResult, find_most_similar};
use crate::rerank::{RerankConfig, RerankResult, Reranker, RerankerError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ranking(#[from] RankingError),

    #[error(transparent)]
    Rerank(#[from] RerankerError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    pub passages: Vec<String>,
    /// Defaults to [`DEFAULT_TOP_K`].
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub rerank: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, passages: Vec<String>) -> Self {
        Self {
            query: query.into(),
            passages,
            top_k: None,
            rerank: false,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_rerank(mut self, rerank: bool) -> Self {
        self.rerank = rerank;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SimilarityResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reranked: Option<Vec<RerankResult>>,
    pub used_real_api: bool,
    pub used_real_reranker: bool,
    pub provider_id: String,
    pub model_id: String,
    pub dimension: usize,
    /// Source of each embedded text: the query first, then every passage.
    pub embedding_sources: Vec<EmbeddingSource>,
}

/// Embeds the query and passages with a fresh provider, ranks by cosine similarity and,
/// when requested, reranks the ranked passages.
///
/// Provider and reranker outages never fail the call; only malformed input does.
pub async fn search(
    request: &SearchRequest,
    provider_config: &ProviderConfig,
    rerank_config: &RerankConfig,
) -> Result<SearchResponse, PipelineError> {
    let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K);
    let provider = EmbeddingProvider::new(provider_config.clone());

    debug!(
        query_len = request.query.len(),
        passages = request.passages.len(),
        top_k,
        rerank = request.rerank,
        "Starting search"
    );

    let texts: Vec<&str> = std::iter::once(request.query.as_str())
        .chain(request.passages.iter().map(String::as_str))
        .collect();
    let batch = provider.generate_embeddings(&texts).await;

    if has_mixed_sources(&batch.sources) {
        warn!(
            provider = %provider.provider_id(),
            live = batch.live_count(),
            fallback = batch.len() - batch.live_count(),
            query_source = ?batch.sources[0],
            "Query and passages embedded by different backends, similarities are degraded"
        );
    }

    let Some((query_vec, passage_vecs)) = batch.vectors.split_first() else {
        return Err(RankingError::MalformedInput {
            reason: "embedding batch is empty".to_string(),
        }
        .into());
    };

    let results = find_most_similar(query_vec, passage_vecs, &request.passages, top_k)?;

    let (reranked, used_real_reranker) = if request.rerank && !results.is_empty() {
        let reranker = Reranker::new(rerank_config.clone())?;
        let reranked = reranker
            .rerank_similarity_results(&request.query, &results)
            .await?;
        (Some(reranked), reranker.was_real_reranker_used())
    } else {
        (None, false)
    };

    let response = SearchResponse {
        results,
        reranked,
        used_real_api: provider.was_real_api_used(),
        used_real_reranker,
        provider_id: provider.provider_id().to_string(),
        model_id: provider.model_id().to_string(),
        dimension: provider.dimension(),
        embedding_sources: batch.sources,
    };

    info!(
        provider = %response.provider_id,
        returned = response.results.len(),
        used_real_api = response.used_real_api,
        used_real_reranker = response.used_real_reranker,
        "Search complete"
    );

    Ok(response)
}

/// `true` when some passage was embedded by a different backend than the query.
///
/// `sources` holds the query first, then every passage.
fn has_mixed_sources(sources: &[EmbeddingSource]) -> bool {
    sources
        .split_first()
        .is_some_and(|(query, passages)| passages.iter().any(|p| p != query))
}
