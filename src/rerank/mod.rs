//! Rerank fusion.
//!
//! Passages that already carry an embedding score on `[0, 100]` get a second opinion from
//! a live reranker (or a mock score when none answers). The two are fused as
//! `final = 0.7 * embedding + 0.3 * rerank` and densely ranked.

pub mod config;
pub mod error;
pub(crate) mod http;
/// Mock score synthesis.
pub mod synth;


pub use config::{MockScoreMode, RerankBackendKind, RerankConfig};
pub use error::RerankerError;
pub use synth::{mock_rerank_score, seeded_offset};

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ranking::{SimilarityResult, descending_nan_last};

use http::HttpReranker;

/// One passage after fusion. All scores are on `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankResult {
    pub text: String,
    pub original_index: usize,
    pub embedding_score: f32,
    pub rerank_score: f32,
    pub final_score: f32,
    /// 1-based, unique within one call.
    pub rank: usize,
}

/// Maps a cosine similarity in `[-1, 1]` onto `[0, 100]`.
pub fn similarity_to_percent(similarity: f32) -> f32 {
    if similarity.is_nan() {
        return 0.0;
    }
    ((similarity + 1.0) / 2.0 * 100.0).clamp(0.0, 100.0)
}

/// Fuses embedding and rerank scores, sorts by final score and assigns ranks `1..=n`.
///
/// Ties on the final score are broken by ascending original index.
pub fn fuse_and_rank<S: AsRef<str>>(
    passages: &[S],
    embedding_scores: &[f32],
    rerank_scores: &[f32],
    embedding_weight: f32,
    rerank_weight: f32,
) -> Result<Vec<RerankResult>, RerankerError> {
    if passages.len() != embedding_scores.len() || passages.len() != rerank_scores.len() {
        return Err(RerankerError::InvalidInput {
            reason: format!(
                "{} passages, {} embedding scores, {} rerank scores",
                passages.len(),
                embedding_scores.len(),
                rerank_scores.len()
            ),
        });
    }

    let mut fused: Vec<RerankResult> = passages
        .iter()
        .zip(embedding_scores.iter().zip(rerank_scores))
        .enumerate()
        .map(|(index, (passage, (&embedding, &rerank)))| {
            let embedding = clamp_percent(embedding);
            let rerank = clamp_percent(rerank);
            RerankResult {
                text: passage.as_ref().to_string(),
                original_index: index,
                embedding_score: embedding,
                rerank_score: rerank,
                final_score: (embedding_weight * embedding + rerank_weight * rerank)
                    .clamp(0.0, 100.0),
                rank: 0,
            }
        })
        .collect();

    fused.sort_by(|a, b| {
        descending_nan_last(a.final_score, b.final_score)
            .then(a.original_index.cmp(&b.original_index))
    });
    for (position, result) in fused.iter_mut().enumerate() {
        result.rank = position + 1;
    }

    Ok(fused)
}

fn clamp_percent(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

enum RerankBackend {
    Http(HttpReranker),
    Mock,
}

/// Reranker for one request.
pub struct Reranker {
    config: RerankConfig,
    backend: RerankBackend,
    used_real_reranker: AtomicBool,
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field(
                "backend",
                &match &self.backend {
                    RerankBackend::Http(http) => http.backend(),
                    RerankBackend::Mock => "mock",
                },
            )
            .field("config", &self.config)
            .finish()
    }
}

impl Reranker {
    /// Builds a reranker.
    ///
    /// Invalid weights are an error. A missing or malformed credential is not: it is
    /// logged and the reranker runs on mock scores.
    pub fn new(config: RerankConfig) -> Result<Self, RerankerError> {
        if let Err(reason) = config.validate() {
            return Err(RerankerError::InvalidConfig { reason });
        }

        let backend = match Self::build_backend(&config) {
            Ok(Some(http)) => {
                info!(
                    backend = http.backend(),
                    model = config.model(),
                    "Live reranker configured"
                );
                RerankBackend::Http(http)
            }
            Ok(None) => {
                debug!("No live reranker configured, using mock scores");
                RerankBackend::Mock
            }
            Err(err) => {
                warn!(
                    backend = config.backend.id(),
                    error = %err,
                    "Reranker misconfigured, using mock scores"
                );
                RerankBackend::Mock
            }
        };

        Ok(Self {
            config,
            backend,
            used_real_reranker: AtomicBool::new(false),
        })
    }

    /// Reranker that always uses seeded mock scores.
    pub fn mock() -> Self {
        Self {
            config: RerankConfig::mock(),
            backend: RerankBackend::Mock,
            used_real_reranker: AtomicBool::new(false),
        }
    }

    fn build_backend(config: &RerankConfig) -> Result<Option<HttpReranker>, RerankerError> {
        if config.backend == RerankBackendKind::None {
            return Ok(None);
        }
        let Some(credential) = config.credential() else {
            return Ok(None);
        };
        if credential.chars().any(char::is_whitespace) {
            return Err(RerankerError::InvalidConfig {
                reason: "credential contains whitespace".to_string(),
            });
        }

        let endpoint = config
            .endpoint()
            .ok_or_else(|| RerankerError::InvalidConfig {
                reason: format!("no endpoint for reranker '{}'", config.backend.id()),
            })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RerankerError::InvalidConfig {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Some(HttpReranker::new(
            client,
            endpoint,
            credential,
            config.model(),
            config.backend.id(),
            config.timeout_ms,
        )))
    }

    /// Reranks `passages` whose embedding scores are already on `[0, 100]`.
    ///
    /// Live failures are absorbed: the whole call switches to mock scores and
    /// [`was_real_reranker_used`](Self::was_real_reranker_used) reports `false`.
    pub async fn rerank_passages<S: AsRef<str>>(
        &self,
        query: &str,
        passages: &[S],
        embedding_scores: &[f32],
    ) -> Result<Vec<RerankResult>, RerankerError> {
        if passages.len() != embedding_scores.len() {
            return Err(RerankerError::InvalidInput {
                reason: format!(
                    "{} passages but {} embedding scores",
                    passages.len(),
                    embedding_scores.len()
                ),
            });
        }

        if passages.is_empty() {
            self.used_real_reranker.store(false, Ordering::Relaxed);
            return Ok(Vec::new());
        }

        let live = match &self.backend {
            RerankBackend::Http(http) => {
                let documents: Vec<&str> = passages.iter().map(|p| p.as_ref()).collect();
                let outcome =
                    tokio::time::timeout(self.config.timeout(), http.score(query, &documents))
                        .await
                        .map_err(|_| RerankerError::Timeout {
                            backend: http.backend().to_string(),
                            timeout_ms: self.config.timeout_ms,
                        })
                        .and_then(|result| result);

                match outcome {
                    Ok(scores) => Some(scores),
                    Err(err) => {
                        warn!(
                            backend = http.backend(),
                            error = %err,
                            "Live rerank failed, using mock scores"
                        );
                        None
                    }
                }
            }
            RerankBackend::Mock => None,
        };

        self.used_real_reranker.store(live.is_some(), Ordering::Relaxed);

        let rerank_scores = live.unwrap_or_else(|| {
            passages
                .iter()
                .zip(embedding_scores)
                .enumerate()
                .map(|(index, (passage, &score))| {
                    mock_rerank_score(
                        self.config.mock_mode,
                        query,
                        passage.as_ref(),
                        index,
                        clamp_percent(score),
                    )
                })
                .collect()
        });

        let results = fuse_and_rank(
            passages,
            embedding_scores,
            &rerank_scores,
            self.config.embedding_weight,
            self.config.rerank_weight,
        )?;

        debug!(
            passages = results.len(),
            live = self.was_real_reranker_used(),
            "Reranked passages"
        );

        Ok(results)
    }

    /// Reranks the first `top_n` similarity results, rescaling cosine to `[0, 100]`.
    ///
    /// `original_index` in the output refers to the caller's passage list, not to the
    /// position within `results`.
    pub async fn rerank_similarity_results(
        &self,
        query: &str,
        results: &[SimilarityResult],
    ) -> Result<Vec<RerankResult>, RerankerError> {
        let selected = &results[..results.len().min(self.config.top_n)];
        let passages: Vec<&str> = selected.iter().map(|r| r.text.as_str()).collect();
        let scores: Vec<f32> = selected
            .iter()
            .map(|r| similarity_to_percent(r.similarity))
            .collect();

        let mut reranked = self.rerank_passages(query, &passages, &scores).await?;
        for item in &mut reranked {
            item.original_index = selected[item.original_index].original_index;
        }
        Ok(reranked)
    }

    /// `true` when the most recent call used live scores.
    pub fn was_real_reranker_used(&self) -> bool {
        self.used_real_reranker.load(Ordering::Relaxed)
    }

    pub fn is_live(&self) -> bool {
        matches!(self.backend, RerankBackend::Http(_))
    }

    pub fn config(&self) -> &RerankConfig {
        &self.config
    }
}

/// Reranks with a fresh [`Reranker`] built from `config`.
pub async fn rerank_passages<S: AsRef<str>>(
    query: &str,
    passages: &[S],
    embedding_scores: &[f32],
    config: &RerankConfig,
) -> Result<Vec<RerankResult>, RerankerError> {
    Reranker::new(config.clone())?
        .rerank_passages(query, passages, embedding_scores)
        .await
}
