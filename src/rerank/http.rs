//! HTTP rerank backends (Cohere, Jina).
//!
//! Both speak `{"model","query","documents","top_n"}` and answer with
//! `{"results":[{"index","relevance_score"}]}`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::RerankerError;

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [&'a str],
    top_n: usize,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankHit>,
}

#[derive(Debug, Deserialize)]
struct RerankHit {
    index: usize,
    relevance_score: f64,
}

pub(crate) struct HttpReranker {
    client: Client,
    endpoint: String,
    credential: String,
    model: String,
    backend: &'static str,
    timeout_ms: u64,
}

impl std::fmt::Debug for HttpReranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpReranker")
            .field("backend", &self.backend)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl HttpReranker {
    pub(crate) fn new(
        client: Client,
        endpoint: &str,
        credential: &str,
        model: &str,
        backend: &'static str,
        timeout_ms: u64,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            credential: credential.to_string(),
            model: model.to_string(),
            backend,
            timeout_ms,
        }
    }

    pub(crate) fn backend(&self) -> &'static str {
        self.backend
    }

    /// Scores every document on `[0, 100]`, in input order.
    ///
    /// A response that leaves any document unscored is an error.
    pub(crate) async fn score(
        &self,
        query: &str,
        documents: &[&str],
    ) -> Result<Vec<f32>, RerankerError> {
        debug!(
            backend = self.backend,
            documents = documents.len(),
            "Requesting rerank scores"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.credential)
            .json(&RerankRequest {
                model: &self.model,
                query,
                documents,
                top_n: documents.len(),
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RerankerError::Timeout {
                        backend: self.backend.to_string(),
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    RerankerError::Network {
                        backend: self.backend.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let backend = self.backend.to_string();
            return Err(match status.as_u16() {
                401 | 403 => RerankerError::Unauthorized { backend },
                429 => RerankerError::RateLimited { backend },
                code => RerankerError::Http {
                    backend,
                    status: code,
                    body,
                },
            });
        }

        let parsed: RerankResponse =
            response
                .json()
                .await
                .map_err(|e| RerankerError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        scores_by_index(parsed.results, documents.len())
    }
}

fn scores_by_index(hits: Vec<RerankHit>, expected: usize) -> Result<Vec<f32>, RerankerError> {
    let mut scores: Vec<Option<f32>> = vec![None; expected];

    for hit in hits {
        let slot = scores
            .get_mut(hit.index)
            .ok_or_else(|| RerankerError::InvalidResponse {
                reason: format!("result index {} out of range 0..{}", hit.index, expected),
            })?;
        *slot = Some(((hit.relevance_score * 100.0) as f32).clamp(0.0, 100.0));
    }

    scores
        .into_iter()
        .enumerate()
        .map(|(index, score)| {
            score.ok_or_else(|| RerankerError::InvalidResponse {
                reason: format!("no score returned for document {index}"),
            })
        })
        .collect()
}
