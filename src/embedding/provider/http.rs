//! Wire protocols of the live embedding backends.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedding::error::EmbeddingError;

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    model: String,
    content: GeminiContent<'a>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: [GeminiPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    embedding: GeminiValues,
}

#[derive(Debug, Deserialize)]
struct GeminiValues {
    values: Vec<f32>,
}

/// Connection state shared by both live backends.
pub(crate) struct HttpEmbedder {
    client: Client,
    base_url: String,
    credential: String,
    model: String,
    provider: &'static str,
    timeout_ms: u64,
}

impl std::fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl HttpEmbedder {
    pub(crate) fn new(
        client: Client,
        base_url: &str,
        credential: &str,
        model: &str,
        provider: &'static str,
        timeout_ms: u64,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential: credential.to_string(),
            model: model.to_string(),
            provider,
            timeout_ms,
        }
    }

    /// `POST {base}/embeddings` with a bearer token.
    pub(crate) async fn embed_openai(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        debug!(provider = self.provider, text_len = text.len(), "Requesting embedding");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.credential)
            .json(&OpenAiRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = self.check_status(response).await?;
        let parsed: OpenAiResponse =
            response
                .json()
                .await
                .map_err(|e| EmbeddingError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                reason: "response `data` array is empty".to_string(),
            })
    }

    /// `POST {base}/models/{model}:embedContent` with the key in `x-goog-api-key`.
    pub(crate) async fn embed_gemini(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = self.model.strip_prefix("models/").unwrap_or(&self.model);
        let url = format!("{}/models/{}:embedContent", self.base_url, model);
        debug!(provider = self.provider, text_len = text.len(), "Requesting embedding");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.credential)
            .json(&GeminiRequest {
                model: format!("models/{model}"),
                content: GeminiContent {
                    parts: [GeminiPart { text }],
                },
            })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = self.check_status(response).await?;
        let parsed: GeminiResponse =
            response
                .json()
                .await
                .map_err(|e| EmbeddingError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        Ok(parsed.embedding.values)
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, EmbeddingError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(self.provider, status, body))
    }

    fn transport_error(&self, err: reqwest::Error) -> EmbeddingError {
        if err.is_timeout() {
            EmbeddingError::Timeout {
                provider: self.provider.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else {
            EmbeddingError::Network {
                provider: self.provider.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Maps a non-2xx response onto the error taxonomy.
pub(crate) fn classify_status(provider: &str, status: StatusCode, body: String) -> EmbeddingError {
    let provider = provider.to_string();
    let lowered = body.to_ascii_lowercase();

    match status.as_u16() {
        401 | 403 => EmbeddingError::Unauthorized { provider },
        402 => EmbeddingError::QuotaExceeded { provider },
        _ if is_quota_body(&lowered) => EmbeddingError::QuotaExceeded { provider },
        429 => EmbeddingError::RateLimited { provider },
        code => EmbeddingError::Http {
            provider,
            status: code,
            body,
        },
    }
}

fn is_quota_body(lowered: &str) -> bool {
    lowered.contains("insufficient_quota")
        || lowered.contains("exceeded your current quota")
        || lowered.contains("quota exceeded")
}
