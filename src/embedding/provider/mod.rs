//! Live embedding providers with per-item fallback.
//!
//! An [`EmbeddingProvider`] is built from one [`ProviderConfig`] per request and owns
//! everything it needs. When the live backend is missing, misconfigured or failing, the
//! affected texts are embedded by [`fallback_embedding`] at the same dimension, so callers
//! always receive vectors of a single length.

/// Provider configuration.
pub mod config;
pub(crate) mod http;


pub use config::{FALLBACK_MODEL_ID, ProviderConfig, ProviderKind};

use std::collections::HashMap;

use futures_util::future::join_all;
use moka::sync::Cache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedding::error::EmbeddingError;
use crate::embedding::fallback::fallback_embedding;

use http::HttpEmbedder;

/// Where one vector in a batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingSource {
    Live,
    Fallback,
}

/// Provider lifecycle, observable through [`EmbeddingProvider::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    /// No usable live backend; every call is served by the fallback.
    Unconfigured,
    /// Live backend ready, no call made yet.
    Configured,
    InFlight,
    /// The most recent call was live end-to-end.
    Succeeded,
    /// The most recent call substituted the fallback for at least one text.
    FallbackUsed,
}

/// Output of a batch call: one vector and one source per input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingBatch {
    pub vectors: Vec<Vec<f32>>,
    pub sources: Vec<EmbeddingSource>,
    pub dimension: usize,
}

impl EmbeddingBatch {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// `true` when every vector came from the live backend (and the batch is nonempty).
    pub fn all_live(&self) -> bool {
        !self.sources.is_empty() && self.sources.iter().all(|s| *s == EmbeddingSource::Live)
    }

    pub fn live_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| **s == EmbeddingSource::Live)
            .count()
    }

    pub fn into_vectors(self) -> Vec<Vec<f32>> {
        self.vectors
    }
}

enum Backend {
    OpenAi(HttpEmbedder),
    Gemini(HttpEmbedder),
    Fallback,
}

impl Backend {
    fn is_live(&self) -> bool {
        !matches!(self, Backend::Fallback)
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match self {
            Backend::OpenAi(http) => http.embed_openai(text).await,
            Backend::Gemini(http) => http.embed_gemini(text).await,
            Backend::Fallback => Err(EmbeddingError::Configuration {
                reason: "no live backend configured".to_string(),
            }),
        }
    }
}

#[derive(Debug)]
struct CallStatus {
    state: ProviderState,
    used_real_api: bool,
    sources: Vec<EmbeddingSource>,
    last_error: Option<EmbeddingError>,
}

/// Embedding generator for one request.
pub struct EmbeddingProvider {
    config: ProviderConfig,
    dimension: usize,
    backend: Backend,
    cache: Option<Cache<String, Vec<f32>>>,
    status: Mutex<CallStatus>,
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field(
                "backend",
                &match &self.backend {
                    Backend::OpenAi(_) => "OpenAi",
                    Backend::Gemini(_) => "Gemini",
                    Backend::Fallback => "Fallback",
                },
            )
            .field("config", &self.config)
            .field("dimension", &self.dimension)
            .field("state", &self.state())
            .finish()
    }
}

impl EmbeddingProvider {
    /// Builds a provider. Never fails: configuration problems are logged, recorded as
    /// [`last_error`](Self::last_error) and leave the provider on the fallback.
    pub fn new(config: ProviderConfig) -> Self {
        let dimension = config.dimension();

        let (backend, config_error) = match Self::build_backend(&config) {
            Ok(backend) => (backend, None),
            Err(err) => {
                warn!(
                    provider = %config.provider_id,
                    model = %config.model_id,
                    error = %err,
                    "Embedding provider misconfigured, using fallback embeddings"
                );
                (Backend::Fallback, Some(err))
            }
        };

        let state = if backend.is_live() {
            info!(
                provider = %config.provider_id,
                model = %config.model_id,
                dimension,
                "Live embedding provider configured"
            );
            ProviderState::Configured
        } else {
            debug!(
                provider = %config.provider_id,
                dimension,
                "No live embedding backend, fallback only"
            );
            ProviderState::Unconfigured
        };

        let cache = (backend.is_live() && config.cache_capacity > 0)
            .then(|| Cache::new(config.cache_capacity));

        Self {
            config,
            dimension,
            backend,
            cache,
            status: Mutex::new(CallStatus {
                state,
                used_real_api: false,
                sources: Vec::new(),
                last_error: config_error,
            }),
        }
    }

    /// Provider that never leaves the process.
    pub fn fallback() -> Self {
        Self::new(ProviderConfig::fallback())
    }

    fn build_backend(config: &ProviderConfig) -> Result<Backend, EmbeddingError> {
        let kind = config.kind().ok_or_else(|| EmbeddingError::Configuration {
            reason: format!("unknown provider id '{}'", config.provider_id),
        })?;

        if kind == ProviderKind::Local {
            return Ok(Backend::Fallback);
        }

        let Some(credential) = config.credential() else {
            return Ok(Backend::Fallback);
        };
        kind.validate_credential(credential)?;

        let base_url = config
            .base_url
            .as_deref()
            .or(kind.default_base_url())
            .ok_or_else(|| EmbeddingError::Configuration {
                reason: format!("no endpoint for provider '{}'", kind.id()),
            })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EmbeddingError::Configuration {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        let http = HttpEmbedder::new(
            client,
            base_url,
            credential,
            &config.model_id,
            kind.id(),
            config.timeout_ms,
        );

        Ok(match kind {
            ProviderKind::OpenAi => Backend::OpenAi(http),
            ProviderKind::Gemini => Backend::Gemini(http),
            ProviderKind::Local => Backend::Fallback,
        })
    }

    /// Embeds one text. Never fails; see [`generate_embeddings`](Self::generate_embeddings).
    pub async fn generate_embedding(&self, text: &str) -> Vec<f32> {
        self.generate_embeddings(&[text])
            .await
            .vectors
            .pop()
            .unwrap_or_else(|| fallback_embedding(text, self.dimension))
    }

    /// Embeds every text, issuing the live calls concurrently.
    ///
    /// Each text whose live call fails is replaced by its fallback vector; the batch as a
    /// whole never fails. Identical texts are requested once.
    pub async fn generate_embeddings<S: AsRef<str>>(&self, texts: &[S]) -> EmbeddingBatch {
        if texts.is_empty() {
            self.record(Vec::new(), None);
            return EmbeddingBatch {
                vectors: Vec::new(),
                sources: Vec::new(),
                dimension: self.dimension,
            };
        }

        if !self.backend.is_live() {
            debug!(texts = texts.len(), dimension = self.dimension, "Fallback embeddings");
            let vectors = texts
                .iter()
                .map(|t| fallback_embedding(t.as_ref(), self.dimension))
                .collect();
            let sources = vec![EmbeddingSource::Fallback; texts.len()];
            self.record(sources.clone(), None);
            return EmbeddingBatch {
                vectors,
                sources,
                dimension: self.dimension,
            };
        }

        self.status.lock().state = ProviderState::InFlight;

        let mut unique: Vec<&str> = Vec::new();
        let mut slot_by_text: HashMap<&str, usize> = HashMap::new();
        let slots: Vec<usize> = texts
            .iter()
            .map(|t| {
                let text = t.as_ref();
                *slot_by_text.entry(text).or_insert_with(|| {
                    unique.push(text);
                    unique.len() - 1
                })
            })
            .collect();

        debug!(
            texts = texts.len(),
            unique = unique.len(),
            provider = %self.config.provider_id,
            "Requesting live embeddings"
        );

        let outcomes = join_all(unique.iter().map(|text| self.embed_live(text))).await;

        let mut last_error = None;
        for (text, outcome) in unique.iter().zip(&outcomes) {
            if let Err(err) = outcome {
                warn!(
                    provider = %self.config.provider_id,
                    text_len = text.len(),
                    error = %err,
                    "Live embedding failed, substituting fallback vector"
                );
                last_error = Some(err.clone());
            }
        }

        let mut vectors = Vec::with_capacity(texts.len());
        let mut sources = Vec::with_capacity(texts.len());
        for (text, slot) in texts.iter().zip(slots) {
            match &outcomes[slot] {
                Ok(vector) => {
                    vectors.push(vector.clone());
                    sources.push(EmbeddingSource::Live);
                }
                Err(_) => {
                    vectors.push(fallback_embedding(text.as_ref(), self.dimension));
                    sources.push(EmbeddingSource::Fallback);
                }
            }
        }

        self.record(sources.clone(), last_error);
        EmbeddingBatch {
            vectors,
            sources,
            dimension: self.dimension,
        }
    }

    async fn embed_live(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(text)
        {
            return Ok(hit);
        }

        let vector = tokio::time::timeout(self.config.timeout(), self.backend.request(text))
            .await
            .map_err(|_| EmbeddingError::Timeout {
                provider: self.config.provider_id.clone(),
                timeout_ms: self.config.timeout_ms,
            })??;

        if vector.len() != self.dimension {
            return Err(EmbeddingError::InvalidResponse {
                reason: format!(
                    "expected {} dimensions, got {}",
                    self.dimension,
                    vector.len()
                ),
            });
        }

        if let Some(cache) = &self.cache {
            cache.insert(text.to_string(), vector.clone());
        }
        Ok(vector)
    }

    fn record(&self, sources: Vec<EmbeddingSource>, error: Option<EmbeddingError>) {
        let mut status = self.status.lock();
        let all_live = !sources.is_empty() && sources.iter().all(|s| *s == EmbeddingSource::Live);

        status.used_real_api = all_live;
        if self.backend.is_live() && !sources.is_empty() {
            status.state = if all_live {
                ProviderState::Succeeded
            } else {
                ProviderState::FallbackUsed
            };
        }
        status.sources = sources;
        if error.is_some() {
            status.last_error = error;
        }
    }

    /// `true` only if every text of the most recent call was embedded live.
    pub fn was_real_api_used(&self) -> bool {
        self.status.lock().used_real_api
    }

    /// Per-text sources of the most recent call.
    pub fn last_sources(&self) -> Vec<EmbeddingSource> {
        self.status.lock().sources.clone()
    }

    /// Most recent configuration or provider failure, if any.
    pub fn last_error(&self) -> Option<EmbeddingError> {
        self.status.lock().last_error.clone()
    }

    pub fn state(&self) -> ProviderState {
        self.status.lock().state
    }

    /// `true` when a live backend is configured (calls may still fall back).
    pub fn is_live(&self) -> bool {
        self.backend.is_live()
    }

    pub fn provider_id(&self) -> &str {
        &self.config.provider_id
    }

    pub fn model_id(&self) -> &str {
        &self.config.model_id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
