use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::constants::{
    DEFAULT_EMBEDDING_WEIGHT, DEFAULT_RERANK_TOP_N, DEFAULT_RERANK_WEIGHT, DEFAULT_TIMEOUT_MS,
};

/// Live rerank services speaking the `{"model","query","documents"}` protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerankBackendKind {
    Cohere,
    Jina,
    #[default]
    None,
}

impl RerankBackendKind {
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "cohere" => Some(RerankBackendKind::Cohere),
            "jina" => Some(RerankBackendKind::Jina),
            "" | "none" | "mock" => Some(RerankBackendKind::None),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            RerankBackendKind::Cohere => "cohere",
            RerankBackendKind::Jina => "jina",
            RerankBackendKind::None => "none",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            RerankBackendKind::Cohere => "rerank-v3.5",
            RerankBackendKind::Jina => "jina-reranker-v2-base-multilingual",
            RerankBackendKind::None => "",
        }
    }

    /// Full rerank endpoint URL.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            RerankBackendKind::Cohere => Some("https://api.cohere.com/v2/rerank"),
            RerankBackendKind::Jina => Some("https://api.jina.ai/v1/rerank"),
            RerankBackendKind::None => None,
        }
    }
}

/// How mock rerank scores are perturbed when no live reranker answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockScoreMode {
    /// Offset derived from a hash of (query, passage, index). Reproducible.
    #[default]
    Seeded,
    /// Offset drawn from the thread RNG.
    Random,
}

impl MockScoreMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "seeded" | "deterministic" => Some(MockScoreMode::Seeded),
            "random" => Some(MockScoreMode::Random),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankConfig {
    #[serde(default)]
    pub backend: RerankBackendKind,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing)]
    pub credential: Option<String>,
    /// Full endpoint URL override.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Passages forwarded by [`rerank_similarity_results`](super::Reranker::rerank_similarity_results).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_embedding_weight")]
    pub embedding_weight: f32,
    #[serde(default = "default_rerank_weight")]
    pub rerank_weight: f32,
    #[serde(default)]
    pub mock_mode: MockScoreMode,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_top_n() -> usize {
    DEFAULT_RERANK_TOP_N
}

fn default_embedding_weight() -> f32 {
    DEFAULT_EMBEDDING_WEIGHT
}

fn default_rerank_weight() -> f32 {
    DEFAULT_RERANK_WEIGHT
}

impl std::fmt::Debug for RerankConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RerankConfig")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field(
                "credential",
                &self.credential.as_ref().map(|_| "<redacted>"),
            )
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("top_n", &self.top_n)
            .field("embedding_weight", &self.embedding_weight)
            .field("rerank_weight", &self.rerank_weight)
            .field("mock_mode", &self.mock_mode)
            .finish()
    }
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            backend: RerankBackendKind::None,
            model: String::new(),
            credential: None,
            base_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            top_n: DEFAULT_RERANK_TOP_N,
            embedding_weight: DEFAULT_EMBEDDING_WEIGHT,
            rerank_weight: DEFAULT_RERANK_WEIGHT,
            mock_mode: MockScoreMode::Seeded,
        }
    }
}

impl RerankConfig {
    /// No live backend; every call uses mock scores.
    pub fn mock() -> Self {
        Self::default()
    }

    pub fn cohere(api_key: impl Into<String>) -> Self {
        Self::for_backend(RerankBackendKind::Cohere, api_key)
    }

    pub fn jina(api_key: impl Into<String>) -> Self {
        Self::for_backend(RerankBackendKind::Jina, api_key)
    }

    fn for_backend(backend: RerankBackendKind, api_key: impl Into<String>) -> Self {
        Self {
            backend,
            model: backend.default_model().to_string(),
            credential: Some(api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_mock_mode(mut self, mode: MockScoreMode) -> Self {
        self.mock_mode = mode;
        self
    }

    /// Sets the fusion weights.
    ///
    /// # Panics
    ///
    /// If either weight is outside `[0, 1]` or they do not sum to 1.
    pub fn with_weights(mut self, embedding_weight: f32, rerank_weight: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&embedding_weight) && (0.0..=1.0).contains(&rerank_weight),
            "weights must be between 0.0 and 1.0"
        );
        assert!(
            (embedding_weight + rerank_weight - 1.0).abs() < 1e-4,
            "weights must sum to 1.0"
        );
        self.embedding_weight = embedding_weight;
        self.rerank_weight = rerank_weight;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, weight) in [
            ("embedding_weight", self.embedding_weight),
            ("rerank_weight", self.rerank_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(format!("{name} must be between 0.0 and 1.0, got {weight}"));
            }
        }

        let sum = self.embedding_weight + self.rerank_weight;
        if (sum - 1.0).abs() >= 1e-4 {
            return Err(format!("weights must sum to 1.0, got {sum}"));
        }

        if self.top_n == 0 {
            return Err("top_n must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config::from_env()?.rerank_config())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Credential after trimming, `None` when absent or blank.
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Endpoint to call: the override, or the backend default.
    pub fn endpoint(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .or_else(|| self.backend.default_endpoint())
    }

    /// Model to request: the configured one, or the backend default.
    pub fn model(&self) -> &str {
        if self.model.trim().is_empty() {
            self.backend.default_model()
        } else {
            &self.model
        }
    }
}
