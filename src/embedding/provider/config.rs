use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_TIMEOUT_MS, embedding_dimension};
use crate::embedding::error::EmbeddingError;

/// Model id reported by the local provider.
pub const FALLBACK_MODEL_ID: &str = "ngram-hash";

/// Live embedding backends this crate knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Local,
}

impl ProviderKind {
    /// Resolves a provider id (case-insensitive). `None` for unknown ids.
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "gemini" | "google" => Some(ProviderKind::Gemini),
            "" | "local" | "fallback" | "none" => Some(ProviderKind::Local),
            _ => None,
        }
    }

    /// Canonical id, as used in the dimension table.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Local => "local",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "text-embedding-3-small",
            ProviderKind::Gemini => "text-embedding-004",
            ProviderKind::Local => FALLBACK_MODEL_ID,
        }
    }

    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("https://api.openai.com/v1"),
            ProviderKind::Gemini => Some("https://generativelanguage.googleapis.com/v1beta"),
            ProviderKind::Local => None,
        }
    }

    /// Checks the credential's shape before any request is made.
    pub fn validate_credential(&self, credential: &str) -> Result<(), EmbeddingError> {
        if credential.is_empty() {
            return Err(EmbeddingError::Configuration {
                reason: "credential is empty".to_string(),
            });
        }
        if credential.chars().any(char::is_whitespace) {
            return Err(EmbeddingError::Configuration {
                reason: "credential contains whitespace".to_string(),
            });
        }

        let required_prefix = match self {
            ProviderKind::OpenAi => "sk-",
            ProviderKind::Gemini => "AIza",
            ProviderKind::Local => return Ok(()),
        };
        if !credential.starts_with(required_prefix) {
            return Err(EmbeddingError::Configuration {
                reason: format!(
                    "{} credential must start with '{}'",
                    self.id(),
                    required_prefix
                ),
            });
        }

        Ok(())
    }
}

/// Everything needed to build one [`EmbeddingProvider`](super::EmbeddingProvider).
///
/// The credential is never serialized and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub provider_id: String,
    pub model_id: String,
    #[serde(default, skip_serializing)]
    pub credential: Option<String>,
    /// Endpoint base override (self-hosted gateways, test servers).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Upper bound on each live call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Entries kept in the per-instance live vector memo. `0` disables it.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_cache_capacity() -> u64 {
    DEFAULT_CACHE_CAPACITY
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider_id", &self.provider_id)
            .field("model_id", &self.model_id)
            .field(
                "credential",
                &self.credential.as_ref().map(|_| "<redacted>"),
            )
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::fallback()
    }
}

impl ProviderConfig {
    pub fn new(provider_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
            credential: None,
            base_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Local provider: every call is served by the fallback embedder.
    pub fn fallback() -> Self {
        Self::new(ProviderKind::Local.id(), FALLBACK_MODEL_ID)
    }

    pub fn openai(model_id: impl Into<String>) -> Self {
        Self::new(ProviderKind::OpenAi.id(), model_id)
    }

    pub fn gemini(model_id: impl Into<String>) -> Self {
        Self::new(ProviderKind::Gemini.id(), model_id)
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
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

    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Reads `SEMRANK_PROVIDER`, `SEMRANK_MODEL`, `SEMRANK_API_KEY`, ... from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config::from_env()?.provider_config())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolved provider kind, `None` when `provider_id` is unknown.
    pub fn kind(&self) -> Option<ProviderKind> {
        ProviderKind::parse(&self.provider_id)
    }

    /// Output dimension for this (provider, model) pair.
    pub fn dimension(&self) -> usize {
        let provider = self.kind().map(|k| k.id()).unwrap_or(&self.provider_id);
        embedding_dimension(provider, &self.model_id)
    }

    /// Credential after trimming, `None` when absent or blank.
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }
}
