//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SEMRANK_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;

use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_RERANK_TOP_N, DEFAULT_TOP_K};
use crate::embedding::{ProviderConfig, ProviderKind};
use crate::rerank::{MockScoreMode, RerankBackendKind, RerankConfig};

/// Process configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SEMRANK_*` overrides on top of defaults.
#[derive(Clone)]
pub struct Config {
    /// Embedding provider id. Default: `local`.
    pub provider: String,

    /// Embedding model id. Default: the provider's default model.
    pub model: Option<String>,

    pub api_key: Option<String>,

    /// Embedding endpoint base override.
    pub api_base_url: Option<String>,

    /// Per-call timeout for live providers. Default: `30`.
    pub timeout_secs: u64,

    /// Default number of ranked passages. Default: `5`.
    pub top_k: usize,

    /// Rerank backend. Default: `none`.
    pub reranker: RerankBackendKind,

    pub reranker_model: Option<String>,

    pub reranker_api_key: Option<String>,

    /// Full rerank endpoint override.
    pub reranker_base_url: Option<String>,

    /// Passages forwarded to the reranker. Default: `10`.
    pub rerank_top_n: usize,

    /// Mock rerank offset mode. Default: `seeded`.
    pub mock_rerank: MockScoreMode,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("top_k", &self.top_k)
            .field("reranker", &self.reranker)
            .field("reranker_model", &self.reranker_model)
            .field(
                "reranker_api_key",
                &self.reranker_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("reranker_base_url", &self.reranker_base_url)
            .field("rerank_top_n", &self.rerank_top_n)
            .field("mock_rerank", &self.mock_rerank)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Local.id().to_string(),
            model: None,
            api_key: None,
            api_base_url: None,
            timeout_secs: 30,
            top_k: DEFAULT_TOP_K,
            reranker: RerankBackendKind::None,
            reranker_model: None,
            reranker_api_key: None,
            reranker_base_url: None,
            rerank_top_n: DEFAULT_RERANK_TOP_N,
            mock_rerank: MockScoreMode::Seeded,
        }
    }
}

impl Config {
    const ENV_PROVIDER: &'static str = "SEMRANK_PROVIDER";
    const ENV_MODEL: &'static str = "SEMRANK_MODEL";
    const ENV_API_KEY: &'static str = "SEMRANK_API_KEY";
    const ENV_API_BASE_URL: &'static str = "SEMRANK_API_BASE_URL";
    const ENV_TIMEOUT_SECS: &'static str = "SEMRANK_TIMEOUT_SECS";
    const ENV_TOP_K: &'static str = "SEMRANK_TOP_K";
    const ENV_RERANKER: &'static str = "SEMRANK_RERANKER";
    const ENV_RERANKER_MODEL: &'static str = "SEMRANK_RERANKER_MODEL";
    const ENV_RERANKER_API_KEY: &'static str = "SEMRANK_RERANKER_API_KEY";
    const ENV_RERANKER_BASE_URL: &'static str = "SEMRANK_RERANKER_BASE_URL";
    const ENV_RERANK_TOP_N: &'static str = "SEMRANK_RERANK_TOP_N";
    const ENV_MOCK_RERANK: &'static str = "SEMRANK_MOCK_RERANK";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let provider = Self::parse_optional_string_from_env(Self::ENV_PROVIDER)
            .unwrap_or(defaults.provider);
        let model = Self::parse_optional_string_from_env(Self::ENV_MODEL);
        let api_key = Self::parse_optional_string_from_env(Self::ENV_API_KEY);
        let api_base_url = Self::parse_optional_string_from_env(Self::ENV_API_BASE_URL);
        let timeout_secs =
            Self::parse_number_from_env(Self::ENV_TIMEOUT_SECS, defaults.timeout_secs)?;
        let top_k = Self::parse_number_from_env(Self::ENV_TOP_K, defaults.top_k)?;
        let reranker = Self::parse_reranker_from_env(defaults.reranker)?;
        let reranker_model = Self::parse_optional_string_from_env(Self::ENV_RERANKER_MODEL);
        let reranker_api_key = Self::parse_optional_string_from_env(Self::ENV_RERANKER_API_KEY);
        let reranker_base_url = Self::parse_optional_string_from_env(Self::ENV_RERANKER_BASE_URL);
        let rerank_top_n =
            Self::parse_number_from_env(Self::ENV_RERANK_TOP_N, defaults.rerank_top_n)?;
        let mock_rerank = Self::parse_mock_mode_from_env(defaults.mock_rerank)?;

        Ok(Self {
            provider,
            model,
            api_key,
            api_base_url,
            timeout_secs,
            top_k,
            reranker,
            reranker_model,
            reranker_api_key,
            reranker_base_url,
            rerank_top_n,
            mock_rerank,
        })
    }

    /// Checks numeric ranges. Unknown provider ids are not rejected here; the provider
    /// logs them and serves fallback embeddings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_TIMEOUT_SECS,
            });
        }
        if self.top_k == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_TOP_K,
            });
        }
        if self.rerank_top_n == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_RERANK_TOP_N,
            });
        }
        Ok(())
    }

    /// Builds the embedding provider configuration.
    pub fn provider_config(&self) -> ProviderConfig {
        let model = self.model.clone().unwrap_or_else(|| {
            ProviderKind::parse(&self.provider)
                .map(|kind| kind.default_model().to_string())
                .unwrap_or_default()
        });

        ProviderConfig {
            provider_id: self.provider.clone(),
            model_id: model,
            credential: self.api_key.clone(),
            base_url: self.api_base_url.clone(),
            timeout_ms: self.timeout_secs.saturating_mul(1000),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Builds the rerank configuration.
    pub fn rerank_config(&self) -> RerankConfig {
        RerankConfig {
            backend: self.reranker,
            model: self
                .reranker_model
                .clone()
                .unwrap_or_else(|| self.reranker.default_model().to_string()),
            credential: self.reranker_api_key.clone(),
            base_url: self.reranker_base_url.clone(),
            timeout_ms: self.timeout_secs.saturating_mul(1000),
            top_n: self.rerank_top_n,
            mock_mode: self.mock_rerank,
            ..RerankConfig::default()
        }
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_number_from_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match Self::parse_optional_string_from_env(name) {
            Some(value) => value.parse().map_err(|e| ConfigError::InvalidNumber {
                name,
                value: value.clone(),
                source: e,
            }),
            None => Ok(default),
        }
    }

    fn parse_reranker_from_env(
        default: RerankBackendKind,
    ) -> Result<RerankBackendKind, ConfigError> {
        match Self::parse_optional_string_from_env(Self::ENV_RERANKER) {
            Some(value) => RerankBackendKind::parse(&value).ok_or(ConfigError::InvalidValue {
                name: Self::ENV_RERANKER,
                value,
                expected: "cohere, jina or none",
            }),
            None => Ok(default),
        }
    }

    fn parse_mock_mode_from_env(default: MockScoreMode) -> Result<MockScoreMode, ConfigError> {
        match Self::parse_optional_string_from_env(Self::ENV_MOCK_RERANK) {
            Some(value) => MockScoreMode::parse(&value).ok_or(ConfigError::InvalidValue {
                name: Self::ENV_MOCK_RERANK,
                value,
                expected: "seeded or random",
            }),
            None => Ok(default),
        }
    }
}
