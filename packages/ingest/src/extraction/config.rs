use crate::error::{IngestError, Result};

const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the structured-extraction collaborator.
///
/// NOTE: Do NOT derive `Debug` on this struct; `api_key` would be exposed.
#[derive(Clone)]
pub struct ExtractionConfig {
    pub model: String,
    pub api_key: String,
    pub api_base_url: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ExtractionConfig {
    /// Load configuration from environment variables.
    ///
    /// Fails with [`IngestError::Config`] when `LLM_API_KEY` is not set, which
    /// callers treat as "structured extraction unavailable".
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| IngestError::Config("LLM_API_KEY not set".into()))?;

        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        let api_base_url =
            std::env::var("LLM_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.into());

        let max_tokens = std::env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            model,
            api_key,
            api_base_url,
            max_tokens,
            timeout_secs,
        })
    }

    /// Create a config builder for testing.
    pub fn builder(api_key: impl Into<String>) -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Builder for constructing `ExtractionConfig` in tests.
pub struct ExtractionConfigBuilder {
    api_key: String,
    model: String,
    api_base_url: String,
    max_tokens: u32,
    timeout_secs: u64,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn build(self) -> ExtractionConfig {
        ExtractionConfig {
            model: self.model,
            api_key: self.api_key,
            api_base_url: self.api_base_url,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs,
        }
    }
}
