//! Configuration for OpenAI-compatible chat completion endpoints.

use std::time::Duration;

use url::Url;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Configuration for the intent extractor.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,

    /// Base URL up to and including the version segment.
    pub base_url: String,

    /// Chat model; must support `response_format: json_object`.
    pub model: String,

    /// HTTP timeout for a single request.
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_API_BASE.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("api key is required".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.timeout.is_zero() {
            return Err("timeout must be positive".to_string());
        }
        let url = Url::parse(&self.base_url).map_err(|e| format!("invalid base url: {}", e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("base url must be http(s), got {}", url.scheme()));
        }
        Ok(())
    }
}
