//! Runtime configuration.
//!
//! [`LlmConfig`] holds per-request sampling options. [`Settings`] is the
//! process-level configuration: provider credentials, endpoint and model.
//! It derives [`clap::Args`], so every field can come from a CLI flag or
//! its environment variable.

use crate::{error::Result, PipelineError};
use std::time::Duration;

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "mixtral-8x7b-32768";

/// Configuration for LLM requests.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f64,

    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 2048,
        }
    }
}

impl LlmConfig {
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }
}

/// Provider settings, read from flags or the environment.
#[derive(Debug, Clone, clap::Args)]
pub struct Settings {
    /// API key for the LLM provider
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "LLM_BASE_URL", default_value = crate::backend::openai::GROQ_BASE_URL)]
    pub base_url: String,

    /// Chat model identifier
    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature
    #[arg(long, env = "LLM_TEMPERATURE", default_value_t = 0.5)]
    pub temperature: f64,

    /// Maximum tokens per reply
    #[arg(long, env = "LLM_MAX_TOKENS", default_value_t = 2048)]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,
}

impl Settings {
    /// Settings with the given key and every other field at its default.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: crate::backend::openai::GROQ_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.5,
            max_tokens: 2048,
            timeout_secs: 60,
        }
    }

    /// Return the API key, or a configuration error if it is absent or blank.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(PipelineError::Configuration(format!(
                "{} is not set in the environment variables.",
                API_KEY_ENV
            ))),
        }
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig::default()
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
