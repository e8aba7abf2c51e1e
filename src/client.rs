//! LLM client shared by every pipeline stage.
//!
//! [`LlmClient`] carries the HTTP client, backend, endpoint, model and
//! sampling configuration. It is constructed once by the process entry
//! point and passed by reference to each stage; stages only read it.

use crate::backend::{Backend, LlmRequest, OpenAiBackend};
use crate::config::{LlmConfig, Settings, DEFAULT_MODEL};
use crate::error::Result;
use crate::events::{emit, Event, EventHandler};
use crate::PipelineError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Text-in/text-out handle on a hosted chat model.
///
/// # Example
///
/// ```
/// use product_recommender::{LlmClient, MockBackend};
/// use std::sync::Arc;
///
/// let client = LlmClient::builder("http://unused")
///     .backend(Arc::new(MockBackend::fixed("hello")))
///     .model("test-model")
///     .build()
///     .unwrap();
/// assert_eq!(client.model(), "test-model");
/// ```
pub struct LlmClient {
    http: Client,
    base_url: String,
    backend: Arc<dyn Backend>,
    model: String,
    config: LlmConfig,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl LlmClient {
    /// Create a new builder.
    pub fn builder(base_url: impl Into<String>) -> LlmClientBuilder {
        LlmClientBuilder {
            base_url: base_url.into(),
            backend: None,
            model: DEFAULT_MODEL.to_string(),
            config: LlmConfig::default(),
            event_handler: None,
            timeout: None,
        }
    }

    /// Build a Groq-backed client from process settings.
    ///
    /// Fails with [`PipelineError::Configuration`] when no API key is set.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let key = settings.require_api_key()?;
        Self::builder(&settings.base_url)
            .backend(Arc::new(OpenAiBackend::new().with_api_key(key)))
            .model(&settings.model)
            .config(settings.llm_config())
            .timeout(settings.timeout())
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Attach an event handler, replacing any existing one.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub(crate) fn events(&self) -> &Option<Arc<dyn EventHandler>> {
        &self.event_handler
    }

    fn request(&self, prompt: &str, stream: bool) -> LlmRequest {
        LlmRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            config: self.config.clone(),
            stream,
        }
    }

    /// Send one prompt and return the reply text.
    ///
    /// Exactly one backend call; errors propagate unchanged.
    pub async fn complete(&self, stage: &str, prompt: &str) -> Result<String> {
        debug!(stage, backend = self.backend.name(), prompt_len = prompt.len(), "calling LLM");
        let response = self
            .backend
            .complete(&self.http, &self.base_url, &self.request(prompt, false))
            .await?;
        debug!(stage, status = response.status, reply_len = response.text.len(), "LLM replied");
        Ok(response.text)
    }

    /// Send one prompt over the streaming endpoint.
    ///
    /// Each chunk is emitted as [`Event::Token`]; the accumulated text is
    /// returned.
    pub async fn complete_streaming(&self, stage: &str, prompt: &str) -> Result<String> {
        debug!(stage, backend = self.backend.name(), "streaming LLM call");
        let handler = self.event_handler.clone();
        let name = stage.to_string();
        let mut on_token = move |chunk: String| {
            emit(
                &handler,
                Event::Token {
                    stage: name.clone(),
                    chunk,
                },
            );
        };

        let response = self
            .backend
            .complete_streaming(
                &self.http,
                &self.base_url,
                &self.request(prompt, true),
                &mut on_token,
            )
            .await?;
        Ok(response.text)
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("config", &self.config)
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`LlmClient`].
pub struct LlmClientBuilder {
    base_url: String,
    backend: Option<Arc<dyn Backend>>,
    model: String,
    config: LlmConfig,
    event_handler: Option<Arc<dyn EventHandler>>,
    timeout: Option<Duration>,
}

impl LlmClientBuilder {
    /// Set the backend. Default: unauthenticated [`OpenAiBackend`].
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Set the request timeout. Default: 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<LlmClient> {
        let http = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
            .build()
            .map_err(|e| PipelineError::InvalidConfig(format!("HTTP client: {}", e)))?;

        if self.model.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "Model name cannot be empty".to_string(),
            ));
        }

        Ok(LlmClient {
            http,
            base_url: normalize_base_url(&self.base_url),
            backend: self
                .backend
                .unwrap_or_else(|| Arc::new(OpenAiBackend::new())),
            model: self.model,
            config: self.config,
            event_handler: self.event_handler,
        })
    }
}

/// Strip known endpoint suffixes so backends can append their own path.
/// e.g. "https://api.groq.com/openai/v1" -> "https://api.groq.com/openai"
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    for suffix in ["/v1/chat/completions", "/v1/chat", "/v1"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::events::FnEventHandler;
    use std::sync::Mutex;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.groq.com/openai/v1"),
            "https://api.groq.com/openai"
        );
        assert_eq!(
            normalize_base_url("https://api.groq.com/openai/v1/chat/completions"),
            "https://api.groq.com/openai"
        );
        assert_eq!(
            normalize_base_url("https://api.groq.com/openai/"),
            "https://api.groq.com/openai"
        );
        assert_eq!(normalize_base_url("http://localhost:8080"), "http://localhost:8080");
    }

    #[test]
    fn test_default_backend_is_openai() {
        let client = LlmClient::builder("https://api.groq.com/openai").build().unwrap();
        assert_eq!(client.backend_name(), "openai");
        assert_eq!(client.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_empty_model_rejected() {
        let result = LlmClient::builder("http://unused").model("  ").build();
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_settings_requires_key() {
        let mut settings = Settings::with_api_key("gsk_abc");
        assert!(LlmClient::from_settings(&settings).is_ok());

        settings.api_key = None;
        let err = LlmClient::from_settings(&settings).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_complete_single_call() {
        let mock = Arc::new(MockBackend::fixed("reply"));
        let client = LlmClient::builder("http://unused")
            .backend(mock.clone())
            .build()
            .unwrap();

        let text = client.complete("search", "prompt text").await.unwrap();
        assert_eq!(text, "reply");
        assert_eq!(mock.prompts(), vec!["prompt text"]);
    }

    #[tokio::test]
    async fn test_complete_propagates_errors() {
        let client = LlmClient::builder("http://unused")
            .backend(Arc::new(MockBackend::failing(401)))
            .build()
            .unwrap();

        let err = client.complete("search", "prompt").await.unwrap_err();
        assert!(matches!(err, PipelineError::HttpError { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_streaming_emits_tokens() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let client = LlmClient::builder("http://unused")
            .backend(Arc::new(MockBackend::fixed("Buy it now")))
            .event_handler(Arc::new(FnEventHandler(move |event| {
                if let Event::Token { stage, chunk } = event {
                    sink.lock().unwrap().push((stage, chunk));
                }
            })))
            .build()
            .unwrap();

        let text = client.complete_streaming("recommend", "prompt").await.unwrap();
        assert_eq!(text, "Buy it now");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|(stage, _)| stage == "recommend"));
    }
}
