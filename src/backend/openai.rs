//! Backend for OpenAI-compatible chat-completion APIs.
//!
//! Groq is the default provider; anything that speaks
//! `/v1/chat/completions` (OpenAI, Together, vLLM, llama.cpp server) works
//! by pointing the client at a different base URL.

use super::sse::DeltaDecoder;
use super::{Backend, LlmRequest, LlmResponse};
use crate::error::Result;
use crate::PipelineError;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

/// Groq's OpenAI-compatible API root.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai";

/// Backend for any OpenAI-compatible API.
///
/// # Example
///
/// ```
/// use product_recommender::backend::OpenAiBackend;
///
/// let backend = OpenAiBackend::new().with_api_key("gsk-...");
/// assert!(backend.has_api_key());
/// ```
#[derive(Clone, Default)]
pub struct OpenAiBackend {
    /// Sent as `Authorization: Bearer {key}` when set.
    pub(crate) api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("api_key", &self.api_key.as_deref().map(redact))
            .finish()
    }
}

/// Keep a short prefix of a secret so keys stay identifiable in logs.
fn redact(key: &str) -> String {
    match key.get(..6) {
        Some(prefix) if key.len() > 6 => format!("{}***", prefix),
        _ => "***".to_string(),
    }
}

impl OpenAiBackend {
    /// Create a backend without authentication.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the request body for `/v1/chat/completions`.
    ///
    /// The prompt is sent as a single user message.
    fn build_body(request: &LlmRequest) -> Value {
        json!({
            "model": request.model,
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.config.temperature,
            "max_tokens": request.config.max_tokens,
            "stream": request.stream,
        })
    }

    fn build_http_request(&self, client: &Client, url: &str, body: &Value) -> reqwest::RequestBuilder {
        let req = client.post(url).json(body);
        match self.api_key {
            Some(ref key) => req.bearer_auth(key),
            None => req,
        }
    }

    /// Send the request and turn non-2xx replies into [`PipelineError::HttpError`].
    async fn send(&self, client: &Client, base_url: &str, body: &Value) -> Result<reqwest::Response> {
        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
        debug!(%url, "sending chat completion request");

        let resp = self.build_http_request(client, &url, body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::HttpError { status, body: text });
        }

        Ok(resp)
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let body = Self::build_body(request);
        let resp = self.send(client, base_url, &body).await?;
        let status = resp.status().as_u16();
        let json_resp: Value = resp.json().await?;

        let text = json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(LlmResponse { text, status })
    }

    async fn complete_streaming(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
        on_token: &mut (dyn FnMut(String) + Send),
    ) -> Result<LlmResponse> {
        let body = Self::build_body(request);
        let resp = self.send(client, base_url, &body).await?;
        let status = resp.status().as_u16();

        let mut stream = resp.bytes_stream();
        let mut decoder = DeltaDecoder::new();
        let mut accumulated = String::new();

        while let Some(chunk) = stream.next().await {
            for delta in decoder.decode(&chunk?) {
                accumulated.push_str(&delta);
                on_token(delta);
            }
        }
        for delta in decoder.flush() {
            accumulated.push_str(&delta);
            on_token(delta);
        }

        Ok(LlmResponse {
            text: accumulated,
            status,
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    fn test_request() -> LlmRequest {
        LlmRequest {
            model: "mixtral-8x7b-32768".into(),
            prompt: "Find a wireless mouse".into(),
            config: LlmConfig::default(),
            stream: false,
        }
    }

    #[test]
    fn test_chat_body() {
        let body = OpenAiBackend::build_body(&test_request());

        assert_eq!(body["model"], "mixtral-8x7b-32768");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["stream"], false);

        let messages = body["messages"].as_array().expect("messages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "Find a wireless mouse");
    }

    #[test]
    fn test_streaming_body() {
        let mut request = test_request();
        request.stream = true;

        let body = OpenAiBackend::build_body(&request);
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"].as_array().expect("messages").len(), 1);
    }

    #[test]
    fn test_auth_headers() {
        let backend = OpenAiBackend::new().with_api_key("gsk-test123");

        let client = Client::new();
        let req = backend
            .build_http_request(&client, "https://api.groq.com/openai/v1/chat/completions", &json!({}))
            .build()
            .expect("build request");

        assert_eq!(req.headers()["Authorization"], "Bearer gsk-test123");
    }

    #[test]
    fn test_no_auth() {
        let client = Client::new();
        let req = OpenAiBackend::new()
            .build_http_request(&client, "http://localhost:8080/v1/chat/completions", &json!({}))
            .build()
            .expect("build request");

        assert!(req.headers().get("Authorization").is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let backend = OpenAiBackend::new().with_api_key("gsk_1234567890abcdef");
        let debug_output = format!("{:?}", backend);
        assert!(!debug_output.contains("1234567890abcdef"));
        assert!(debug_output.contains("gsk_12***"));
    }
}
