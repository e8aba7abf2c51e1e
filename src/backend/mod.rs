//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over LLM providers, translating between
//! normalized [`LlmRequest`]/[`LlmResponse`] types and provider-specific
//! HTTP APIs. Built-in implementations: [`OpenAiBackend`] (Groq and any
//! other OpenAI-compatible service) and [`MockBackend`] for tests.
//!
//! ```text
//! LlmClient ──► LlmRequest ──► Backend::complete() ──► LlmResponse
//!                                      │
//!                            ┌─────────┴─────────┐
//!                      OpenAiBackend         MockBackend
//!                  /v1/chat/completions    canned replies
//!                     SSE streaming
//! ```

pub mod mock;
pub mod openai;
pub mod sse;

pub use mock::MockBackend;
pub use openai::OpenAiBackend;

use crate::config::LlmConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;

/// A normalized LLM request, provider-agnostic.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Model identifier (e.g. `"mixtral-8x7b-32768"`).
    pub model: String,

    /// The user prompt text.
    pub prompt: String,

    /// Sampling configuration.
    pub config: LlmConfig,

    /// Whether to use the streaming endpoint.
    pub stream: bool,
}

/// A normalized LLM response.
#[derive(Debug)]
pub struct LlmResponse {
    /// The generated text content.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,
}

/// Abstraction over LLM providers.
///
/// One call in, one text out. Implementations never retry: a transport
/// or API failure is returned to the caller as-is.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a non-streaming LLM call.
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse>;

    /// Execute a streaming LLM call.
    ///
    /// `on_token` is called for each token as it arrives. The final
    /// accumulated text is returned as an [`LlmResponse`].
    async fn complete_streaming(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
        on_token: &mut (dyn FnMut(String) + Send),
    ) -> Result<LlmResponse>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}
