//! Mock backend for testing without a live LLM.
//!
//! [`MockBackend`] returns pre-configured replies in order and records
//! every prompt it receives, so tests can assert how many calls a stage
//! made and what it sent.
//!
//! # Example
//!
//! ```
//! use product_recommender::backend::MockBackend;
//!
//! let mock = MockBackend::new(vec![
//!     "Title: Logitech M185\nPrice: $14.99\nRatings: 4.6\nURL: yes".to_string(),
//!     "Buy the Logitech M185.".to_string(),
//! ]);
//! assert_eq!(mock.call_count(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::Result;
use crate::PipelineError;

/// A test backend that returns canned replies in order.
///
/// Cycles back to the beginning when all replies have been consumed.
/// For streaming, emits each whitespace-separated word as its own token.
#[derive(Debug)]
pub struct MockBackend {
    responses: Vec<String>,
    index: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    fail_with: Option<u16>,
}

impl MockBackend {
    /// Create a mock backend with the given canned replies.
    ///
    /// An empty list behaves like a provider that always answers with
    /// empty text.
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            index: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    /// Create a mock that always returns the same reply.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Create a mock whose every call fails with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::new(Vec::new())
        }
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Number of calls made against this backend.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    fn next_response(&self, request: &LlmRequest) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }

        if let Some(status) = self.fail_with {
            return Err(PipelineError::HttpError {
                status,
                body: "mock failure".to_string(),
            });
        }

        if self.responses.is_empty() {
            return Ok(String::new());
        }
        let idx = self.index.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        Ok(self.responses[idx].clone())
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let text = self.next_response(request)?;
        Ok(LlmResponse { text, status: 200 })
    }

    async fn complete_streaming(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &LlmRequest,
        on_token: &mut (dyn FnMut(String) + Send),
    ) -> Result<LlmResponse> {
        let text = self.next_response(request)?;
        for token in text.split_inclusive(char::is_whitespace) {
            on_token(token.to_string());
        }
        Ok(LlmResponse { text, status: 200 })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
