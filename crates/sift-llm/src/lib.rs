//! Sift LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `sift-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI-compatible chat-completions API
//!
//! # Examples
//!
//! ```
//! use sift_llm::MockProvider;
//! use sift_domain::{CompletionRequest, LlmProvider};
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let request = CompletionRequest {
//!     model: "test".to_string(),
//!     system_prompt: "Summarize".to_string(),
//!     user_text: "text".to_string(),
//!     temperature: 0.3,
//!     max_output_tokens: 100,
//! };
//! assert_eq!(provider.generate(&request).unwrap(), "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod openai;

use sift_domain::{CompletionRequest, LlmProvider};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Missing or rejected credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Communication(_) | LlmError::RateLimitExceeded)
    }
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without any network calls and records
/// every request it receives.
///
/// # Examples
///
/// ```
/// use sift_llm::MockProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("chunk one", "summary one");
/// provider.add_error("chunk two");
/// provider.fail_on_call(3);
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    errors: Arc<Mutex<HashSet<String>>>,
    failing_calls: Arc<Mutex<HashSet<usize>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all requests
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            errors: Arc::new(Mutex::new(HashSet::new())),
            failing_calls: Arc::new(Mutex::new(HashSet::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a specific response for a given user text
    pub fn add_response(&mut self, user_text: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(user_text.into(), response.into());
    }

    /// Configure to return an error for a specific user text
    pub fn add_error(&mut self, user_text: impl Into<String>) {
        self.errors.lock().unwrap().insert(user_text.into());
    }

    /// Configure the n-th call (1-based) to fail
    pub fn fail_on_call(&mut self, call: usize) {
        self.failing_calls.lock().unwrap().insert(call);
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// All requests received so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn generate(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        if self.failing_calls.lock().unwrap().contains(&call) {
            return Err(LlmError::Other(format!("Mock failure on call {}", call)));
        }
        if self.errors.lock().unwrap().contains(&request.user_text) {
            return Err(LlmError::Other("Mock error".to_string()));
        }

        let responses = self.responses.lock().unwrap();
        if let Some(response) = responses.get(&request.user_text) {
            return Ok(response.clone());
        }

        Ok(self.default_response.clone())
    }
}
