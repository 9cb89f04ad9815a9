//! OpenAI-compatible chat-completions provider
//!
//! Works against any endpoint that speaks the `/chat/completions` protocol.
//!
//! # Features
//!
//! - Blocking HTTP, so callers decide where to block (the pipeline runs it on
//!   `spawn_blocking` workers)
//! - Retry with exponential backoff on transport errors, 429 and 5xx
//! - Request timeout
//!
//! # Examples
//!
//! ```no_run
//! use sift_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new("sk-...").with_max_retries(5);
//! ```

use crate::LlmError;
use serde::{Deserialize, Serialize};
use sift_domain::{CompletionRequest, LlmProvider};
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default timeout for LLM requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts per request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Chat-completions provider
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider for the default OpenAI endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Point the provider at another compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the delay before the second attempt; it doubles on each retry
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    fn build_body<'a>(request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_text,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        }
    }

    /// One HTTP round trip, classified into an `LlmError`
    fn send_once(
        &self,
        url: &str,
        body: &ChatRequest<'_>,
        model: &str,
    ) -> Result<String, LlmError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let parsed: ChatResponse = response.json().map_err(|e| {
                LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
            })?;
            return parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()));
        }

        let error_text = response.text().unwrap_or_else(|_| "Unknown error".to_string());
        Err(match status {
            reqwest::StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                LlmError::Authentication(format!("HTTP {}: {}", status, error_text))
            }
            reqwest::StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(model.to_string()),
            s if s.is_server_error() => {
                LlmError::Communication(format!("HTTP {}: {}", s, error_text))
            }
            s => LlmError::Other(format!("HTTP {}: {}", s, error_text)),
        })
    }
}

impl LlmProvider for OpenAiProvider {
    type Error = LlmError;

    fn generate(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(request);

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.send_once(&url, &body, &request.model) {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempts < self.max_retries => {
                    // Exponential backoff: base, 2x base, 4x base, ...
                    let delay = self.base_delay * 2u32.pow(attempts - 1);
                    tracing::warn!(
                        "Completion attempt {}/{} failed: {}; retrying in {:?}",
                        attempts,
                        self.max_retries,
                        e,
                        delay
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
