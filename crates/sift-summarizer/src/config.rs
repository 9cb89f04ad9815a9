//! Configuration for the Summarizer

use crate::error::{Result, SummarizerError};
use serde::{Deserialize, Serialize};

/// How formatted rows are grouped into completion requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Fixed number of rows per chunk (`chunk_size` rows)
    #[default]
    ByRows,
    /// Greedy packing up to `chunk_size` approximate tokens (4 chars ~ 1 token)
    ByApproxTokens,
}

/// Configuration for the Summarizer
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizerConfig {
    /// Completion model name
    pub model: String,

    /// Fixed system instruction
    pub system_prompt: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Input budget per request, applied as a character count
    pub max_input_chars: usize,

    /// Cap on generated tokens per request
    pub max_output_tokens: u32,

    /// Rows (or approximate tokens) per chunk, depending on the strategy
    pub chunk_size: usize,

    /// Chunking strategy
    pub chunk_strategy: ChunkStrategy,
}

/// Default instruction for report generation
pub const DEFAULT_SYSTEM_PROMPT: &str = "You analyze forum discussions. Summarize the recurring \
themes, common difficulties, and practical advice found in the following threads and comments.";

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.3,
            max_input_chars: 12_000,
            max_output_tokens: 500,
            chunk_size: 3_000,
            chunk_strategy: ChunkStrategy::ByRows,
        }
    }
}

impl SummarizerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(SummarizerError::Config("model must not be empty".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(SummarizerError::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.max_input_chars == 0 {
            return Err(SummarizerError::Config(
                "max_input_chars must be greater than 0".to_string(),
            ));
        }
        if self.max_output_tokens == 0 {
            return Err(SummarizerError::Config(
                "max_output_tokens must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(SummarizerError::Config(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}
