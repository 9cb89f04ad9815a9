//! Chunked report generation

use crate::chunking::{truncate_chars, RowChunker};
use crate::config::SummarizerConfig;
use crate::error::Result;
use sift_domain::{CompletionRequest, LlmProvider, TextRow};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one summarization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Successful chunk outputs joined by newlines, in chunk order
    pub text: String,
    /// Chunks sent to the provider
    pub chunks: usize,
    /// Chunks whose request failed and were left out
    pub failed_chunks: usize,
}

/// Turns stored rows into a report by summarizing chunk after chunk
pub struct Summarizer<P> {
    llm: Arc<P>,
    config: SummarizerConfig,
}

impl<P: LlmProvider> Summarizer<P> {
    /// Create a summarizer, rejecting invalid configuration
    pub fn new(llm: Arc<P>, config: SummarizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { llm, config })
    }

    /// Report text for the rows; empty when there is nothing to say
    pub fn summarize(&self, rows: &[TextRow]) -> String {
        self.summarize_detailed(rows).text
    }

    /// Like [`Summarizer::summarize`], with chunk accounting
    pub fn summarize_detailed(&self, rows: &[TextRow]) -> Summary {
        let chunks = self.chunks(rows);
        let mut outputs = Vec::with_capacity(chunks.len());
        let mut failed_chunks = 0;

        for (index, chunk) in chunks.iter().enumerate() {
            let request = CompletionRequest {
                model: self.config.model.clone(),
                system_prompt: self.config.system_prompt.clone(),
                user_text: truncate_chars(chunk, self.config.max_input_chars).to_string(),
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            };

            match self.llm.generate(&request) {
                Ok(text) if text.trim().is_empty() => {
                    debug!("Chunk {}/{} returned no text, omitting it", index + 1, chunks.len());
                }
                Ok(text) => outputs.push(text),
                Err(e) => {
                    failed_chunks += 1;
                    warn!("Chunk {}/{} failed, omitting it: {}", index + 1, chunks.len(), e);
                }
            }
        }

        info!(
            "Summarized {} rows in {} chunks ({} failed)",
            rows.len(),
            chunks.len(),
            failed_chunks
        );
        Summary {
            text: outputs.join("\n"),
            chunks: chunks.len(),
            failed_chunks,
        }
    }

    /// Request texts the rows would be sent as, before truncation
    pub fn chunks(&self, rows: &[TextRow]) -> Vec<String> {
        let formatted: Vec<String> = rows.iter().map(TextRow::render).collect();
        RowChunker::new(self.config.chunk_strategy, self.config.chunk_size).chunk(&formatted)
    }
}
