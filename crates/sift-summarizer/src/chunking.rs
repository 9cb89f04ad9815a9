//! Grouping formatted rows into request-sized chunks

use crate::config::ChunkStrategy;

/// Rows are joined with this separator inside a chunk
pub const ROW_SEPARATOR: &str = " ";

/// Characters per approximate token
const CHARS_PER_TOKEN: usize = 4;

/// Groups formatted rows according to a strategy
///
/// Rows are never split and their order is preserved.
pub struct RowChunker {
    strategy: ChunkStrategy,
    chunk_size: usize,
}

impl RowChunker {
    /// Create a chunker; a zero `chunk_size` is treated as 1
    pub fn new(strategy: ChunkStrategy, chunk_size: usize) -> Self {
        Self {
            strategy,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Chunk the rows, each chunk joined with [`ROW_SEPARATOR`]
    pub fn chunk(&self, rows: &[String]) -> Vec<String> {
        if rows.is_empty() {
            return Vec::new();
        }

        match self.strategy {
            ChunkStrategy::ByRows => rows
                .chunks(self.chunk_size)
                .map(|group| group.join(ROW_SEPARATOR))
                .collect(),
            ChunkStrategy::ByApproxTokens => self.chunk_by_approx_tokens(rows),
        }
    }

    fn chunk_by_approx_tokens(&self, rows: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0;

        for row in rows {
            let tokens = approx_tokens(row);
            if !current.is_empty() && current_tokens + tokens > self.chunk_size {
                chunks.push(current.join(ROW_SEPARATOR));
                current.clear();
                current_tokens = 0;
            }
            // An oversized row still gets a chunk of its own
            current.push(row);
            current_tokens += tokens;
        }

        if !current.is_empty() {
            chunks.push(current.join(ROW_SEPARATOR));
        }
        chunks
    }
}

/// Rough token estimate
pub fn approx_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Longest prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
