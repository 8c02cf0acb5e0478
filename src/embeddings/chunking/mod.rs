#[cfg(test)]
mod tests;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for word-window chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Number of words per chunk
    pub chunk_size: usize,
    /// Number of words shared by adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
        }
    }
}

/// Split text into overlapping windows of whitespace-separated words.
///
/// Each window holds `chunk_size` words, except possibly the last. Each window
/// after the first starts `chunk_size - chunk_overlap` words after the previous
/// one, and the last window always ends at the final word.
#[inline]
pub fn chunk_words(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    if config.chunk_size == 0 {
        bail!("Chunk size must be greater than zero");
    }
    if config.chunk_overlap >= config.chunk_size {
        bail!(
            "Chunk overlap ({}) must be smaller than chunk size ({})",
            config.chunk_overlap,
            config.chunk_size
        );
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + config.chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start = end - config.chunk_overlap;
    }

    debug!(
        "Chunked {} words into {} chunks (size {}, overlap {})",
        words.len(),
        chunks.len(),
        config.chunk_size,
        config.chunk_overlap
    );

    Ok(chunks)
}
