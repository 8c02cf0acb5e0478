// Embeddings module
// Embedder seam, the Ollama-backed embedder and word-window chunking

pub mod chunking;
pub mod ollama;

use anyhow::Result;

pub use chunking::{ChunkingConfig, chunk_words};
pub use ollama::OllamaEmbedder;

/// Maps texts to fixed-dimension, unit-length vectors.
///
/// Implementations return exactly one vector per input, in input order.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;
}

/// Scale `vector` to unit length. Zero vectors are left unchanged.
#[inline]
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
