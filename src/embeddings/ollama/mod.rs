
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedder, normalize};
use crate::config::OllamaConfig;
use crate::ollama::OllamaClient;

/// Embedding dimension of the default `all-minilm` model
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 384;

/// Embedder backed by the Ollama `/api/embed` endpoint
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    batch_size: usize,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    model: &'a str,
    #[serde(rename = "input")]
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = OllamaClient::new(config).context("Failed to initialize Ollama client")?;
        Ok(Self::with_client(client, config))
    }

    #[inline]
    pub fn with_client(client: OllamaClient, config: &OllamaConfig) -> Self {
        Self {
            client,
            model: config.embedding_model.clone(),
            batch_size: config.batch_size.max(1) as usize,
            dimension: config.embedding_dimension as usize,
        }
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = BatchEmbedRequest {
            model: &self.model,
            inputs: texts,
        };

        let response: BatchEmbedResponse = self
            .client
            .post_json("/api/embed", &request)
            .context("Failed to generate batch embeddings")?;

        if response.embeddings.len() != texts.len() {
            anyhow::bail!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.embeddings.len()
            );
        }

        response
            .embeddings
            .into_iter()
            .map(|mut embedding| {
                if embedding.len() != self.dimension {
                    anyhow::bail!(
                        "Model {} returned {} dimensions, expected {}",
                        self.model,
                        embedding.len(),
                        self.dimension
                    );
                }
                normalize(&mut embedding);
                Ok(embedding)
            })
            .collect()
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());

        // Process in batches to avoid overwhelming the server
        for batch in texts.chunks(self.batch_size) {
            let embeddings = self
                .embed_single_batch(batch)
                .with_context(|| format!("Failed to process batch of {} texts", batch.len()))?;
            results.extend(embeddings);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
