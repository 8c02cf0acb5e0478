// Retrieval pipeline
// Embeds chunks into the store, retrieves filtered passages and composes answers


use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::embeddings::Embedder;
use crate::generation::AnswerGenerator;
use crate::store::{ChunkMetadata, VectorStore};
use crate::{RagError, Result};

/// Answer returned when no passage survives retrieval
pub const NO_CONTEXT_ANSWER: &str =
    "I could not find any relevant information in the indexed documents.";

/// Number of candidates fetched from the store per requested result
const OVER_FETCH_FACTOR: usize = 2;

/// A passage returned by retrieval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub score: f32,
    pub text: String,
}

/// Result of answering a question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub chunks: Vec<String>,
    pub scores: Vec<f32>,
    /// Wall-clock time spent in `answer`, in milliseconds
    pub latency_ms: f64,
}

pub struct RetrievalPipeline {
    store: Arc<VectorStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn AnswerGenerator>,
    max_top_k: usize,
}

impl std::fmt::Debug for RetrievalPipeline {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("store", &self.store)
            .field("max_top_k", &self.max_top_k)
            .finish_non_exhaustive()
    }
}

impl RetrievalPipeline {
    #[inline]
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn AnswerGenerator>,
        max_top_k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            max_top_k,
        }
    }

    #[inline]
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    #[inline]
    pub fn max_top_k(&self) -> usize {
        self.max_top_k
    }

    /// Embed `chunks` and append them to the store under `doc_id`.
    ///
    /// Returns the number of chunks indexed.
    #[inline]
    pub fn index_document(&self, doc_id: &str, chunks: &[String]) -> Result<usize> {
        if chunks.is_empty() {
            debug!("Document {} has no chunks, nothing to index", doc_id);
            return Ok(0);
        }

        let vectors = self.embed(chunks)?;
        let metadatas = chunks
            .iter()
            .map(|text| ChunkMetadata::new(doc_id, text.as_str()))
            .collect();

        self.store.add(vectors, metadatas)?;

        info!("Indexed {} chunks for document {}", chunks.len(), doc_id);
        Ok(chunks.len())
    }

    /// Return up to `top_k` passages for `question`, most similar first.
    ///
    /// When `doc_ids` is given and non-empty, only passages from those
    /// documents are kept. Filtering happens after an over-fetch of
    /// `2 * top_k` candidates, so fewer than `top_k` passages may come back
    /// even when the wanted documents hold more.
    #[inline]
    pub fn retrieve(
        &self,
        question: &str,
        top_k: usize,
        doc_ids: Option<&HashSet<String>>,
    ) -> Result<Vec<RetrievedChunk>> {
        self.validate_top_k(top_k)?;

        let query = self
            .embed(&[question.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RagError::EmbeddingFailure("embedder returned no vector for the question".into())
            })?;

        let candidates = self
            .store
            .search(&query, top_k.saturating_mul(OVER_FETCH_FACTOR))?;
        let candidate_count = candidates.len();
        let filter = doc_ids.filter(|ids| !ids.is_empty());

        let retrieved: Vec<RetrievedChunk> = candidates
            .into_iter()
            .filter(|candidate| filter.is_none_or(|ids| ids.contains(&candidate.metadata.doc_id)))
            .take(top_k)
            .map(|candidate| RetrievedChunk {
                score: candidate.score,
                text: candidate.metadata.text,
            })
            .collect();

        debug!(
            "Retrieved {} of {} candidates (top_k {}, filtered: {})",
            retrieved.len(),
            candidate_count,
            top_k,
            filter.is_some()
        );

        Ok(retrieved)
    }

    /// Retrieve passages for `question` and generate a grounded answer.
    ///
    /// The generator is not called when nothing is retrieved; the fixed
    /// [`NO_CONTEXT_ANSWER`] is returned instead.
    #[inline]
    pub fn answer(
        &self,
        question: &str,
        top_k: usize,
        doc_ids: Option<&HashSet<String>>,
    ) -> Result<QueryAnswer> {
        let started = Instant::now();

        let retrieved = self.retrieve(question, top_k, doc_ids)?;

        if retrieved.is_empty() {
            info!("No passages retrieved, returning fallback answer");
            return Ok(QueryAnswer {
                answer: NO_CONTEXT_ANSWER.to_string(),
                chunks: Vec::new(),
                scores: Vec::new(),
                latency_ms: elapsed_ms(started),
            });
        }

        let (chunks, scores): (Vec<String>, Vec<f32>) = retrieved
            .into_iter()
            .map(|chunk| (chunk.text, chunk.score))
            .unzip();

        let answer = self
            .generator
            .generate(question, &chunks)
            .map_err(|e| RagError::GenerationFailure(format!("{e:#}")))?;

        let latency_ms = elapsed_ms(started);
        info!(
            "Answered question from {} passages in {:.1} ms",
            chunks.len(),
            latency_ms
        );

        Ok(QueryAnswer {
            answer,
            chunks,
            scores,
            latency_ms,
        })
    }

    fn validate_top_k(&self, top_k: usize) -> Result<()> {
        if top_k == 0 || top_k > self.max_top_k {
            return Err(RagError::InvalidQueryParameters(format!(
                "top_k must be between 1 and {}, got {}",
                self.max_top_k, top_k
            )));
        }
        Ok(())
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self
            .embedder
            .embed(texts)
            .map_err(|e| RagError::EmbeddingFailure(format!("{e:#}")))?;

        if vectors.len() != texts.len() {
            return Err(RagError::EmbeddingFailure(format!(
                "embedder returned {} vectors for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }

        Ok(vectors)
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
