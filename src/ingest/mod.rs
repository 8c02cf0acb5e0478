// Ingestion module
// Turns uploaded documents into indexed chunks and tracks per-document status


use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::embeddings::chunking::{ChunkingConfig, chunk_words};
use crate::pipeline::RetrievalPipeline;
use crate::{RagError, Result};

/// Lifecycle of an ingested document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Processing,
    Ready,
    Failed { error: String },
}

impl fmt::Display for DocumentStatus {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Ready => write!(f, "ready"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Outcome of a finished ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub doc_id: String,
    pub chunks_indexed: usize,
}

/// Source formats accepted for ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    PlainText,
    Markdown,
    Pdf,
}

impl SourceKind {
    /// Pick the source kind from the file extension, case-insensitively
    #[inline]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("txt") => Ok(Self::PlainText),
            Some("md" | "markdown") => Ok(Self::Markdown),
            Some("pdf") => Ok(Self::Pdf),
            _ => Err(RagError::Ingestion(format!(
                "Unsupported file type: {} (only .txt, .md and .pdf are supported)",
                path.as_ref().display()
            ))),
        }
    }

    /// Extract the plain text of an uploaded document of this kind
    #[inline]
    pub fn extract_text(self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::PlainText | Self::Markdown => Ok(read_text_bytes(bytes)),
            Self::Pdf => read_pdf_bytes(bytes),
        }
    }
}

#[derive(Debug, Clone)]
struct DocumentRecord {
    status: DocumentStatus,
    updated_at: DateTime<Utc>,
}

/// Generate a new random document id
#[inline]
pub fn generate_doc_id() -> String {
    Uuid::new_v4().to_string()
}

/// Decode uploaded bytes as UTF-8, replacing invalid sequences
#[inline]
pub fn read_text_bytes(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Extract the text of every page of a PDF, in page order
#[inline]
pub fn read_pdf_bytes(bytes: &[u8]) -> Result<String> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| RagError::Ingestion(format!("Failed to parse PDF: {e}")))?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Ok(String::new());
    }

    document
        .extract_text(&pages)
        .map_err(|e| RagError::Ingestion(format!("Failed to extract PDF text: {e}")))
}

/// Chunks and indexes documents through a shared [`RetrievalPipeline`].
///
/// Status is kept in memory only and is lost when the process exits.
#[derive(Debug, Clone)]
pub struct IngestionService {
    pipeline: Arc<RetrievalPipeline>,
    chunking: ChunkingConfig,
    documents: Arc<RwLock<HashMap<String, DocumentRecord>>>,
}

impl IngestionService {
    #[inline]
    pub fn new(pipeline: Arc<RetrievalPipeline>, chunking: ChunkingConfig) -> Self {
        Self {
            pipeline,
            chunking,
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[inline]
    pub fn chunking(&self) -> &ChunkingConfig {
        &self.chunking
    }

    /// Chunk `text` and index it under `doc_id`, blocking until done
    #[inline]
    pub fn ingest_text(&self, doc_id: &str, text: &str) -> Result<IngestReport> {
        ingest(&self.pipeline, &self.chunking, doc_id, text)
    }

    /// Queue `bytes` for ingestion on a blocking worker.
    ///
    /// Returns the new document id immediately together with a handle to the
    /// job. The document reports `Processing` until the job finishes, then
    /// `Ready` or `Failed`. Must be called from within a Tokio runtime.
    #[inline]
    pub fn submit(
        &self,
        source_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(String, JoinHandle<Result<IngestReport>>)> {
        let kind = SourceKind::from_path(source_name)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            RagError::Ingestion(format!("Ingestion requires a Tokio runtime: {e}"))
        })?;

        let doc_id = generate_doc_id();
        self.set_status(&doc_id, DocumentStatus::Processing)?;
        info!(
            "Accepted {} ({:?}, {} bytes) as document {}",
            source_name,
            kind,
            bytes.len(),
            doc_id
        );

        let service = self.clone();
        let job_doc_id = doc_id.clone();
        let handle = runtime.spawn_blocking(move || {
            let result = kind
                .extract_text(&bytes)
                .and_then(|text| ingest(&service.pipeline, &service.chunking, &job_doc_id, &text));

            let status = match &result {
                Ok(_) => DocumentStatus::Ready,
                Err(e) => {
                    error!("Ingestion of document {} failed: {}", job_doc_id, e);
                    DocumentStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            service.set_status(&job_doc_id, status)?;

            result
        });

        Ok((doc_id, handle))
    }

    /// Current status of `doc_id`. Ids never seen report `Processing`.
    #[inline]
    pub fn status(&self, doc_id: &str) -> Result<DocumentStatus> {
        let documents = self.documents.read().map_err(|_| RagError::LockPoisoned)?;
        Ok(documents
            .get(doc_id)
            .map_or(DocumentStatus::Processing, |record| record.status.clone()))
    }

    /// When the status of `doc_id` last changed
    #[inline]
    pub fn last_updated(&self, doc_id: &str) -> Result<Option<DateTime<Utc>>> {
        let documents = self.documents.read().map_err(|_| RagError::LockPoisoned)?;
        Ok(documents.get(doc_id).map(|record| record.updated_at))
    }

    fn set_status(&self, doc_id: &str, status: DocumentStatus) -> Result<()> {
        debug!("Document {} is now {}", doc_id, status);
        self.documents
            .write()
            .map_err(|_| RagError::LockPoisoned)?
            .insert(
                doc_id.to_string(),
                DocumentRecord {
                    status,
                    updated_at: Utc::now(),
                },
            );
        Ok(())
    }
}

fn ingest(
    pipeline: &RetrievalPipeline,
    chunking: &ChunkingConfig,
    doc_id: &str,
    text: &str,
) -> Result<IngestReport> {
    let chunks = chunk_words(text, chunking)
        .map_err(|e| RagError::Ingestion(format!("{e:#}")))?;
    let chunks_indexed = pipeline.index_document(doc_id, &chunks)?;

    Ok(IngestReport {
        doc_id: doc_id.to_string(),
        chunks_indexed,
    })
}
