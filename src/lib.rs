use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector at batch position {position} contains a NaN or infinite component")]
    NonFiniteVector { position: usize },

    #[error("Batch size mismatch: {vectors} vectors but {metadatas} metadata records")]
    BatchSizeMismatch { vectors: usize, metadatas: usize },

    #[error("Malformed persisted state at {}: {reason}", path.display())]
    MalformedPersistedState { path: PathBuf, reason: String },

    #[error("Embedding error: {0}")]
    EmbeddingFailure(String),

    #[error("Generation error: {0}")]
    GenerationFailure(String),

    #[error("Invalid query parameters: {0}")]
    InvalidQueryParameters(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Vector store lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod embeddings;
pub mod generation;
pub mod ingest;
pub mod ollama;
pub mod pipeline;
pub mod store;
