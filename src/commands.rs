use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::Config;
use crate::embeddings::OllamaEmbedder;
use crate::embeddings::chunking::ChunkingConfig;
use crate::generation::OllamaGenerator;
use crate::ingest::{DocumentStatus, IngestReport, IngestionService};
use crate::ollama::OllamaClient;
use crate::pipeline::{QueryAnswer, RetrievalPipeline};
use crate::store::VectorStore;

/// Open the vector store configured under the data directory
#[inline]
pub fn open_store(config: &Config) -> Result<Arc<VectorStore>> {
    let dimension = usize::try_from(config.ollama.embedding_dimension)
        .context("Embedding dimension does not fit in memory")?;
    let store = VectorStore::open(config.store_path(), dimension).with_context(|| {
        format!(
            "Failed to open vector store at {}",
            config.store_path().display()
        )
    })?;
    Ok(Arc::new(store))
}

/// Wire the store and the Ollama-backed collaborators into a pipeline
#[inline]
pub fn build_pipeline(config: &Config) -> Result<Arc<RetrievalPipeline>> {
    let store = open_store(config)?;
    let client = OllamaClient::new(&config.ollama).context("Failed to initialize Ollama client")?;

    let embedder = OllamaEmbedder::with_client(client.clone(), &config.ollama);
    let generator = OllamaGenerator::with_client(client, &config.ollama);

    Ok(Arc::new(RetrievalPipeline::new(
        store,
        Arc::new(embedder),
        Arc::new(generator),
        config.retrieval.max_top_k,
    )))
}

/// Ingest a text, markdown or PDF file and wait for it to be indexed
#[inline]
pub async fn ingest_file(
    config: &Config,
    path: &Path,
    chunking: ChunkingConfig,
) -> Result<IngestReport> {
    info!("Ingesting {}", path.display());

    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {}", path.display()))?;

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let pipeline = build_pipeline(config)?;
    let service = IngestionService::new(pipeline, chunking);

    let (doc_id, handle) = service.submit(&source_name, bytes)?;
    println!("Document ID: {}", doc_id);
    println!("Status: {}", service.status(&doc_id)?);

    let bar = if console::user_attended_stderr() {
        ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg}").expect("style template is valid"),
        )
    } else {
        ProgressBar::hidden()
    };
    bar.set_message(format!("Embedding chunks of {}", source_name));
    bar.enable_steady_tick(Duration::from_millis(100));

    let result = handle.await.context("Ingestion worker panicked")?;
    bar.finish_and_clear();

    match service.status(&doc_id)? {
        DocumentStatus::Ready => println!("Status: ready"),
        status @ DocumentStatus::Failed { .. } => println!("Status: {}", status),
        DocumentStatus::Processing => warn!("Document {} still processing after join", doc_id),
    }
    if let Some(updated_at) = service.last_updated(&doc_id)? {
        println!("Updated: {}", updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    let report = result.with_context(|| format!("Failed to ingest {}", path.display()))?;
    println!("Chunks indexed: {}", report.chunks_indexed);

    Ok(report)
}

/// Answer a question from the indexed documents and print the result
#[inline]
pub async fn query(
    config: &Config,
    question: String,
    top_k: Option<usize>,
    doc_ids: Vec<String>,
) -> Result<QueryAnswer> {
    let top_k = top_k.unwrap_or(config.retrieval.default_top_k);
    let pipeline = build_pipeline(config)?;

    let filter: Option<HashSet<String>> = if doc_ids.is_empty() {
        None
    } else {
        Some(doc_ids.into_iter().collect())
    };

    let answer = tokio::task::spawn_blocking(move || {
        pipeline.answer(&question, top_k, filter.as_ref())
    })
    .await
    .context("Query worker panicked")?
    .context("Failed to answer question")?;

    println!("{}", answer.answer);
    println!();

    if answer.chunks.is_empty() {
        println!("No relevant passages found.");
    } else {
        println!("Relevant passages ({}):", answer.chunks.len());
        for (rank, (chunk, score)) in answer.chunks.iter().zip(&answer.scores).enumerate() {
            println!("  {}. [score {:.4}] {}", rank + 1, score, preview(chunk, 160));
        }
    }

    println!();
    println!("Latency: {:.1} ms", answer.latency_ms);

    Ok(answer)
}

/// Print vector store statistics and Ollama connectivity
#[inline]
pub fn show_stats(config: &Config) -> Result<()> {
    println!("📊 RAG QA Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🔍 Vector Store:");
    let store = open_store(config)?;
    let stats = store.stats()?;
    println!("   Location: {}", store.storage_dir().display());
    println!("   Vectors: {}", stats.vector_count);
    println!("   Dimension: {}", stats.dimension);
    println!("   Documents: {}", stats.documents.len());
    for (doc_id, chunks) in &stats.documents {
        println!("     {} ({} chunks)", doc_id, chunks);
    }

    println!();
    println!("🤖 Ollama Status:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => {
            let models = [
                config.ollama.embedding_model.as_str(),
                config.ollama.generation_model.as_str(),
            ];
            match client.with_retry_attempts(1).health_check(&models) {
                Ok(()) => {
                    println!(
                        "   ✅ Ollama: Connected ({}:{})",
                        config.ollama.host, config.ollama.port
                    );
                    println!("   📋 Embedding Model: {}", config.ollama.embedding_model);
                    println!("   📋 Generation Model: {}", config.ollama.generation_model);
                }
                Err(e) => println!("   ⚠️  Ollama: Unavailable or unhealthy - {:#}", e),
            }
        }
        Err(e) => println!("   ❌ Ollama: Invalid configuration - {:#}", e),
    }

    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        Config {
            base_dir: dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(preview("cats are mammals", 4), "cats…");
        assert_eq!(preview("cats", 4), "cats");
    }

    #[test]
    fn open_store_uses_configured_dimension() {
        let dir = TempDir::new().expect("should create temp dir");
        let config = test_config(&dir);

        let store = open_store(&config).expect("should open store");
        assert_eq!(store.dimension().expect("should read dimension"), 384);
        assert_eq!(store.storage_dir(), config.store_path());
    }

    #[test]
    fn build_pipeline_respects_max_top_k() {
        let dir = TempDir::new().expect("should create temp dir");
        let mut config = test_config(&dir);
        config.retrieval.max_top_k = 7;

        let pipeline = build_pipeline(&config).expect("should build pipeline");
        assert_eq!(pipeline.max_top_k(), 7);
    }

    #[tokio::test]
    async fn ingest_rejects_missing_file() {
        let dir = TempDir::new().expect("should create temp dir");
        let config = test_config(&dir);

        let result = ingest_file(
            &config,
            &dir.path().join("missing.txt"),
            ChunkingConfig::default(),
        )
        .await;
        assert!(result.is_err());
    }
}
