use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rag_qa::Result;
use rag_qa::commands::{ingest_file, query, show_stats};
use rag_qa::config::{Config, resolve_base_dir, run_interactive_config, show_config};

const MIN_QUESTION_CHARS: usize = 5;
const MAX_QUESTION_CHARS: usize = 512;

#[derive(Parser)]
#[command(name = "rag-qa")]
#[command(about = "Question answering over your own documents with a local vector index")]
#[command(version)]
struct Cli {
    /// Data directory holding config.toml and the vector store
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Chunk, embed and index a .txt, .md or .pdf document
    Ingest {
        /// Path of the document to ingest
        file: PathBuf,
        /// Words per chunk, overriding the configured value
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Words shared by adjacent chunks, overriding the configured value
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },
    /// Ask a question about the indexed documents
    Query {
        /// The question, between 5 and 512 characters
        #[arg(value_parser = parse_question)]
        question: String,
        /// Number of passages to retrieve
        #[arg(long)]
        top_k: Option<usize>,
        /// Only use passages from this document, may be repeated
        #[arg(long = "doc-id", value_name = "ID")]
        doc_ids: Vec<String>,
    },
    /// Show vector store statistics and Ollama connectivity
    Stats,
}

fn parse_question(raw: &str) -> std::result::Result<String, String> {
    let length = raw.chars().count();
    if (MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&length) {
        Ok(raw.to_string())
    } else {
        Err(format!(
            "question must be between {} and {} characters, got {}",
            MIN_QUESTION_CHARS, MAX_QUESTION_CHARS, length
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let base_dir = resolve_base_dir(cli.data_dir).context("Failed to resolve data directory")?;

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&Config::load(&base_dir)?);
            } else {
                run_interactive_config(&base_dir)?;
            }
        }
        Commands::Ingest {
            file,
            chunk_size,
            chunk_overlap,
        } => {
            let mut config = Config::load(&base_dir)?;
            if let Some(chunk_size) = chunk_size {
                config.chunking.chunk_size = chunk_size;
            }
            if let Some(chunk_overlap) = chunk_overlap {
                config.chunking.chunk_overlap = chunk_overlap;
            }
            config
                .validate()
                .context("Invalid chunking parameters")?;

            let chunking = config.chunking.clone();
            ingest_file(&config, &file, chunking).await?;
        }
        Commands::Query {
            question,
            top_k,
            doc_ids,
        } => {
            let config = Config::load(&base_dir)?;
            query(&config, question, top_k, doc_ids).await?;
        }
        Commands::Stats => {
            show_stats(&Config::load(&base_dir)?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn stats_command() {
        let cli = Cli::try_parse_from(["rag-qa", "stats"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::Stats));
            assert_eq!(parsed.data_dir, None);
        }
    }

    #[test]
    fn global_data_dir() {
        let cli = Cli::try_parse_from(["rag-qa", "stats", "--data-dir", "/tmp/rag"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert_eq!(parsed.data_dir, Some(PathBuf::from("/tmp/rag")));
        }
    }

    #[test]
    fn ingest_command_with_overrides() {
        let cli = Cli::try_parse_from([
            "rag-qa",
            "ingest",
            "notes.txt",
            "--chunk-size",
            "128",
            "--chunk-overlap",
            "16",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest {
                file,
                chunk_size,
                chunk_overlap,
            } = parsed.command
            {
                assert_eq!(file, PathBuf::from("notes.txt"));
                assert_eq!(chunk_size, Some(128));
                assert_eq!(chunk_overlap, Some(16));
            } else {
                panic!("expected ingest command");
            }
        }
    }

    #[test]
    fn query_command_with_filters() {
        let cli = Cli::try_parse_from([
            "rag-qa",
            "query",
            "what are cats",
            "--top-k",
            "3",
            "--doc-id",
            "a",
            "--doc-id",
            "b",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Query {
                question,
                top_k,
                doc_ids,
            } = parsed.command
            {
                assert_eq!(question, "what are cats");
                assert_eq!(top_k, Some(3));
                assert_eq!(doc_ids, vec!["a".to_string(), "b".to_string()]);
            } else {
                panic!("expected query command");
            }
        }
    }

    #[test]
    fn question_length_is_validated() {
        let too_short = Cli::try_parse_from(["rag-qa", "query", "cats"]);
        assert!(too_short.is_err());

        if let Err(err) = too_short {
            assert_eq!(err.kind(), ErrorKind::ValueValidation);
        }

        let too_long = "a".repeat(MAX_QUESTION_CHARS + 1);
        assert!(Cli::try_parse_from(["rag-qa", "query", too_long.as_str()]).is_err());

        let longest = "a".repeat(MAX_QUESTION_CHARS);
        assert!(Cli::try_parse_from(["rag-qa", "query", longest.as_str()]).is_ok());
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["rag-qa", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["rag-qa", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["rag-qa", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
