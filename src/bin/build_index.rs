//! Offline index builder: splits a source document, embeds every chunk with
//! the embedding profile and writes the index directory served by the relay.
//!
//! ```bash
//! build-index --source scp-914.txt --out scp-914Vectors
//! ```

use std::path::PathBuf;

use ai_llm_service::{LlmServiceProfiles, config::default_config::profiles_from_env, telemetry};
use anyhow::Context;
use clap::Parser;
use rag_base::{
    RagConfig,
    indexer::{BuildOptions, BuildOutcome, build_index},
    structs::rag_base_config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE},
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "build-index", about = "Build the local vector index from a text document")]
struct Args {
    /// Source text document.
    #[arg(long)]
    source: PathBuf,

    /// Index directory to write (defaults to INDEX_DIR or `scp-914Vectors`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Characters per chunk.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks.
    #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,

    /// Rebuild even if the existing index matches.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let dotenv = dotenvy::dotenv();
    telemetry::init("info")?;
    if let Err(e) = dotenv {
        if !e.not_found() {
            return Err(e).context("failed to read .env");
        }
    }

    let rag = RagConfig::from_env().context("invalid retrieval configuration")?;
    let profiles = profiles_from_env().context("invalid LLM configuration")?;
    let llm = LlmServiceProfiles::new(profiles.chat, profiles.embedding, None)?;

    let opts = BuildOptions {
        source: args.source,
        out_dir: args.out.unwrap_or(rag.index_dir),
        chunk_size: args.chunk_size,
        chunk_overlap: args.chunk_overlap,
        force: args.force,
        embed_concurrency: rag.embed_concurrency,
    };

    let outcome = build_index(&opts, &llm)
        .await
        .with_context(|| format!("failed to build index from {}", opts.source.display()))?;

    match outcome {
        BuildOutcome::Built(manifest) => info!(
            out = %opts.out_dir.display(),
            chunks = manifest.chunk_count,
            dim = manifest.dim,
            "index written"
        ),
        BuildOutcome::UpToDate(manifest) => info!(
            out = %opts.out_dir.display(),
            chunks = manifest.chunk_count,
            "index already up to date"
        ),
    }
    Ok(())
}
