// support-desk/crates/support-desk/src/bin/build_index.rs
//
// Rebuilds the knowledge index and chunk list from the flat knowledge-base text file.

use std::path::PathBuf;

use clap::Parser;
use support_desk::{build_knowledge_index, config::Config, telemetry, ArtifactPaths, HttpEmbedder};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "build-index", about = "Embed the knowledge base and write the vector index")]
struct Args {
    /// Knowledge-base text file; paragraphs are separated by blank lines
    #[arg(long)]
    source: Option<PathBuf>,

    /// Output path of the vector index
    #[arg(long)]
    index: Option<PathBuf>,

    /// Output path of the chunk list
    #[arg(long)]
    chunks: Option<PathBuf>,

    /// Chunks per embedding request
    #[arg(long, default_value_t = 32)]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let args = Args::parse();
    let cfg = Config::from_env()?;

    let source = args.source.unwrap_or_else(|| cfg.knowledge_base_path.clone());
    let paths = ArtifactPaths::new(
        args.index.unwrap_or_else(|| cfg.index_path.clone()),
        args.chunks.unwrap_or_else(|| cfg.chunks_path.clone()),
    );
    let embedder = HttpEmbedder::new(
        cfg.embedding_url.clone(),
        cfg.embedding_model.clone(),
        cfg.embedding_api_key.clone(),
        cfg.embedding_timeout(),
    )?;

    match build_knowledge_index(&source, &paths, &embedder, args.batch_size).await {
        Ok(report) => {
            info!(
                "Wrote {} chunks (dim {}) as build {} to {} and {} in {} ms",
                report.chunk_count,
                report.dimension,
                report.build_id,
                paths.index.display(),
                paths.chunks.display(),
                report.elapsed_ms
            );
            Ok(())
        }
        Err(e) => {
            error!("Index build failed: {:#}", e);
            Err(e)
        }
    }
}
