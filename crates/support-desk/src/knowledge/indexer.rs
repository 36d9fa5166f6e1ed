//! Offline build of the knowledge artifacts from the flat text source.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::artifacts::{write_artifacts, ArtifactPaths};
use super::chunker::split_paragraphs;
use super::embedder::Embedder;

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub build_id: String,
    pub chunk_count: usize,
    pub dimension: usize,
    pub elapsed_ms: u128,
}

/// Chunk `source`, embed every chunk in batches of `batch_size`, and write both artifacts.
/// Nothing is written if the source is missing, has no chunks, or any batch fails.
pub async fn build_knowledge_index(
    source: &Path,
    paths: &ArtifactPaths,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<BuildReport> {
    let started = Instant::now();
    info!("Starting to build vector database from {}", source.display());

    let text = std::fs::read_to_string(source)
        .with_context(|| format!("Knowledge base file not found at {}", source.display()))?;

    let chunks = split_paragraphs(&text);
    if chunks.is_empty() {
        return Err(anyhow::anyhow!("No text chunks found in the knowledge base {}", source.display()));
    }
    info!("Found {} text chunks", chunks.len());

    let batch_size = batch_size.max(1);
    let mut vectors = Vec::with_capacity(chunks.len());
    for (batch_no, batch) in chunks.chunks(batch_size).enumerate() {
        let embedded = embedder
            .embed(batch)
            .await
            .with_context(|| format!("Embedding batch {} failed", batch_no))?;
        if embedded.len() != batch.len() {
            return Err(anyhow::anyhow!(
                "Embedding batch {} returned {} vectors for {} chunks",
                batch_no,
                embedded.len(),
                batch.len()
            ));
        }
        vectors.extend(embedded);
        info!("Encoded {}/{} chunks", vectors.len(), chunks.len());
    }

    let dimension = vectors.first().map(Vec::len).unwrap_or(0);
    let build_id = write_artifacts(paths, embedder.model_name(), &chunks, vectors)?;

    let report = BuildReport {
        build_id,
        chunk_count: chunks.len(),
        dimension,
        elapsed_ms: started.elapsed().as_millis(),
    };
    info!("Vector database build complete: {:?}", report);
    Ok(report)
}
