//! Query-time retrieval over the persisted knowledge artifacts.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::artifacts::{ArtifactPaths, KnowledgeIndex};
use super::embedder::Embedder;
use crate::metrics;

pub const DEFAULT_TOP_K: usize = 3;
pub const CHUNK_SEPARATOR: &str = "\n---\n";
pub const NO_RESULTS: &str = "No relevant information found.";
pub const ARTIFACTS_MISSING: &str = "Vector DB files not found.";

/// Text search over the knowledge base. Never fails: problems come back as readable text
/// so the conversation can continue.
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> String;
}

pub struct VectorRetriever {
    paths: ArtifactPaths,
    embedder: Arc<dyn Embedder>,
}

impl VectorRetriever {
    pub fn new(paths: ArtifactPaths, embedder: Arc<dyn Embedder>) -> Self {
        Self { paths, embedder }
    }

    /// Nearest chunks for `query`, nearest first. Artifacts are read on every call, so a
    /// rebuilt index is picked up without a restart.
    pub async fn nearest_chunks(&self, query: &str, k: usize) -> anyhow::Result<Vec<String>> {
        let index = KnowledgeIndex::load(&self.paths)?;
        if index.embedding_model() != self.embedder.model_name() {
            return Err(anyhow::anyhow!(
                "index was built with embedding model '{}' but queries use '{}'",
                index.embedding_model(),
                self.embedder.model_name()
            ));
        }
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("embedding service returned no vector for the query"))?;

        let hits = index.nearest(&query_embedding, k)?;
        debug!("Retrieved {} chunk(s) for query ({} chars)", hits.len(), query.len());
        Ok(hits
            .into_iter()
            .filter_map(|(ordinal, _)| index.chunk(ordinal).map(str::to_string))
            .collect())
    }
}

fn is_missing_artifact(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
        .any(|io| io.kind() == std::io::ErrorKind::NotFound)
}

#[async_trait]
impl KnowledgeSearch for VectorRetriever {
    async fn search(&self, query: &str, k: usize) -> String {
        match self.nearest_chunks(query, k).await {
            Ok(chunks) if chunks.is_empty() => {
                metrics::inc_retrieval("empty");
                NO_RESULTS.to_string()
            }
            Ok(chunks) => {
                metrics::inc_retrieval("hit");
                chunks.join(CHUNK_SEPARATOR)
            }
            Err(e) if is_missing_artifact(&e) => {
                warn!("Knowledge artifacts missing: {:#}", e);
                metrics::inc_retrieval("missing");
                ARTIFACTS_MISSING.to_string()
            }
            Err(e) => {
                warn!("Vector search failed: {:#}", e);
                metrics::inc_retrieval("error");
                format!("An error occurred during vector search: {}", e)
            }
        }
    }
}
