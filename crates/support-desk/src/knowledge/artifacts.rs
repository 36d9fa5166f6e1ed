//! The persisted artifact pair: a vector index file and the chunk list it was built from.
//!
//! Vector `n` in the index belongs to chunk `n` in the list. Both files are stamped with the
//! same build id and the index records a blake3 digest of the chunk list, so a pair that was
//! not produced by the same build is refused at load time instead of returning wrong chunks.

use anyhow::{Context, Result};
use hora::core::ann_index::ANNIndex;
use hora::core::metrics::Metric;
use hora::index::bruteforce_idx::BruteForceIndex;
use hora::index::bruteforce_params::BruteForceParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub index: PathBuf,
    pub chunks: PathBuf,
}

impl ArtifactPaths {
    pub fn new(index: impl Into<PathBuf>, chunks: impl Into<PathBuf>) -> Self {
        Self { index: index.into(), chunks: chunks.into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexArtifact {
    build_id: String,
    embedding_model: String,
    dimension: usize,
    chunks_digest: String,
    vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChunkArtifact {
    build_id: String,
    chunks: Vec<String>,
}

fn chunks_digest(chunks: &[String]) -> String {
    let mut hasher = blake3::Hasher::new();
    for chunk in chunks {
        hasher.update(&(chunk.len() as u64).to_le_bytes());
        hasher.update(chunk.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write both artifacts for one build. Returns the build id.
///
/// Both files are fully written to `*.tmp` siblings before either is renamed into place.
pub fn write_artifacts(
    paths: &ArtifactPaths,
    embedding_model: &str,
    chunks: &[String],
    vectors: Vec<Vec<f32>>,
) -> Result<String> {
    if chunks.len() != vectors.len() {
        return Err(anyhow::anyhow!(
            "Refusing to write misaligned artifacts: {} chunks, {} vectors",
            chunks.len(),
            vectors.len()
        ));
    }
    let dimension = vectors.first().map(Vec::len).unwrap_or(0);
    if let Some(pos) = vectors.iter().position(|v| v.len() != dimension) {
        return Err(anyhow::anyhow!(
            "Vector {} has dimension {}, expected {}",
            pos,
            vectors[pos].len(),
            dimension
        ));
    }

    let build_id = uuid::Uuid::new_v4().to_string();
    let index_bytes = bincode::serialize(&IndexArtifact {
        build_id: build_id.clone(),
        embedding_model: embedding_model.to_string(),
        dimension,
        chunks_digest: chunks_digest(chunks),
        vectors,
    })?;
    let chunk_bytes = serde_json::to_vec(&ChunkArtifact {
        build_id: build_id.clone(),
        chunks: chunks.to_vec(),
    })?;

    for path in [&paths.index, &paths.chunks] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let index_tmp = tmp_path(&paths.index);
    let chunks_tmp = tmp_path(&paths.chunks);
    fs::write(&index_tmp, &index_bytes)
        .with_context(|| format!("Failed to write {}", index_tmp.display()))?;
    if let Err(e) = fs::write(&chunks_tmp, &chunk_bytes) {
        let _ = fs::remove_file(&index_tmp);
        return Err(e).with_context(|| format!("Failed to write {}", chunks_tmp.display()));
    }

    fs::rename(&index_tmp, &paths.index)
        .with_context(|| format!("Failed to move index into {}", paths.index.display()))?;
    fs::rename(&chunks_tmp, &paths.chunks)
        .with_context(|| format!("Failed to move chunks into {}", paths.chunks.display()))?;

    info!(
        "Wrote knowledge artifacts (build {}, {} chunks, dim {})",
        build_id,
        chunks.len(),
        dimension
    );
    Ok(build_id)
}

/// A loaded, validated artifact pair with a flat Euclidean index over it.
pub struct KnowledgeIndex {
    build_id: String,
    embedding_model: String,
    dimension: usize,
    chunks: Vec<String>,
    ann: Option<BruteForceIndex<f32, usize>>,
}

impl KnowledgeIndex {
    /// Read both artifacts. A missing file surfaces as an `io::ErrorKind::NotFound` in the
    /// error chain.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let index_bytes = fs::read(&paths.index)
            .with_context(|| format!("Failed to read vector index {}", paths.index.display()))?;
        let chunk_bytes = fs::read(&paths.chunks)
            .with_context(|| format!("Failed to read knowledge chunks {}", paths.chunks.display()))?;

        let index: IndexArtifact = bincode::deserialize(&index_bytes)
            .map_err(|e| anyhow::anyhow!("Corrupt vector index {}: {}", paths.index.display(), e))?;
        let chunks: ChunkArtifact = serde_json::from_slice(&chunk_bytes)
            .with_context(|| format!("Corrupt knowledge chunks {}", paths.chunks.display()))?;

        if index.build_id != chunks.build_id {
            return Err(anyhow::anyhow!(
                "Vector index (build {}) and knowledge chunks (build {}) come from different builds; rebuild both",
                index.build_id,
                chunks.build_id
            ));
        }
        if index.chunks_digest != chunks_digest(&chunks.chunks) {
            return Err(anyhow::anyhow!("Knowledge chunks do not match the digest recorded in the vector index"));
        }

        let loaded = Self::from_parts(index.embedding_model, chunks.chunks, index.vectors)?;
        if loaded.dimension != index.dimension && !loaded.is_empty() {
            return Err(anyhow::anyhow!(
                "Vector index declares dimension {} but stores {}",
                index.dimension,
                loaded.dimension
            ));
        }
        debug!("Loaded knowledge index build {} ({} chunks)", index.build_id, loaded.len());
        Ok(Self { build_id: index.build_id, ..loaded })
    }

    pub fn from_parts(embedding_model: String, chunks: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(anyhow::anyhow!(
                "Vector index holds {} vectors but chunk list holds {} chunks",
                vectors.len(),
                chunks.len()
            ));
        }
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);

        let ann = if vectors.is_empty() {
            None
        } else {
            let mut ann = BruteForceIndex::<f32, usize>::new(dimension, &BruteForceParams::default());
            for (ordinal, vector) in vectors.iter().enumerate() {
                if vector.len() != dimension {
                    return Err(anyhow::anyhow!("Vector {} has dimension {}, expected {}", ordinal, vector.len(), dimension));
                }
                ann.add(vector, ordinal)
                    .map_err(|e| anyhow::anyhow!("Failed to add vector {}: {}", ordinal, e))?;
            }
            ann.build(Metric::Euclidean)
                .map_err(|e| anyhow::anyhow!("Failed to build index: {}", e))?;
            Some(ann)
        };

        Ok(Self {
            build_id: String::new(),
            embedding_model,
            dimension,
            chunks,
            ann,
        })
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk(&self, ordinal: usize) -> Option<&str> {
        self.chunks.get(ordinal).map(String::as_str)
    }

    /// Up to `k` `(ordinal, distance)` pairs as scored by the index, nearest first; equal
    /// distances keep chunk order.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        let Some(ann) = &self.ann else {
            return Ok(Vec::new());
        };
        if query.len() != self.dimension {
            return Err(anyhow::anyhow!(
                "Query embedding has dimension {}, index expects {}",
                query.len(),
                self.dimension
            ));
        }
        let wanted = k.min(self.len());
        if wanted == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = ann
            .search_nodes(query, wanted)
            .into_iter()
            .filter_map(|(node, distance)| node.idx().as_ref().map(|&ordinal| (ordinal, distance)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        Ok(scored)
    }
}
