//! Knowledge base: paragraph chunking, the offline index build, the persisted artifact pair
//! and the query-time retrieval service.

pub mod artifacts;
pub mod chunker;
pub mod embedder;
pub mod indexer;
pub mod retriever;

pub use artifacts::{ArtifactPaths, KnowledgeIndex};
pub use chunker::split_paragraphs;
pub use embedder::{Embedder, HttpEmbedder};
pub use indexer::{build_knowledge_index, BuildReport};
pub use retriever::{KnowledgeSearch, VectorRetriever};
