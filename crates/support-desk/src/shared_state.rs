//! Application state shared by every request handler.
//!
//! Everything here is built once at start-up and read-only afterwards; handlers clone the
//! `Arc`s they need.

use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    config::Config,
    knowledge::{ArtifactPaths, HttpEmbedder, KnowledgeSearch, VectorRetriever},
    llm::{Agents, ChatCompletionsClient, LanguageModel},
    ticket_db::TicketDatabase,
};

#[derive(Clone)]
pub struct AppState {
    /// Configuration (read-only after initialization)
    pub config: Arc<Config>,
    pub database: Arc<TicketDatabase>,
    /// `None` when no model API key is configured.
    pub agents: Option<Arc<Agents>>,
    pub knowledge: Arc<dyn KnowledgeSearch>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        database: Arc<TicketDatabase>,
        agents: Option<Arc<Agents>>,
        knowledge: Arc<dyn KnowledgeSearch>,
    ) -> Self {
        Self { config, database, agents, knowledge }
    }

    /// Build the model and retrieval clients described by `config`.
    pub fn from_config(config: Config, database: Arc<TicketDatabase>) -> anyhow::Result<Self> {
        info!("Initializing application state");

        let agents = match &config.llm_api_key {
            Some(api_key) => {
                let client = ChatCompletionsClient::new(
                    config.llm_base_url.clone(),
                    config.llm_model.clone(),
                    api_key.clone(),
                    config.llm_timeout(),
                )?;
                let model: Arc<dyn LanguageModel> = Arc::new(client);
                Some(Arc::new(Agents::new(model)))
            }
            None => {
                warn!("LLM_API_KEY is not set; model-backed endpoints will return fixed replies");
                None
            }
        };

        let embedder = HttpEmbedder::new(
            config.embedding_url.clone(),
            config.embedding_model.clone(),
            config.embedding_api_key.clone(),
            config.embedding_timeout(),
        )?;
        let retriever = VectorRetriever::new(
            ArtifactPaths::new(config.index_path.clone(), config.chunks_path.clone()),
            Arc::new(embedder),
        );

        Ok(Self::new(Arc::new(config), database, agents, Arc::new(retriever)))
    }
}
