// support-desk/crates/support-desk/src/config.rs

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_LLM_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    pub database_path: PathBuf,
    pub index_path: PathBuf,
    pub chunks_path: PathBuf,
    pub knowledge_base_path: PathBuf,
    /// Absent key disables every model-backed endpoint; the server still starts.
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_seconds: u64,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub embedding_timeout_seconds: u64,
    pub retrieval_top_k: usize,
    pub request_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("Failed to load .env file: {}. Using system environment variables.", e);
        } else {
            info!("Loaded environment variables from .env file");
        }

        let llm_api_key = non_empty_var("LLM_API_KEY").or_else(|| non_empty_var("GEMINI_API_KEY"));
        if llm_api_key.is_none() {
            warn!("LLM_API_KEY not set. AI chat functionality will be disabled.");
        }

        let retrieval_top_k: usize = env::var("RETRIEVAL_TOP_K")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .context("RETRIEVAL_TOP_K must be a positive integer")?;
        if retrieval_top_k == 0 {
            return Err(anyhow::anyhow!("RETRIEVAL_TOP_K must be at least 1"));
        }

        Ok(Self {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8000".into())
                .parse()
                .context("API_PORT must be a port number")?,
            database_path: path_var("DATABASE_PATH", "./data/tickets.db"),
            index_path: path_var("VECTOR_INDEX_PATH", "./data/vector_index.bin"),
            chunks_path: path_var("KNOWLEDGE_CHUNKS_PATH", "./data/knowledge_chunks.json"),
            knowledge_base_path: path_var("KNOWLEDGE_BASE_PATH", "./knowledge_base.txt"),
            llm_api_key,
            llm_base_url: env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.into()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.into()),
            llm_timeout_seconds: env::var("LLM_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "60".into())
                .parse()?,
            embedding_url: env::var("EMBEDDING_URL").unwrap_or_else(|_| "http://127.0.0.1:8081".into()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.into()),
            embedding_api_key: non_empty_var("EMBEDDING_API_KEY"),
            embedding_timeout_seconds: env::var("EMBEDDING_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".into())
                .parse()?,
            retrieval_top_k,
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".into())
                .parse()?,
        })
    }

    pub fn model_enabled(&self) -> bool {
        self.llm_api_key.is_some()
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_seconds)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn print_config(&self) {
        info!("Current Configuration:");
        info!("- API: {}:{}", self.api_host, self.api_port);
        info!("- Ticket Database: {}", self.database_path.display());
        info!("- Vector Index: {}", self.index_path.display());
        info!("- Knowledge Chunks: {}", self.chunks_path.display());
        info!("- Knowledge Base: {}", self.knowledge_base_path.display());
        info!(
            "- Language Model: {} @ {} ({})",
            self.llm_model,
            self.llm_base_url,
            if self.model_enabled() { "enabled" } else { "disabled" }
        );
        info!("- Embedding Model: {} @ {}", self.embedding_model, self.embedding_url);
        info!("- Retrieval top-k: {}", self.retrieval_top_k);
        info!(
            "- Timeouts: llm {}s, embedding {}s, request {}s",
            self.llm_timeout_seconds, self.embedding_timeout_seconds, self.request_timeout_seconds
        );
    }

    pub fn api_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.api_host, self.api_port)
            .parse()
            .with_context(|| format!("Invalid API address {}:{}", self.api_host, self.api_port))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn path_var(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env::var(key).unwrap_or_else(|_| default.into()))
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        api_host: "127.0.0.1".to_string(),
        api_port: 8000,
        database_path: PathBuf::from("./data/tickets.db"),
        index_path: PathBuf::from("./data/vector_index.bin"),
        chunks_path: PathBuf::from("./data/knowledge_chunks.json"),
        knowledge_base_path: PathBuf::from("./knowledge_base.txt"),
        llm_api_key: Some("test-key".to_string()),
        llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
        llm_model: DEFAULT_LLM_MODEL.to_string(),
        llm_timeout_seconds: 60,
        embedding_url: "http://127.0.0.1:8081".to_string(),
        embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        embedding_api_key: None,
        embedding_timeout_seconds: 30,
        retrieval_top_k: 3,
        request_timeout_seconds: 300,
    }
}
