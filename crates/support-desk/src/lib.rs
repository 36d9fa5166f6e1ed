// support-desk/crates/support-desk/src/lib.rs

pub mod api;
pub mod chat;
pub mod config;
pub mod knowledge;
pub mod llm;
pub mod metrics;
pub mod server;
pub mod shared_state;
pub mod support;
pub mod telemetry;
pub mod ticket_db;

#[cfg(test)]
mod test_support;

// Public API exports
pub use chat::ChatEntry;
pub use config::Config;
pub use server::{build_router, run_server};
pub use shared_state::AppState;

pub use knowledge::{build_knowledge_index, ArtifactPaths, BuildReport, HttpEmbedder, KnowledgeSearch, VectorRetriever};
pub use llm::{Agents, ChatCompletionsClient, LanguageModel};
pub use ticket_db::{NewTicket, Ticket, TicketDatabase};
