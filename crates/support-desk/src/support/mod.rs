//! The chat flow: classify the latest message, then escalate or answer.

pub mod escalation;
pub mod intent;
pub mod react;

pub use escalation::{escalate, ESCALATION_ACK};
pub use intent::{classify, Intent};
pub use react::{parse_action, run_react_loop, Action, ActionKind, ReactOutcome, ReactStep};

use tracing::info;

use crate::chat::ChatEntry;
use crate::knowledge::KnowledgeSearch;
use crate::llm::Agents;
use crate::ticket_db::TicketStore;

/// Answer one chat turn. Only a storage failure during escalation is an error.
pub async fn respond(
    agents: &Agents,
    store: &TicketStore,
    knowledge: &dyn KnowledgeSearch,
    history: &[ChatEntry],
    question: &str,
    top_k: usize,
) -> anyhow::Result<String> {
    match classify(&agents.intent, question).await {
        Intent::Frustrated => {
            info!("User frustration detected, escalating");
            escalate(&agents.summarizer, store, history, question).await?;
            Ok(ESCALATION_ACK.to_string())
        }
        Intent::Question => {
            let outcome = run_react_loop(&agents.react, knowledge, history, question, top_k).await;
            Ok(outcome.response)
        }
    }
}
