//! Hand a frustrated conversation over to a human by filing a ticket.

use tracing::{info, warn};

use crate::chat::{first_human_text, to_model_turns, ChatEntry};
use crate::llm::ModelAgent;
use crate::metrics;
use crate::ticket_db::{NewTicket, Ticket, TicketStore};

pub const ESCALATION_ACK: &str = "I'm sorry you're having trouble. I've created a support ticket with a summary of our conversation, and our team will be in touch shortly.";

/// Summarise `history` (best effort) and store exactly one ticket for it.
pub async fn escalate(
    summarizer: &ModelAgent,
    store: &TicketStore,
    history: &[ChatEntry],
    question: &str,
) -> anyhow::Result<Ticket> {
    let summary = if history.is_empty() {
        None
    } else {
        summarizer
            .ask(&to_model_turns(history))
            .await
            .filter(|summary| !summary.is_empty())
    };
    if summary.is_none() {
        warn!("Escalating without a summary");
    }

    let title = first_human_text(history).unwrap_or(question).to_string();
    let ticket = store.create_ticket(&NewTicket {
        title,
        conversation_history: history.to_vec(),
        summary,
        user_contact: None,
    })?;

    metrics::inc_ticket("escalation");
    info!("Escalated conversation to ticket {}", ticket.id);
    Ok(ticket)
}
