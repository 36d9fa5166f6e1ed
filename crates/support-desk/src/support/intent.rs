//! Routes a chat turn either to escalation or to the answer loop.

use tracing::debug;

use crate::llm::{ModelAgent, ModelTurn};
use crate::metrics;

pub const FRUSTRATED_LABEL: &str = "FRUSTRATED";
pub const QUESTION_LABEL: &str = "QUESTION";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Frustrated,
    Question,
}

impl Intent {
    /// Exact, case-sensitive match on the frustrated label. Anything else is a question.
    pub fn from_label(label: &str) -> Self {
        if label.trim() == FRUSTRATED_LABEL {
            Intent::Frustrated
        } else {
            Intent::Question
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Frustrated => FRUSTRATED_LABEL,
            Intent::Question => QUESTION_LABEL,
        }
    }
}

/// One classifier call on the latest message only. A failed call is treated as a question.
pub async fn classify(agent: &ModelAgent, message: &str) -> Intent {
    let intent = match agent.ask(&[ModelTurn::user(message)]).await {
        Some(label) => Intent::from_label(&label),
        None => Intent::Question,
    };
    debug!("Classified message as {}", intent.as_str());
    metrics::inc_intent(intent.as_str());
    intent
}
