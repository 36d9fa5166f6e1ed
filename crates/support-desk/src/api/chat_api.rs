// Chat API: intent routing, escalation and the ReAct answer loop
use axum::{
    extract::{State, Json},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{api_error, ApiError};
use crate::chat::ChatEntry;
use crate::metrics;
use crate::shared_state::AppState;
use crate::support;

pub const MODEL_NOT_CONFIGURED: &str = "The AI model is not configured.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub chat_history: Vec<ChatEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let question = req.question.trim();
    if question.is_empty() {
        metrics::inc_request("/chat", "400");
        return Err(api_error(StatusCode::BAD_REQUEST, "Question is required."));
    }
    info!("Chat request ({} chars, {} history entries)", question.len(), req.chat_history.len());

    let Some(agents) = state.agents.as_deref() else {
        metrics::inc_request("/chat", "200");
        return Ok(Json(ChatResponse { response: MODEL_NOT_CONFIGURED.to_string() }));
    };

    match support::respond(
        agents,
        &state.database.tickets,
        state.knowledge.as_ref(),
        &req.chat_history,
        question,
        state.config.retrieval_top_k,
    )
    .await
    {
        Ok(response) => {
            metrics::inc_request("/chat", "200");
            Ok(Json(ChatResponse { response }))
        }
        Err(e) => {
            error!("Chat request failed: {:#}", e);
            metrics::inc_request("/chat", "500");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to create ticket: {}", e)))
        }
    }
}
