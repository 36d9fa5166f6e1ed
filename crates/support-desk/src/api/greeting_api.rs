// Greeting API: one-sentence opener generated by the greeter agent
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm::ModelTurn;
use crate::metrics;
use crate::shared_state::AppState;

pub const DEFAULT_GREETING: &str = "Hello! How can I help you today?";

#[derive(Debug, Serialize, Deserialize)]
pub struct GreetingResponse {
    pub greeting: String,
}

/// Never fails: without a model, or when the call fails, the fixed greeting is returned.
pub async fn greeting(State(state): State<AppState>) -> Json<GreetingResponse> {
    let generated = match &state.agents {
        Some(agents) => agents
            .greeter
            .ask(&[ModelTurn::user("Generate a greeting.")])
            .await
            .filter(|text| !text.is_empty()),
        None => None,
    };

    let greeting = generated.unwrap_or_else(|| {
        info!("Serving the default greeting");
        DEFAULT_GREETING.to_string()
    });
    metrics::inc_request("/greeting", "200");
    Json(GreetingResponse { greeting })
}
