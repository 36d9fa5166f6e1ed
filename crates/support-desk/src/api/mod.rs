//! API module - HTTP handlers for chat, greeting and tickets

pub mod chat_api;
pub mod greeting_api;
pub mod ticket_api;

pub use chat_api::{chat, ChatRequest, ChatResponse};
pub use greeting_api::{greeting, GreetingResponse, DEFAULT_GREETING};
pub use ticket_api::{create_ticket, get_ticket, list_tickets, ListParams};

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { detail: detail.into() }))
}
