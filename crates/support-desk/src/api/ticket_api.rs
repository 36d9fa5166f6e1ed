// Ticket API: direct create, paged listing and lookup by id
use axum::{
    extract::{Path, Query, State, Json},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{error, info};
use validator::Validate;

use super::{api_error, ApiError};
use crate::metrics;
use crate::shared_state::AppState;
use crate::ticket_db::{NewTicket, Ticket};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Json(ticket): Json<NewTicket>,
) -> Result<Json<Ticket>, ApiError> {
    if let Err(e) = ticket.validate() {
        metrics::inc_request("/tickets", "422");
        return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
    }

    match state.database.tickets.create_ticket(&ticket) {
        Ok(created) => {
            metrics::inc_request("/tickets", "200");
            metrics::inc_ticket("api");
            Ok(Json(created))
        }
        Err(e) => {
            error!("Failed to create ticket: {}", e);
            metrics::inc_request("/tickets", "500");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to create ticket: {}", e)))
        }
    }
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    info!("Listing tickets (skip {}, limit {})", params.skip, params.limit);

    match state.database.tickets.list_tickets(params.skip, params.limit) {
        Ok(tickets) => {
            metrics::inc_request("/tickets", "200");
            Ok(Json(tickets))
        }
        Err(e) => {
            error!("Failed to list tickets: {}", e);
            metrics::inc_request("/tickets", "500");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to list tickets: {}", e)))
        }
    }
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<i64>,
) -> Result<Json<Ticket>, ApiError> {
    match state.database.tickets.get_ticket(ticket_id) {
        Ok(Some(ticket)) => {
            metrics::inc_request("/tickets/:id", "200");
            Ok(Json(ticket))
        }
        Ok(None) => {
            metrics::inc_request("/tickets/:id", "404");
            Err(api_error(StatusCode::NOT_FOUND, "Ticket not found"))
        }
        Err(e) => {
            error!("Failed to get ticket {}: {}", ticket_id, e);
            metrics::inc_request("/tickets/:id", "500");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to get ticket: {}", e)))
        }
    }
}
