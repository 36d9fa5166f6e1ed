//! Ticket records and the schema they live in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::chat::ChatEntry;

/// Ticket-create shape, shared by `POST /tickets/` and the escalation flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewTicket {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    pub conversation_history: Vec<ChatEntry>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub user_contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub conversation_history: Vec<ChatEntry>,
    pub summary: Option<String>,
    pub user_contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Used for in-memory databases, which skip the migration bookkeeping.
pub const SCHEMA_SQL: &str = include_str!("migrations/001_initial.sql");
