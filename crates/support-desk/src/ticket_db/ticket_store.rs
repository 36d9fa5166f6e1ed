//! Ticket insert and lookup operations.

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::schema::{NewTicket, Ticket};
use crate::chat::ChatEntry;

const TICKET_COLUMNS: &str = "id, title, summary, conversation_history, user_contact, created_at";

pub struct TicketStore {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl TicketStore {
    pub fn new(pool: Arc<Pool<SqliteConnectionManager>>) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> anyhow::Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| anyhow::anyhow!("Failed to get connection from pool: {}", e))
    }

    /// Insert one ticket and return it with its assigned id and creation time.
    pub fn create_ticket(&self, ticket: &NewTicket) -> anyhow::Result<Ticket> {
        let history_json = serde_json::to_string(&ticket.conversation_history)?;
        let now = Utc::now();

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO tickets (title, summary, conversation_history, user_contact, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &ticket.title,
                &ticket.summary,
                history_json,
                &ticket.user_contact,
                now.to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        info!("Created ticket {} ({} history entries)", id, ticket.conversation_history.len());
        Ok(Ticket {
            id,
            title: ticket.title.clone(),
            conversation_history: ticket.conversation_history.clone(),
            summary: ticket.summary.clone(),
            user_contact: ticket.user_contact.clone(),
            created_at: now,
        })
    }

    pub fn get_ticket(&self, ticket_id: i64) -> anyhow::Result<Option<Ticket>> {
        let conn = self.get_conn()?;
        let ticket = conn
            .query_row(
                &format!("SELECT {} FROM tickets WHERE id = ?1", TICKET_COLUMNS),
                [ticket_id],
                row_to_ticket,
            )
            .optional()?;
        Ok(ticket)
    }

    /// Tickets ordered by id, paged with `skip`/`limit`.
    pub fn list_tickets(&self, skip: u32, limit: u32) -> anyhow::Result<Vec<Ticket>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tickets ORDER BY id LIMIT ?1 OFFSET ?2",
            TICKET_COLUMNS
        ))?;

        let tickets = stmt
            .query_map(params![limit as i64, skip as i64], row_to_ticket)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("Listed {} tickets (skip {}, limit {})", tickets.len(), skip, limit);
        Ok(tickets)
    }

    pub fn count_tickets(&self) -> anyhow::Result<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))?)
    }
}

fn row_to_ticket(row: &Row) -> rusqlite::Result<Ticket> {
    let id: i64 = row.get(0)?;
    let history_json: String = row.get(3)?;
    // Unreadable history degrades to an empty list rather than hiding the ticket.
    let conversation_history: Vec<ChatEntry> = serde_json::from_str(&history_json).unwrap_or_else(|e| {
        warn!("Ticket {} has unreadable conversation history: {}", id, e);
        Vec::new()
    });

    let created_at_str: String = row.get(5)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Ticket {
        id,
        title: row.get(1)?,
        summary: row.get(2)?,
        conversation_history,
        user_contact: row.get(4)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket_db::TicketDatabase;
    use serde_json::json;
    use tempfile::TempDir;

    fn new_ticket(title: &str) -> NewTicket {
        NewTicket {
            title: title.to_string(),
            conversation_history: vec![
                ChatEntry::from_user("How do I return an item?"),
                ChatEntry::from_assistant("You can return items within 30 days."),
            ],
            summary: Some("User wants to return an item.".to_string()),
            user_contact: None,
        }
    }

    #[test]
    fn create_then_get_round_trips_history() {
        let db = TicketDatabase::new_in_memory().unwrap();
        let history: Vec<ChatEntry> = serde_json::from_value(json!([
            { "user": "You", "message": "Where is my order?", "id": 17 },
            { "role": "assistant", "content": "Let me check." },
            { "user": "You", "message": "This is taking forever" }
        ]))
        .unwrap();
        let created = db.tickets.create_ticket(&NewTicket {
            title: "Where is my order?".into(),
            conversation_history: history.clone(),
            summary: None,
            user_contact: Some("jo@example.com".into()),
        }).unwrap();

        let fetched = db.tickets.get_ticket(created.id).unwrap().unwrap();

        assert_eq!(fetched.conversation_history, history);
        assert_eq!(fetched.user_contact.as_deref(), Some("jo@example.com"));
        assert_eq!(fetched.summary, None);
        assert_eq!(fetched.created_at.timestamp(), created.created_at.timestamp());
    }

    #[test]
    fn missing_ticket_is_none() {
        let db = TicketDatabase::new_in_memory().unwrap();
        assert!(db.tickets.get_ticket(42).unwrap().is_none());
    }

    #[test]
    fn ids_are_assigned_in_order_and_listing_pages() {
        let db = TicketDatabase::new_in_memory().unwrap();
        let ids: Vec<i64> = (0..5)
            .map(|i| db.tickets.create_ticket(&new_ticket(&format!("ticket {}", i))).unwrap().id)
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let page = db.tickets.list_tickets(1, 2).unwrap();
        let titles: Vec<&str> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["ticket 1", "ticket 2"]);

        assert_eq!(db.tickets.list_tickets(0, 100).unwrap().len(), 5);
        assert!(db.tickets.list_tickets(10, 100).unwrap().is_empty());
        assert_eq!(db.tickets.count_tickets().unwrap(), 5);
    }

    #[test]
    fn corrupt_history_reads_as_empty() {
        let db = TicketDatabase::new_in_memory().unwrap();
        let created = db.tickets.create_ticket(&new_ticket("broken")).unwrap();
        {
            let conn = db.tickets.get_conn().unwrap();
            conn.execute(
                "UPDATE tickets SET conversation_history = 'not json' WHERE id = ?1",
                [created.id],
            )
            .unwrap();
        }

        let fetched = db.tickets.get_ticket(created.id).unwrap().unwrap();
        assert!(fetched.conversation_history.is_empty());
    }

    #[test]
    fn file_database_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data/tickets.db");
        let id = {
            let db = TicketDatabase::new(&path).unwrap();
            db.tickets.create_ticket(&new_ticket("persisted")).unwrap().id
        };

        let reopened = TicketDatabase::new(&path).unwrap();
        let ticket = reopened.tickets.get_ticket(id).unwrap().unwrap();
        assert_eq!(ticket.title, "persisted");
    }
}
