//! Ticket database module - SQLite-backed storage for escalated conversations
pub mod schema;
pub mod migration;
pub mod ticket_store;

pub use schema::{NewTicket, Ticket};
pub use migration::MigrationManager;
pub use ticket_store::TicketStore;

use std::path::Path;
use std::sync::Arc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

pub struct TicketDatabase {
    pub tickets: TicketStore,
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl TicketDatabase {
    /// Open (creating if needed) the database file and bring its schema up to date.
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        info!("Opening ticket database at: {}", db_path.display());
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(db_path)
            .with_flags(
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_FULL_MUTEX,
            )
            .with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000;"));
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| anyhow::anyhow!("Failed to create connection pool: {}", e))?;

        {
            let mut conn = pool.get()?;
            let mut migrator = MigrationManager::new(&mut conn);
            migrator.initialize_database()?;
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;",
            )?;
        }

        let pool = Arc::new(pool);
        info!("Ticket database initialized successfully");
        Ok(Self {
            tickets: TicketStore::new(Arc::clone(&pool)),
            pool,
        })
    }

    /// Each in-memory connection is its own database, so the pool holds exactly one.
    pub fn new_in_memory() -> anyhow::Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)?;
        {
            let conn = pool.get()?;
            conn.execute_batch(schema::SCHEMA_SQL)?;
        }
        let pool = Arc::new(pool);
        Ok(Self {
            tickets: TicketStore::new(Arc::clone(&pool)),
            pool,
        })
    }

    /// Cheap liveness probe used by `/healthz`.
    pub fn ping(&self) -> anyhow::Result<()> {
        let conn = self.pool.get()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}
