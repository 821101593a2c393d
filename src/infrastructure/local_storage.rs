//! Local SQLite storage for the persisted session.
//!
//! Every process that opens the same database file is another execution
//! context over the same session; writes are last-write-wins.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{AppError, Result};

use super::session_backend::SessionBackend;

/// Session backend stored in a single-row `SQLite` table.
pub struct LocalStorage {
    conn: Mutex<Connection>,
}

impl LocalStorage {
    /// Opens or creates the session database.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or schema creation fails.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create storage directory", e))?;
        }

        let conn = Connection::open(path).map_err(AppError::database)?;

        // WAL lets several client processes read while one writes
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 2000;",
        )
        .map_err(AppError::database)?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;

        tracing::debug!(path = %path.display(), "Session storage opened");

        Ok(storage)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        self.connection()
            .execute_batch(
                r"
            CREATE TABLE IF NOT EXISTS session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                record TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
            )
            .map_err(AppError::database)
    }

    fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionBackend for LocalStorage {
    fn load(&self) -> Result<Option<String>> {
        self.connection()
            .query_row("SELECT record FROM session WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(AppError::database)
    }

    fn save(&self, record: &str) -> Result<()> {
        self.connection()
            .execute(
                r"
            INSERT INTO session (id, record) VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET
                record = excluded.record,
                updated_at = datetime('now')
            ",
                params![record],
            )
            .map_err(AppError::database)?;

        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.connection()
            .execute("DELETE FROM session WHERE id = 1", [])
            .map_err(AppError::database)?;

        Ok(())
    }

    fn external_version(&self) -> Result<i64> {
        self.connection()
            .query_row("PRAGMA data_version", [], |row| row.get(0))
            .map_err(AppError::database)
    }
}
