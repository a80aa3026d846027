//! Note repository for the save/recall tools

use rusqlite::params;

use super::DbPool;
use crate::{Error, Result};

/// A saved note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Store-assigned id; strictly increasing, never reused
    pub id: i64,

    /// Verbatim note text
    pub content: String,
}

/// Create the notes table if it does not exist
///
/// Idempotent and safe under concurrent first use. `AUTOINCREMENT` keeps ids
/// monotonic: the rowid of a deleted note is never handed out again.
pub(crate) fn ensure_schema(conn: &rusqlite::Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL
        );",
    )?;
    Ok(())
}

/// Note repository
#[derive(Clone)]
pub struct NoteStore {
    pool: DbPool,
}

impl NoteStore {
    /// Create a note store over an initialized pool
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Note store over the process-wide pool, creating it on first use
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the pool cannot be created.
    pub fn shared(database_url: &str) -> Result<Self> {
        Ok(Self::new(super::shared(database_url)?))
    }

    /// Persist a note and return it with its assigned id
    ///
    /// # Errors
    ///
    /// `Error::Validation` if the content is empty or whitespace-only (no
    /// row is written, no id is consumed); `Error::Storage` if no connection
    /// can be acquired within the pool timeout.
    pub fn save(&self, content: &str) -> Result<Note> {
        if content.trim().is_empty() {
            return Err(Error::Validation("note content is empty".to_string()));
        }

        let conn = self.pool.get().map_err(|e| Error::Storage(e.to_string()))?;
        conn.execute("INSERT INTO notes (content) VALUES (?1)", params![content])?;

        Ok(Note {
            id: conn.last_insert_rowid(),
            content: content.to_string(),
        })
    }

    /// Every saved note, ordered by ascending id
    ///
    /// An empty store is `Ok(vec![])`, not an error.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if no connection can be acquired within the pool
    /// timeout.
    pub fn list_all(&self) -> Result<Vec<Note>> {
        let conn = self.pool.get().map_err(|e| Error::Storage(e.to_string()))?;

        let mut stmt = conn.prepare("SELECT id, content FROM notes ORDER BY id")?;
        let notes = stmt
            .query_map([], |row| {
                Ok(Note {
                    id: row.get(0)?,
                    content: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notes)
    }
}
