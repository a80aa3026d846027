//! Note persistence for the agent's memory tools

pub mod notes;

use std::path::Path;
use std::time::Duration;

use once_cell::sync::OnceCell;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::{Error, Result};

pub use notes::{Note, NoteStore};

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Maximum connections held by the pool
const POOL_MAX_SIZE: u32 = 4;

/// Bound on waiting for a free connection before reporting storage unavailable
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

static SHARED_POOL: OnceCell<DbPool> = OnceCell::new();

/// Open a connection pool and ensure the schema exists
///
/// # Errors
///
/// Returns `Error::Storage` if the pool cannot be built or no connection can
/// be acquired, or a `SQLite` error if schema creation fails.
pub fn init<P: AsRef<Path>>(path: P) -> Result<DbPool> {
    // WAL plus a busy timeout so concurrent saves from different sessions
    // queue instead of failing with SQLITE_BUSY
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "busy_timeout", 5000)
    });
    let pool = Pool::builder()
        .max_size(POOL_MAX_SIZE)
        .connection_timeout(ACQUIRE_TIMEOUT)
        .build(manager)
        .map_err(|e| Error::Storage(e.to_string()))?;

    let conn = pool.get().map_err(|e| Error::Storage(e.to_string()))?;
    notes::ensure_schema(&conn)?;

    tracing::info!("note store initialized");
    Ok(pool)
}

/// Get the process-wide pool, creating it on first use
///
/// Initialization is guarded: concurrent first callers observe exactly one
/// pool and exactly one schema pass. A failed attempt leaves the slot empty
/// so a later call can retry.
///
/// # Errors
///
/// Same failure modes as [`init`].
pub fn shared<P: AsRef<Path>>(path: P) -> Result<DbPool> {
    SHARED_POOL.get_or_try_init(|| init(path)).cloned()
}

/// Open a single-connection in-memory pool (for testing)
///
/// # Errors
///
/// Returns error if the database cannot be initialized
pub fn init_memory() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| Error::Storage(e.to_string()))?;

    let conn = pool.get().map_err(|e| Error::Storage(e.to_string()))?;
    notes::ensure_schema(&conn)?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_memory() {
        let pool = init_memory().unwrap();
        let _conn = pool.get().unwrap();
    }

    #[test]
    fn test_init_missing_parent_dir_fails() {
        let result = init("/nonexistent-scribe-dir/notes.db");
        assert!(result.is_err());
    }
}
