//! Error types for the Scribe agent

use thiserror::Error;

/// Result type alias for Scribe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Scribe agent
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (startup-fatal)
    #[error("configuration error: {0}")]
    Config(String),

    /// Rejected input (empty note content and the like)
    #[error("validation error: {0}")]
    Validation(String),

    /// Note storage unavailable (pool creation or connection acquisition)
    #[error("storage unavailable: {0}")]
    Storage(String),

    /// Media transport error (fatal to its session only)
    #[error("transport error: {0}")]
    Transport(String),

    /// Realtime model stream error (fatal to its session only)
    #[error("model error: {0}")]
    Model(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
