//! Error types for the SQLite collection

use lectarium_core::storage::StoreError;
use thiserror::Error;

/// Result type for SQLite operations
pub type Result<T> = std::result::Result<T, SqliteError>;

/// Errors that can occur during SQLite operations
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Database connection or query error
    #[error("SQLite error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON dataset could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Entity type missing from the catalog
    #[error("unknown entity type: {0}")]
    UnknownEntity(String),

    /// A predicate or sort key names something the catalog does not declare
    #[error("cannot translate query: {0}")]
    Query(String),

    /// A stored or imported value does not match its declared type
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Convert SqliteError to StoreError for the collection trait
impl From<SqliteError> for StoreError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::UnknownEntity(name) => StoreError::UnknownEntity(name),
            SqliteError::Query(msg) => StoreError::Query(msg),
            SqliteError::InvalidData(msg) => StoreError::InvalidData(msg),
            SqliteError::Json(e) => StoreError::Serialization(e.to_string()),
            SqliteError::Database(e) => StoreError::Backend(format!("SQLite: {}", e)),
        }
    }
}
