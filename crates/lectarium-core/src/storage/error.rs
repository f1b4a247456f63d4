//! Storage error types

use thiserror::Error;

/// Errors raised by queryable collections
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The collection holds no entity type with this name
    #[error("unknown entity type: {0}")]
    UnknownEntity(String),

    /// A predicate or sort key the collection cannot evaluate
    #[error("query error: {0}")]
    Query(String),

    /// Invalid row data
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Storage backend error (database, filesystem, etc.)
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
