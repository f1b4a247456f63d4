//! Error type for the Lectarium runtime and tools.

use lectarium_core::{ExportError, QueryError, SchemaError, StoreError};
use lectarium_sqlite::SqliteError;
use thiserror::Error;

/// Common error type for Lectarium operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid catalog or unknown entity type
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Filter, order or store failure while listing
    #[error(transparent)]
    Query(#[from] QueryError),

    /// CSV export failure
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Dataset loading failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// SQLite failure
    #[error(transparent)]
    Sqlite(#[from] SqliteError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True when the request itself was invalid, as opposed to a backend or
    /// environment failure.
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::Schema(_) => true,
            Error::Query(e) => e.is_client_error(),
            Error::Export(e) => e.is_client_error(),
            _ => false,
        }
    }

    /// Process exit status: 2 for client errors, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_client_error() {
            2
        } else {
            1
        }
    }
}

/// Result type alias using Lectarium Error.
pub type Result<T> = std::result::Result<T, Error>;
