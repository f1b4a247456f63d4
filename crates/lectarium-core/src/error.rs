//! Error types for filter compilation and query execution

use thiserror::Error;

use crate::parser::ParseError;
use crate::storage::StoreError;
use crate::value::FieldType;

/// A filter or order string references something the catalog does not allow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unknown entity type '{0}'")]
    UnknownEntity(String),

    #[error("'{field}' is not a field of {entity}")]
    UnknownField { entity: String, field: String },

    #[error("'{relation}' is not a relationship of {entity}")]
    NotARelationship { entity: String, relation: String },

    #[error("{aggregator} cannot be used with {kind} relationship '{relation}' of {entity}")]
    RelationshipKind {
        entity: String,
        relation: String,
        aggregator: &'static str,
        kind: &'static str,
    },

    #[error("'{literal}' is not a valid {expected} value for '{field}'")]
    InvalidLiteral {
        field: String,
        literal: String,
        expected: FieldType,
    },

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// A filter or order string references a denied field name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("access to field '{field}' is not allowed")]
pub struct SecurityError {
    pub field: String,
}

/// Errors surfaced by `paginate` and `items_count`.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Security(#[from] SecurityError),

    /// Only produced by strict parsing; the lenient path skips bad clauses.
    #[error("malformed filter: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    /// True when the caller supplied bad input (4xx-equivalent); false for
    /// backend failures (5xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, QueryError::Store(_))
    }

    /// The offending field name for schema and security rejections.
    pub fn field(&self) -> Option<&str> {
        match self {
            QueryError::Security(e) => Some(&e.field),
            QueryError::Schema(SchemaError::UnknownField { field, .. })
            | QueryError::Schema(SchemaError::InvalidLiteral { field, .. }) => Some(field),
            QueryError::Schema(SchemaError::NotARelationship { relation, .. })
            | QueryError::Schema(SchemaError::RelationshipKind { relation, .. }) => Some(relation),
            _ => None,
        }
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
