//! Lectarium query core
//!
//! A small filter/order language for listing entity collections: a tokenizer,
//! a recursive parser producing a zero-copy syntax tree, a compiler that turns
//! the tree into composable [`Predicate`]s against an [`EntityCatalog`], a
//! pagination executor, and a CSV exporter.
//!
//! # Example
//!
//! ```rust
//! use lectarium_core::catalog::{Catalog, EntitySchema};
//! use lectarium_core::entity::Record;
//! use lectarium_core::paginate::{PaginationArgs, Paginator};
//! use lectarium_core::storage::MemoryStore;
//! use lectarium_core::value::FieldType;
//!
//! let catalog = Catalog::new().with_entity(
//!     EntitySchema::new("webinars")
//!         .field("webinar_id", FieldType::Integer)
//!         .field("name", FieldType::Text),
//! );
//! let mut store = MemoryStore::new(catalog.clone());
//! store.insert("webinars", Record::new().with("webinar_id", 1i64).with("name", "Algebra")).unwrap();
//! store.insert("webinars", Record::new().with("webinar_id", 2i64).with("name", "Biology")).unwrap();
//!
//! let paginator = Paginator::new(&catalog, "webinars").unwrap();
//! let args = PaginationArgs::new().filter(r#"webinar_id GE "2""#).order_by("-name");
//! let page = paginator.paginate(&store, &args, &[]).unwrap();
//! assert_eq!(page.len(), 1);
//! ```

pub mod catalog;
pub mod compile;
pub mod entity;
pub mod error;
pub mod export;
pub mod order;
pub mod paginate;
pub mod parser;
pub mod predicate;
pub mod storage;
pub mod value;

// Re-export main types at crate root
pub use catalog::{Catalog, EntityCatalog, EntitySchema, RelationKind, RelationshipDef};
pub use compile::{check_field_access, Compiler};
pub use entity::{AccessorTable, FieldSource, Record};
pub use error::{QueryError, QueryResult, SchemaError, SecurityError};
pub use export::{CsvExport, ExportError};
pub use order::{parse_order_clauses, OrderClause};
pub use paginate::{PaginationArgs, Paginator};
pub use parser::{Aggregator, CompareOp, FilterNode, LexError, ParseError, ParsedFilter, Parser};
pub use predicate::{Operand, Predicate};
pub use storage::{FetchRequest, MemoryStore, QueryableCollection, StoreError, Window};
pub use value::{FieldType, Value};
