//! Storage abstraction for entity collections
//!
//! The query core hands a [`FetchRequest`] (compiled predicate, sort keys and
//! window) to a [`QueryableCollection`] and gets rows back. Implementations:
//!
//! - **Memory**: in-process evaluation (`MemoryStore`)
//! - **SQLite**: SQL translation via rusqlite (the `lectarium-sqlite` crate)
//!
//! # Example
//!
//! ```rust
//! use lectarium_core::catalog::{Catalog, EntitySchema};
//! use lectarium_core::entity::Record;
//! use lectarium_core::storage::{FetchRequest, MemoryStore, QueryableCollection};
//! use lectarium_core::value::FieldType;
//!
//! let catalog = Catalog::new()
//!     .with_entity(EntitySchema::new("rooms").field("name", FieldType::Text));
//! let mut store = MemoryStore::new(catalog);
//! store.insert("rooms", Record::new().with("name", "A-101")).unwrap();
//!
//! let rows = store.fetch("rooms", &FetchRequest::all()).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

mod error;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::{FetchRequest, QueryableCollection, Window};
