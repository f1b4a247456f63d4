//! SQLite collection for the Lectarium query core
//!
//! Implements `QueryableCollection` on top of rusqlite. Compiled predicates are
//! translated to SQL (`EXISTS` subqueries for relationship quantifiers) so the
//! database does the filtering, ordering and windowing. Results agree with
//! `lectarium_core::MemoryStore` on the same data.
//!
//! # Example
//!
//! ```rust,no_run
//! use lectarium_core::{Catalog, PaginationArgs, Paginator};
//! use lectarium_sqlite::SqliteCollection;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::from_json(&std::fs::read_to_string("webinars.catalog.json")?)?;
//! let store = SqliteCollection::open("lectarium.db", catalog.clone())?;
//!
//! let paginator = Paginator::new(&catalog, "webinars")?;
//! let args = PaginationArgs::new()
//!     .filter(r#"ANY(wtokens, lect_id EQ "100") EQ "true""#)
//!     .order_by("-begin_date")
//!     .size(20);
//! let page = paginator.paginate(&store, &args, &[])?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod migrate;
pub mod sql;
mod store;
pub mod values;

pub use error::{Result, SqliteError};
pub use sql::{SqlBuilder, Statement};
pub use store::SqliteCollection;
