//! # Lectarium runtime
//!
//! Shared infrastructure for Lectarium tools:
//! - **error**: application error type with client/backend classification
//! - **tracing**: logging setup
//! - **config**: environment configuration
//! - **export**: the `lectarium-export` command
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lectarium::config::Config;
//! use lectarium::export::{run, ExportArgs};
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod tracing;

// Re-export commonly used items at crate root
pub use config::Config;
pub use error::{Error, Result};
pub use export::{run, ExportArgs};
