//! Environment configuration

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default tracing filter (`LECTARIUM_LOG`)
pub const LOG_VAR: &str = "LECTARIUM_LOG";
/// SQLite file used when no data source is given (`LECTARIUM_DATABASE`)
pub const DATABASE_VAR: &str = "LECTARIUM_DATABASE";
/// Upper bound on page size, 0 for none (`LECTARIUM_MAX_PAGE_SIZE`)
pub const MAX_PAGE_SIZE_VAR: &str = "LECTARIUM_MAX_PAGE_SIZE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_filter: String,
    pub database: Option<PathBuf>,
    pub max_page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            database: None,
            max_page_size: 0,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let max_page_size = match get(MAX_PAGE_SIZE_VAR) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a non-negative integer, got '{}'",
                    MAX_PAGE_SIZE_VAR, raw
                ))
            })?,
            None => defaults.max_page_size,
        };

        Ok(Self {
            log_filter: get(LOG_VAR).unwrap_or(defaults.log_filter),
            database: get(DATABASE_VAR).map(PathBuf::from),
            max_page_size,
        })
    }
}
