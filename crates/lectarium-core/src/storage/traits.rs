//! Queryable collection trait

use crate::entity::FieldSource;
use crate::order::OrderClause;
use crate::predicate::Predicate;
use crate::storage::error::StoreResult;

/// Which part of the ordered result set to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Every matching row
    All,
    /// Every matching row after the first `n`
    Skip(usize),
    /// Rows `start..end` (half-open)
    Range { start: usize, end: usize },
}

impl Window {
    /// Apply the window to an already ordered sequence.
    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T> {
        match *self {
            Window::All => rows,
            Window::Skip(n) => rows.into_iter().skip(n).collect(),
            Window::Range { start, end } => rows
                .into_iter()
                .skip(start)
                .take(end.saturating_sub(start))
                .collect(),
        }
    }
}

/// A single fetch: filter, sort, then window.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub predicate: Predicate,
    pub order: Vec<OrderClause>,
    pub window: Window,
}

impl FetchRequest {
    /// Every row, unordered.
    pub fn all() -> Self {
        Self {
            predicate: Predicate::always(),
            order: Vec::new(),
            window: Window::All,
        }
    }
}

/// A store that can evaluate compiled predicates.
///
/// `fetch` is the only blocking call the query core makes per request. It is
/// performed once; failures propagate without retry. Concurrent calls may
/// observe different snapshots if the underlying data changes.
pub trait QueryableCollection {
    /// Row type returned by fetches
    type Item: FieldSource;

    /// Filter, order and window the rows of `entity`.
    fn fetch(&self, entity: &str, request: &FetchRequest) -> StoreResult<Vec<Self::Item>>;

    /// Number of rows of `entity` matching `predicate`.
    fn count(&self, entity: &str, predicate: &Predicate) -> StoreResult<usize>;
}
