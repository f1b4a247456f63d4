//! Pagination and ordering executor
//!
//! [`Paginator`] ties one entity type to a catalog and turns request
//! arguments into a single [`FetchRequest`] against a [`QueryableCollection`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::EntityCatalog;
use crate::compile::Compiler;
use crate::error::{QueryResult, SchemaError, SecurityError};
use crate::order::{self, OrderClause};
use crate::parser::Parser;
use crate::predicate::Predicate;
use crate::storage::{FetchRequest, QueryableCollection, Window};

/// Per-request listing arguments.
///
/// Deserializes with defaults for every missing key, so a query string with
/// only `filter` set is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationArgs {
    /// 1-based page number
    pub page: i64,
    /// Page size; 0 means unbounded
    pub size: usize,
    /// Rows skipped before the first page
    pub offset: usize,
    pub filter: String,
    pub order_by: String,
}

impl Default for PaginationArgs {
    fn default() -> Self {
        Self {
            page: 1,
            size: 0,
            offset: 0,
            filter: String::new(),
            order_by: String::new(),
        }
    }
}

impl PaginationArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    /// Limit the page size to `max`. An unbounded request becomes a first
    /// page of `max` rows. `max == 0` leaves the arguments unchanged.
    pub fn capped(mut self, max: usize) -> Self {
        if max > 0 && (self.size == 0 || self.size > max) {
            self.size = max;
        }
        self
    }

    /// The slice of the ordered result set these arguments select.
    ///
    /// With `size > 0` the page is `[offset + size*(page-1), +size)`. Bounds
    /// that fall below zero (from `page <= 0`) are clamped to zero.
    pub fn window(&self) -> Window {
        if self.size > 0 {
            let size = i64::try_from(self.size).unwrap_or(i64::MAX);
            let offset = i64::try_from(self.offset).unwrap_or(i64::MAX);
            let start = size
                .saturating_mul(self.page.saturating_sub(1))
                .saturating_add(offset);
            let end = start.saturating_add(size);
            if start < 0 {
                warn!(page = self.page, size = self.size, offset = self.offset, "negative page start clamped to zero");
            }
            Window::Range {
                start: clamp(start),
                end: clamp(end),
            }
        } else if self.offset > 0 {
            Window::Skip(self.offset)
        } else {
            Window::All
        }
    }
}

fn clamp(bound: i64) -> usize {
    usize::try_from(bound.max(0)).unwrap_or(usize::MAX)
}

/// Executes listing requests for one entity type.
pub struct Paginator<'c, C: ?Sized> {
    catalog: &'c C,
    entity: String,
}

impl<'c, C: EntityCatalog + ?Sized> Paginator<'c, C> {
    pub fn new(catalog: &'c C, entity: impl Into<String>) -> Result<Self, SchemaError> {
        let entity = entity.into();
        if !catalog.contains_entity(&entity) {
            return Err(SchemaError::UnknownEntity(entity));
        }
        Ok(Self { catalog, entity })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn catalog(&self) -> &'c C {
        self.catalog
    }

    /// Compile a filter string, skipping malformed clauses.
    pub fn parse_filters(&self, filter: &str) -> QueryResult<Predicate> {
        let parsed = Parser::parse(filter);
        Compiler::new(self.catalog).compile(parsed.tree.as_ref(), &self.entity)
    }

    /// Compile a filter string, rejecting malformed clauses.
    pub fn parse_filters_strict(&self, filter: &str) -> QueryResult<Predicate> {
        let tree = Parser::parse_strict(filter)?;
        Compiler::new(self.catalog).compile(tree.as_ref(), &self.entity)
    }

    pub fn parse_order_clauses(&self, order_by: &str) -> Result<Vec<OrderClause>, SecurityError> {
        order::parse_order_clauses(order_by, &self.entity, self.catalog)
    }

    /// Build the fetch for `args`. `extra` predicates are ANDed in without
    /// field validation; they come from trusted callers, not request input.
    pub fn request(&self, args: &PaginationArgs, extra: &[Predicate]) -> QueryResult<FetchRequest> {
        let filtered = self.parse_filters(&args.filter)?;
        let order = self.parse_order_clauses(&args.order_by)?;
        let predicate = Predicate::all(std::iter::once(filtered).chain(extra.iter().cloned()));

        Ok(FetchRequest {
            predicate,
            order,
            window: args.window(),
        })
    }

    /// Filter, order and window one page of entities.
    pub fn paginate<S>(
        &self,
        store: &S,
        args: &PaginationArgs,
        extra: &[Predicate],
    ) -> QueryResult<Vec<S::Item>>
    where
        S: QueryableCollection + ?Sized,
    {
        let request = self.request(args, extra)?;
        debug!(
            entity = %self.entity,
            predicate = %request.predicate,
            order = request.order.len(),
            window = ?request.window,
            "fetching page"
        );
        Ok(store.fetch(&self.entity, &request)?)
    }

    /// Number of entities the filter selects, ignoring order and window.
    pub fn items_count<S>(&self, store: &S, filter: &str, extra: &[Predicate]) -> QueryResult<usize>
    where
        S: QueryableCollection + ?Sized,
    {
        let filtered = self.parse_filters(filter)?;
        let predicate = Predicate::all(std::iter::once(filtered).chain(extra.iter().cloned()));
        debug!(entity = %self.entity, predicate = %predicate, "counting");
        Ok(store.count(&self.entity, &predicate)?)
    }
}
