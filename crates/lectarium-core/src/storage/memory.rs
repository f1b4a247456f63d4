//! In-memory storage backend
//!
//! Rows are held per entity in insertion order and predicates are evaluated
//! directly. Used by tests, the demo dataset, and anywhere a database is
//! overkill.

use std::collections::HashMap;

use tracing::trace;

use crate::catalog::{Catalog, EntityCatalog};
use crate::entity::Record;
use crate::order::OrderClause;
use crate::parser::CompareOp;
use crate::predicate::{Comparison, Operand, Predicate};
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::traits::{FetchRequest, QueryableCollection};
use crate::value::Value;

/// In-memory collection of entity rows described by a [`Catalog`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: Catalog,
    rows: HashMap<String, Vec<Record>>,
}

impl MemoryStore {
    /// Create an empty store for the catalog's entity types.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            rows: HashMap::new(),
        }
    }

    /// Load a dataset of the form `{"entity": [{...}, ...], ...}`.
    pub fn from_json_dataset(catalog: Catalog, json: &str) -> StoreResult<Self> {
        let dataset: serde_json::Value =
            serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let entities = dataset
            .as_object()
            .ok_or_else(|| StoreError::InvalidData("dataset must be a JSON object".into()))?;

        let mut store = Self::new(catalog);
        for (entity, rows) in entities {
            let rows = rows.as_array().ok_or_else(|| {
                StoreError::InvalidData(format!("rows of '{}' must be an array", entity))
            })?;
            for row in rows {
                let object = row.as_object().ok_or_else(|| {
                    StoreError::InvalidData(format!("row of '{}' must be an object", entity))
                })?;
                let schema = store
                    .catalog
                    .entity(entity)
                    .ok_or_else(|| StoreError::UnknownEntity(entity.clone()))?;
                let record = Record::from_json(schema, object)
                    .map_err(|e| StoreError::InvalidData(e.to_string()))?;
                store.insert(entity, record)?;
            }
        }
        Ok(store)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Append a row.
    pub fn insert(&mut self, entity: &str, record: Record) -> StoreResult<()> {
        if !self.catalog.contains_entity(entity) {
            return Err(StoreError::UnknownEntity(entity.to_string()));
        }
        self.rows.entry(entity.to_string()).or_default().push(record);
        Ok(())
    }

    /// Every row of `entity` in insertion order.
    pub fn rows(&self, entity: &str) -> &[Record] {
        self.rows.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    fn matching(&self, entity: &str, predicate: &Predicate) -> StoreResult<Vec<&Record>> {
        if !self.catalog.contains_entity(entity) {
            return Err(StoreError::UnknownEntity(entity.to_string()));
        }
        let mut matched = Vec::new();
        for record in self.rows(entity) {
            if self.eval(entity, record, predicate)? == Some(true) {
                matched.push(record);
            }
        }
        Ok(matched)
    }

    /// Three-valued evaluation; `None` is SQL's unknown.
    fn eval(&self, entity: &str, record: &Record, predicate: &Predicate) -> StoreResult<Option<bool>> {
        Ok(match predicate {
            Predicate::Always => Some(true),
            Predicate::Compare(c) => self.eval_comparison(entity, record, c)?,
            Predicate::And(a, b) => {
                match (self.eval(entity, record, a)?, self.eval(entity, record, b)?) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                }
            }
            Predicate::Or(a, b) => {
                match (self.eval(entity, record, a)?, self.eval(entity, record, b)?) {
                    (Some(true), _) | (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                }
            }
            Predicate::Not(p) => self.eval(entity, record, p)?.map(|b| !b),
        })
    }

    fn eval_comparison(
        &self,
        entity: &str,
        record: &Record,
        comparison: &Comparison,
    ) -> StoreResult<Option<bool>> {
        let left = match &comparison.operand {
            Operand::Field(name) => record.get(name).cloned().ok_or_else(|| {
                StoreError::Query(format!("'{}' is not a field of {}", name, entity))
            })?,
            Operand::Exists {
                relation,
                condition,
            } => Value::Bool(self.exists(entity, record, relation, condition)?),
        };

        if comparison.value.is_null() {
            return Ok(match comparison.op {
                CompareOp::Eq => Some(left.is_null()),
                CompareOp::Ne => Some(!left.is_null()),
                _ => None,
            });
        }
        Ok(left
            .compare(&comparison.value)
            .map(|ordering| comparison.op.holds(ordering)))
    }

    fn exists(
        &self,
        entity: &str,
        record: &Record,
        relation: &str,
        condition: &Predicate,
    ) -> StoreResult<bool> {
        let def = self.catalog.relationship(entity, relation).ok_or_else(|| {
            StoreError::Query(format!("'{}' is not a relationship of {}", relation, entity))
        })?;

        let key = match record.get(&def.local_key) {
            Some(key) if !key.is_null() => key,
            _ => return Ok(false),
        };

        for related in self.rows(&def.target) {
            let joined = related
                .get(&def.remote_key)
                .and_then(|remote| remote.compare(key))
                .is_some_and(|o| o.is_eq());
            if joined && self.eval(&def.target, related, condition)? == Some(true) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn sort(&self, entity: &str, rows: &mut [&Record], order: &[OrderClause]) -> StoreResult<()> {
        for clause in order {
            if !self.catalog.is_filterable_field(entity, &clause.field) {
                return Err(StoreError::Query(format!(
                    "cannot order {} by '{}'",
                    entity, clause.field
                )));
            }
        }

        rows.sort_by(|a, b| {
            order
                .iter()
                .map(|clause| {
                    let ordering = match (a.get(&clause.field), b.get(&clause.field)) {
                        (Some(x), Some(y)) => x.sort_cmp(y),
                        _ => std::cmp::Ordering::Equal,
                    };
                    if clause.descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                })
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(())
    }
}

impl QueryableCollection for MemoryStore {
    type Item = Record;

    fn fetch(&self, entity: &str, request: &FetchRequest) -> StoreResult<Vec<Record>> {
        let mut rows = self.matching(entity, &request.predicate)?;
        self.sort(entity, &mut rows, &request.order)?;
        trace!(entity, matched = rows.len(), "memory fetch");

        Ok(request
            .window
            .apply(rows)
            .into_iter()
            .cloned()
            .collect())
    }

    fn count(&self, entity: &str, predicate: &Predicate) -> StoreResult<usize> {
        Ok(self.matching(entity, predicate)?.len())
    }
}
