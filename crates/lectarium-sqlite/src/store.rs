//! SQLite collection implementing QueryableCollection

use lectarium_core::catalog::{Catalog, EntityCatalog};
use lectarium_core::entity::Record;
use lectarium_core::predicate::Predicate;
use lectarium_core::storage::{FetchRequest, QueryableCollection, StoreResult};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, trace};

use crate::error::{Result, SqliteError};
use crate::sql::{SqlBuilder, Statement};
use crate::values::{from_sql, quote_ident, to_sql};

/// SQLite-backed entity collection
pub struct SqliteCollection {
    conn: Connection,
    catalog: Catalog,
}

impl SqliteCollection {
    /// Wrap a connection, creating any missing catalog tables.
    pub fn new(conn: Connection, catalog: Catalog) -> Result<Self> {
        crate::migrate::migrate(&conn, &catalog)?;
        Ok(Self { conn, catalog })
    }

    /// Create a new in-memory collection (for testing)
    pub fn in_memory(catalog: Catalog) -> Result<Self> {
        Self::new(Connection::open_in_memory()?, catalog)
    }

    /// Open or create a file-backed collection
    pub fn open(path: impl AsRef<std::path::Path>, catalog: Catalog) -> Result<Self> {
        Self::new(Connection::open(path)?, catalog)
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Insert one row. Fields missing from the record are stored as NULL.
    pub fn insert(&self, entity: &str, record: &Record) -> Result<()> {
        let schema = self
            .catalog
            .entity(entity)
            .ok_or_else(|| SqliteError::UnknownEntity(entity.to_string()))?;

        let columns: Vec<String> = schema.fields.iter().map(|f| quote_ident(&f.name)).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(schema.table_name()),
            columns.join(", "),
            placeholders
        );
        let params: Vec<SqlValue> = schema
            .fields
            .iter()
            .map(|f| record.get(&f.name).map(to_sql).unwrap_or(SqlValue::Null))
            .collect();

        self.conn.execute(&sql, params_from_iter(params))?;
        Ok(())
    }

    /// Load a dataset of the form `{"entity": [{...}, ...], ...}` in one
    /// transaction. Returns the number of rows inserted.
    pub fn import_json(&self, json: &str) -> Result<usize> {
        let dataset: serde_json::Value = serde_json::from_str(json)?;
        let entities = dataset
            .as_object()
            .ok_or_else(|| SqliteError::InvalidData("dataset must be a JSON object".into()))?;

        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        for (entity, rows) in entities {
            let schema = self
                .catalog
                .entity(entity)
                .ok_or_else(|| SqliteError::UnknownEntity(entity.clone()))?;
            let rows = rows.as_array().ok_or_else(|| {
                SqliteError::InvalidData(format!("rows of '{}' must be an array", entity))
            })?;
            for row in rows {
                let object = row.as_object().ok_or_else(|| {
                    SqliteError::InvalidData(format!("row of '{}' must be an object", entity))
                })?;
                let record = Record::from_json(schema, object)
                    .map_err(|e| SqliteError::InvalidData(e.to_string()))?;
                self.insert(entity, &record)?;
                inserted += 1;
            }
        }
        tx.commit()?;

        debug!(rows = inserted, "imported dataset");
        Ok(inserted)
    }

    fn query_records(&self, entity: &str, statement: &Statement) -> Result<Vec<Record>> {
        let schema = self
            .catalog
            .entity(entity)
            .ok_or_else(|| SqliteError::UnknownEntity(entity.to_string()))?;
        trace!(sql = %statement.sql, params = statement.params.len(), "select");

        let mut stmt = self.conn.prepare(&statement.sql)?;
        let raw = stmt
            .query_map(params_from_iter(statement.params.iter()), |row| {
                (0..schema.fields.len())
                    .map(|i| row.get::<_, SqlValue>(i))
                    .collect::<rusqlite::Result<Vec<SqlValue>>>()
            })?
            .collect::<rusqlite::Result<Vec<Vec<SqlValue>>>>()?;

        raw.into_iter()
            .map(|values| -> Result<Record> {
                let mut record = Record::new();
                for (def, value) in schema.fields.iter().zip(values) {
                    let value = from_sql(def.ty, value).ok_or_else(|| {
                        SqliteError::InvalidData(format!(
                            "column '{}' of {} does not hold a {} value",
                            def.name, entity, def.ty
                        ))
                    })?;
                    record.set(def.name.clone(), value);
                }
                Ok(record)
            })
            .collect()
    }

    fn count_rows(&self, entity: &str, predicate: &Predicate) -> Result<usize> {
        let statement = SqlBuilder::new(&self.catalog).count(entity, predicate)?;
        trace!(sql = %statement.sql, "count");
        let count: i64 = self.conn.query_row(
            &statement.sql,
            params_from_iter(statement.params.iter()),
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl QueryableCollection for SqliteCollection {
    type Item = Record;

    fn fetch(&self, entity: &str, request: &FetchRequest) -> StoreResult<Vec<Record>> {
        if !self.catalog.contains_entity(entity) {
            return Err(SqliteError::UnknownEntity(entity.to_string()).into());
        }
        let statement = SqlBuilder::new(&self.catalog).select(entity, request)?;
        Ok(self.query_records(entity, &statement)?)
    }

    fn count(&self, entity: &str, predicate: &Predicate) -> StoreResult<usize> {
        Ok(self.count_rows(entity, predicate)?)
    }
}
