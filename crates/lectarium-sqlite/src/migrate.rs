//! Table creation from a catalog
//!
//! Each entity gets one table named by its `table_name()`, with one column
//! per declared field. Creation is idempotent.

use lectarium_core::catalog::{Catalog, EntitySchema};
use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;
use crate::values::{column_type, quote_ident};

/// Create every catalog table that does not exist yet.
///
/// # Errors
///
/// Returns an error if any statement fails; no table is created in that case.
pub fn migrate(conn: &Connection, catalog: &Catalog) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for schema in catalog.entities() {
        tx.execute_batch(&create_table_sql(schema))?;
        debug!(entity = %schema.name, table = schema.table_name(), "ensured table");
    }
    tx.commit()?;
    Ok(())
}

fn create_table_sql(schema: &EntitySchema) -> String {
    let columns: Vec<String> = schema
        .fields
        .iter()
        .map(|f| format!("{} {}", quote_ident(&f.name), column_type(f.ty)))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        quote_ident(schema.table_name()),
        columns.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectarium_core::value::FieldType;

    fn catalog() -> Catalog {
        Catalog::new().with_entity(
            EntitySchema::new("webinars")
                .table("webinar")
                .field("webinar_id", FieldType::Integer)
                .field("name", FieldType::Text)
                .field("begin_date", FieldType::DateTime),
        )
    }

    #[test]
    fn test_create_table_sql() {
        let catalog = catalog();
        let schema = catalog.entity("webinars").unwrap();
        assert_eq!(
            create_table_sql(schema),
            r#"CREATE TABLE IF NOT EXISTS "webinar" ("webinar_id" INTEGER, "name" TEXT, "begin_date" TEXT);"#
        );
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let catalog = catalog();
        migrate(&conn, &catalog).unwrap();
        migrate(&conn, &catalog).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='webinar'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }
}
