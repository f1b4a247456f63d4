//! Predicate to SQL translation
//!
//! Predicates render into a `WHERE` expression with positional parameters.
//! SQLite's own three-valued logic matches the in-memory evaluator, so the
//! only special cases are the null tests (`EQ NULL` is `IS NULL`).
//!
//! Relationship quantifiers become correlated subqueries:
//!
//! ```sql
//! (EXISTS (SELECT 1 FROM "webinar_tokens" AS t1
//!          WHERE t1."webinar_id" = t0."webinar_id" AND (t1."lect_id" = ?))) = ?
//! ```

use lectarium_core::catalog::{Catalog, EntityCatalog, EntitySchema};
use lectarium_core::order::OrderClause;
use lectarium_core::parser::CompareOp;
use lectarium_core::predicate::{Comparison, Operand, Predicate};
use lectarium_core::storage::{FetchRequest, Window};
use rusqlite::types::Value as SqlValue;

use crate::error::{Result, SqliteError};
use crate::values::{quote_ident, to_sql};

/// SQL text plus its bind parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Builds statements for one catalog.
pub struct SqlBuilder<'c> {
    catalog: &'c Catalog,
}

impl<'c> SqlBuilder<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    fn schema(&self, entity: &str) -> Result<&'c EntitySchema> {
        self.catalog
            .entity(entity)
            .ok_or_else(|| SqliteError::UnknownEntity(entity.to_string()))
    }

    /// `SELECT <fields> ... WHERE ... ORDER BY ... LIMIT ...`
    ///
    /// Rows tied on every sort key keep insertion order.
    pub fn select(&self, entity: &str, request: &FetchRequest) -> Result<Statement> {
        let schema = self.schema(entity)?;
        let columns: Vec<String> = schema
            .fields
            .iter()
            .map(|f| format!("t0.{}", quote_ident(&f.name)))
            .collect();

        let mut render = Renderer::new(self.catalog);
        let condition = render.predicate(entity, &request.predicate, 0)?;

        let mut sql = format!(
            "SELECT {} FROM {} AS t0 WHERE {}",
            columns.join(", "),
            quote_ident(schema.table_name()),
            condition
        );
        sql.push_str(" ORDER BY ");
        sql.push_str(&self.order_by(schema, &request.order)?);

        match request.window {
            Window::All => {}
            Window::Skip(offset) => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                render.params.push(SqlValue::Integer(to_i64(offset)));
            }
            Window::Range { start, end } => {
                sql.push_str(" LIMIT ? OFFSET ?");
                render.params.push(SqlValue::Integer(to_i64(end.saturating_sub(start))));
                render.params.push(SqlValue::Integer(to_i64(start)));
            }
        }

        Ok(Statement {
            sql,
            params: render.params,
        })
    }

    /// `SELECT COUNT(*) ... WHERE ...`
    pub fn count(&self, entity: &str, predicate: &Predicate) -> Result<Statement> {
        let schema = self.schema(entity)?;
        let mut render = Renderer::new(self.catalog);
        let condition = render.predicate(entity, predicate, 0)?;
        Ok(Statement {
            sql: format!(
                "SELECT COUNT(*) FROM {} AS t0 WHERE {}",
                quote_ident(schema.table_name()),
                condition
            ),
            params: render.params,
        })
    }

    fn order_by(&self, schema: &EntitySchema, order: &[OrderClause]) -> Result<String> {
        let mut keys = Vec::with_capacity(order.len() + 1);
        for clause in order {
            if schema.field_def(&clause.field).is_none() {
                return Err(SqliteError::Query(format!(
                    "cannot order {} by '{}'",
                    schema.name, clause.field
                )));
            }
            let direction = if clause.descending { "DESC" } else { "ASC" };
            keys.push(format!("t0.{} {}", quote_ident(&clause.field), direction));
        }
        keys.push("t0.rowid ASC".to_string());
        Ok(keys.join(", "))
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Renders one predicate tree, collecting parameters in order.
struct Renderer<'c> {
    catalog: &'c Catalog,
    params: Vec<SqlValue>,
}

impl<'c> Renderer<'c> {
    fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            params: Vec::new(),
        }
    }

    fn predicate(&mut self, entity: &str, predicate: &Predicate, depth: usize) -> Result<String> {
        Ok(match predicate {
            Predicate::Always => "1".to_string(),
            Predicate::Compare(c) => self.comparison(entity, c, depth)?,
            Predicate::And(a, b) => format!(
                "({} AND {})",
                self.predicate(entity, a, depth)?,
                self.predicate(entity, b, depth)?
            ),
            Predicate::Or(a, b) => format!(
                "({} OR {})",
                self.predicate(entity, a, depth)?,
                self.predicate(entity, b, depth)?
            ),
            Predicate::Not(p) => format!("(NOT {})", self.predicate(entity, p, depth)?),
        })
    }

    fn comparison(&mut self, entity: &str, comparison: &Comparison, depth: usize) -> Result<String> {
        let left = match &comparison.operand {
            Operand::Field(name) => {
                if !self.catalog.is_filterable_field(entity, name) {
                    return Err(SqliteError::Query(format!(
                        "'{}' is not a field of {}",
                        name, entity
                    )));
                }
                format!("t{}.{}", depth, quote_ident(name))
            }
            Operand::Exists {
                relation,
                condition,
            } => self.exists(entity, relation, condition, depth)?,
        };

        if comparison.value.is_null() {
            match comparison.op {
                CompareOp::Eq => return Ok(format!("{} IS NULL", left)),
                CompareOp::Ne => return Ok(format!("{} IS NOT NULL", left)),
                _ => {}
            }
        }

        self.params.push(to_sql(&comparison.value));
        Ok(format!("{} {} ?", left, sql_operator(comparison.op)))
    }

    fn exists(
        &mut self,
        entity: &str,
        relation: &str,
        condition: &Predicate,
        depth: usize,
    ) -> Result<String> {
        let def = self.catalog.relationship(entity, relation).ok_or_else(|| {
            SqliteError::Query(format!("'{}' is not a relationship of {}", relation, entity))
        })?;
        let target = self
            .catalog
            .entity(&def.target)
            .ok_or_else(|| SqliteError::UnknownEntity(def.target.clone()))?;

        let inner = depth + 1;
        let condition = self.predicate(&def.target, condition, inner)?;
        Ok(format!(
            "(EXISTS (SELECT 1 FROM {table} AS t{inner} WHERE t{inner}.{remote} = t{depth}.{local} AND {condition}))",
            table = quote_ident(target.table_name()),
            remote = quote_ident(&def.remote_key),
            local = quote_ident(&def.local_key),
        ))
    }
}

fn sql_operator(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectarium_core::catalog::EntitySchema;
    use lectarium_core::value::{FieldType, Value};
    use pretty_assertions::assert_eq;

    fn catalog() -> Catalog {
        Catalog::new()
            .with_entity(
                EntitySchema::new("webinars")
                    .field("webinar_id", FieldType::Integer)
                    .field("name", FieldType::Text)
                    .to_many("wtokens", "webinar_tokens", "webinar_id", "webinar_id"),
            )
            .with_entity(
                EntitySchema::new("webinar_tokens")
                    .table("webinar_token")
                    .field("webinar_id", FieldType::Integer)
                    .field("lect_id", FieldType::Integer),
            )
    }

    #[test]
    fn test_select_all() {
        let catalog = catalog();
        let stmt = SqlBuilder::new(&catalog)
            .select("webinars", &FetchRequest::all())
            .unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT t0."webinar_id", t0."name" FROM "webinars" AS t0 WHERE 1 ORDER BY t0.rowid ASC"#
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_select_with_order_and_window() {
        let catalog = catalog();
        let request = FetchRequest {
            predicate: Predicate::field("name", CompareOp::Ne, "x")
                & Predicate::field("webinar_id", CompareOp::Eq, Value::Null),
            order: vec![OrderClause::desc("name")],
            window: Window::Range { start: 20, end: 30 },
        };
        let stmt = SqlBuilder::new(&catalog).select("webinars", &request).unwrap();
        assert_eq!(
            stmt.sql,
            concat!(
                r#"SELECT t0."webinar_id", t0."name" FROM "webinars" AS t0 "#,
                r#"WHERE (t0."name" <> ? AND t0."webinar_id" IS NULL) "#,
                r#"ORDER BY t0."name" DESC, t0.rowid ASC LIMIT ? OFFSET ?"#
            )
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Text("x".into()),
                SqlValue::Integer(10),
                SqlValue::Integer(20)
            ]
        );
    }

    #[test]
    fn test_exists_subquery() {
        let catalog = catalog();
        let predicate = !Predicate::compare(
            Predicate::exists("wtokens", !Predicate::field("lect_id", CompareOp::Gt, 0i64)),
            CompareOp::Eq,
            true,
        );
        let stmt = SqlBuilder::new(&catalog).count("webinars", &predicate).unwrap();
        assert_eq!(
            stmt.sql,
            concat!(
                r#"SELECT COUNT(*) FROM "webinars" AS t0 WHERE (NOT (EXISTS (SELECT 1 FROM "webinar_token" AS t1 "#,
                r#"WHERE t1."webinar_id" = t0."webinar_id" AND (NOT t1."lect_id" > ?))) = ?)"#
            )
        );
        assert_eq!(stmt.params, vec![SqlValue::Integer(0), SqlValue::Integer(1)]);
    }

    #[test]
    fn test_skip_window() {
        let catalog = catalog();
        let request = FetchRequest {
            window: Window::Skip(3),
            ..FetchRequest::all()
        };
        let stmt = SqlBuilder::new(&catalog).select("webinars", &request).unwrap();
        assert!(stmt.sql.ends_with("LIMIT -1 OFFSET ?"));
        assert_eq!(stmt.params, vec![SqlValue::Integer(3)]);
    }

    #[test]
    fn test_rejects_undeclared_names() {
        let catalog = catalog();
        let builder = SqlBuilder::new(&catalog);
        assert!(matches!(
            builder.count("rooms", &Predicate::always()),
            Err(SqliteError::UnknownEntity(_))
        ));
        assert!(matches!(
            builder.count("webinars", &Predicate::field("password", CompareOp::Eq, "x")),
            Err(SqliteError::Query(_))
        ));
        let request = FetchRequest {
            order: vec![OrderClause::asc("wtokens")],
            ..FetchRequest::all()
        };
        assert!(matches!(
            builder.select("webinars", &request),
            Err(SqliteError::Query(_))
        ));
    }
}
