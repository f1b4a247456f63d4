//! Order string parsing

use serde::Serialize;
use tracing::debug;

use crate::catalog::EntityCatalog;
use crate::compile::check_field_access;
use crate::error::SecurityError;

/// One sort key. Clauses apply left to right as tie-breakers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderClause {
    pub field: String,
    pub descending: bool,
}

impl OrderClause {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Parse `"field1, -field2"` into order clauses.
///
/// Criteria naming anything other than a filterable field of `entity` are
/// dropped. A filterable field whose name is on the deny-list is rejected.
pub fn parse_order_clauses<C: EntityCatalog + ?Sized>(
    input: &str,
    entity: &str,
    catalog: &C,
) -> Result<Vec<OrderClause>, SecurityError> {
    let mut clauses = Vec::new();
    if input.is_empty() {
        return Ok(clauses);
    }

    for criterion in input.split(',') {
        let criterion = criterion.trim();
        let (field, descending) = match criterion.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (criterion, false),
        };

        if field.is_empty() {
            continue;
        }
        if !catalog.is_filterable_field(entity, field) {
            debug!(entity, field, "dropping unknown order field");
            continue;
        }
        check_field_access(field)?;

        clauses.push(OrderClause {
            field: field.to_string(),
            descending,
        });
    }

    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, EntitySchema};
    use crate::value::FieldType;
    use pretty_assertions::assert_eq;

    fn catalog() -> Catalog {
        Catalog::new().with_entity(
            EntitySchema::new("webinars")
                .field("webinar_id", FieldType::Integer)
                .field("name", FieldType::Text)
                .field("begin_date", FieldType::DateTime)
                .field("password_hash", FieldType::Text)
                .to_many("wtokens", "webinars", "webinar_id", "webinar_id"),
        )
    }

    fn parse(input: &str) -> Result<Vec<OrderClause>, SecurityError> {
        parse_order_clauses(input, "webinars", &catalog())
    }

    #[test]
    fn test_empty() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_direction_and_order() {
        assert_eq!(
            parse(" -begin_date, name ,webinar_id").unwrap(),
            vec![
                OrderClause::desc("begin_date"),
                OrderClause::asc("name"),
                OrderClause::asc("webinar_id"),
            ]
        );
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        assert!(parse("bogus").unwrap().is_empty());
        assert_eq!(
            parse("bogus, -name, wtokens, - name").unwrap(),
            vec![OrderClause::desc("name")]
        );
    }

    #[test]
    fn test_denied_names_outside_the_schema_are_dropped() {
        assert_eq!(parse("auth_token").unwrap(), vec![]);
        assert_eq!(
            parse("secret_note, -name").unwrap(),
            vec![OrderClause::desc("name")]
        );
    }

    #[test]
    fn test_denied_field_is_rejected() {
        let err = parse("name, -password_hash").unwrap_err();
        assert_eq!(err.field, "password_hash");
    }
}
