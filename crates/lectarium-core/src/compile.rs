//! Predicate compiler
//!
//! Walks a [`FilterNode`] tree against an [`EntityCatalog`] and produces a
//! [`Predicate`]. Every field name is checked against the deny-list first, then
//! against the catalog; literals are coerced to the field's declared type.

use crate::catalog::{EntityCatalog, RelationKind};
use crate::error::{QueryError, SchemaError, SecurityError};
use crate::parser::{AggregationFilter, Aggregator, FilterNode, SimpleFilter};
use crate::predicate::Predicate;
use crate::value::{FieldType, Value};

/// Fragments that make a field name unfilterable, matched case-insensitively
/// anywhere in the name.
pub const DENIED_FIELD_FRAGMENTS: [&str; 3] = ["token", "password", "secret"];

/// Reject field names containing a denied fragment.
pub fn check_field_access(field: &str) -> Result<(), SecurityError> {
    let lowered = field.to_ascii_lowercase();
    if DENIED_FIELD_FRAGMENTS.iter().any(|d| lowered.contains(d)) {
        return Err(SecurityError {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Compiles syntax trees into predicates for one catalog.
pub struct Compiler<'c, C: ?Sized> {
    catalog: &'c C,
}

impl<'c, C: EntityCatalog + ?Sized> Compiler<'c, C> {
    pub fn new(catalog: &'c C) -> Self {
        Self { catalog }
    }

    /// Compile an optional tree. `None` (an empty filter) is `Predicate::Always`.
    pub fn compile(&self, tree: Option<&FilterNode<'_>>, entity: &str) -> Result<Predicate, QueryError> {
        match tree {
            Some(node) => self.compile_node(node, entity),
            None => Ok(Predicate::always()),
        }
    }

    fn compile_node(&self, node: &FilterNode<'_>, entity: &str) -> Result<Predicate, QueryError> {
        match node {
            FilterNode::And { left, right } => {
                let left = self.compile_node(left, entity)?;
                let right = self.compile_node(right, entity)?;
                Ok(left & right)
            }
            FilterNode::Or { left, right } => {
                let left = self.compile_node(left, entity)?;
                let right = self.compile_node(right, entity)?;
                Ok(left | right)
            }
            FilterNode::Simple(filter) => self.compile_simple(filter, entity),
            FilterNode::Aggregation(filter) => self.compile_aggregation(filter, entity),
        }
    }

    fn compile_simple(&self, filter: &SimpleFilter<'_>, entity: &str) -> Result<Predicate, QueryError> {
        check_field_access(filter.field)?;

        let ty = self
            .catalog
            .field_type(entity, filter.field)
            .ok_or_else(|| SchemaError::UnknownField {
                entity: entity.to_string(),
                field: filter.field.to_string(),
            })?;

        let value = coerce(filter.field, ty, filter.constant)?;
        Ok(Predicate::field(filter.field, filter.op, value))
    }

    fn compile_aggregation(
        &self,
        filter: &AggregationFilter<'_>,
        entity: &str,
    ) -> Result<Predicate, QueryError> {
        let relation = self
            .catalog
            .relationship(entity, filter.relation)
            .ok_or_else(|| SchemaError::NotARelationship {
                entity: entity.to_string(),
                relation: filter.relation.to_string(),
            })?;

        let expected = match filter.aggregator {
            Aggregator::Any | Aggregator::All => RelationKind::ToMany,
            Aggregator::Has => RelationKind::ToOne,
        };
        if relation.kind != expected {
            return Err(SchemaError::RelationshipKind {
                entity: entity.to_string(),
                relation: filter.relation.to_string(),
                aggregator: filter.aggregator.as_str(),
                kind: relation.kind.as_str(),
            }
            .into());
        }

        let sub = self.compile_node(&filter.sub_expr, &relation.target)?;
        let value = coerce(filter.relation, FieldType::Boolean, filter.constant)?;

        Ok(match filter.aggregator {
            Aggregator::Any | Aggregator::Has => Predicate::compare(
                Predicate::exists(filter.relation, sub),
                filter.op,
                value,
            ),
            // NOT (EXISTS(NOT sub) op c): an empty relation has no violating
            // row, so ALL(...) EQ "true" holds for it.
            Aggregator::All => !Predicate::compare(
                Predicate::exists(filter.relation, !sub),
                filter.op,
                value,
            ),
        })
    }
}

fn coerce(field: &str, ty: FieldType, literal: &str) -> Result<Value, SchemaError> {
    Value::from_literal(ty, literal).ok_or_else(|| SchemaError::InvalidLiteral {
        field: field.to_string(),
        literal: literal.to_string(),
        expected: ty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, EntitySchema};
    use crate::parser::{CompareOp, Parser};
    use pretty_assertions::assert_eq;

    fn catalog() -> Catalog {
        Catalog::new()
            .with_entity(
                EntitySchema::new("webinars")
                    .field("webinar_id", FieldType::Integer)
                    .field("name", FieldType::Text)
                    .field("is_closed", FieldType::Boolean)
                    .to_many("wtokens", "webinar_tokens", "webinar_id", "webinar_id"),
            )
            .with_entity(
                EntitySchema::new("webinar_tokens")
                    .field("id", FieldType::Integer)
                    .field("webinar_id", FieldType::Integer)
                    .field("lect_id", FieldType::Integer)
                    .field("token", FieldType::Text)
                    .to_one("webinar", "webinars", "webinar_id", "webinar_id"),
            )
    }

    fn compile(filter: &str) -> Result<Predicate, QueryError> {
        let catalog = catalog();
        let parsed = Parser::parse(filter);
        Compiler::new(&catalog).compile(parsed.tree.as_ref(), "webinars")
    }

    #[test]
    fn test_empty_filter_is_always() {
        assert_eq!(compile("").unwrap(), Predicate::Always);
        assert_eq!(compile("not a clause").unwrap(), Predicate::Always);
    }

    #[test]
    fn test_simple_filter_coerces_literal() {
        assert_eq!(
            compile(r#"webinar_id GE "10""#).unwrap(),
            Predicate::field("webinar_id", CompareOp::Ge, 10i64)
        );
        assert_eq!(
            compile(r#"is_closed EQ "false""#).unwrap(),
            Predicate::field("is_closed", CompareOp::Eq, false)
        );
    }

    #[test]
    fn test_null_literal() {
        assert_eq!(
            compile(r#"name NE "NULL""#).unwrap(),
            Predicate::field("name", CompareOp::Ne, Value::Null)
        );
    }

    #[test]
    fn test_invalid_literal() {
        let err = compile(r#"webinar_id EQ "ten""#).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Schema(SchemaError::InvalidLiteral { expected: FieldType::Integer, .. })
        ));
    }

    #[test]
    fn test_unknown_field() {
        let err = compile(r#"bogus EQ "x""#).unwrap_err();
        assert!(matches!(err, QueryError::Schema(SchemaError::UnknownField { .. })));
        assert!(err.is_client_error());
        assert_eq!(err.field(), Some("bogus"));
    }

    #[test]
    fn test_relationship_is_not_a_field() {
        let err = compile(r#"wtokens EQ "x""#).unwrap_err();
        assert!(matches!(err, QueryError::Schema(SchemaError::UnknownField { .. })));
    }

    #[test]
    fn test_denied_fields() {
        for filter in [
            r#"token EQ "x""#,
            r#"TOKEN EQ "x""#,
            r#"auth_token EQ "x""#,
            r#"user_Password EQ "x""#,
            r#"client_secret EQ "x""#,
        ] {
            let err = compile(filter).unwrap_err();
            assert!(matches!(err, QueryError::Security(_)), "{}", filter);
        }
    }

    #[test]
    fn test_denied_field_inside_aggregation() {
        let err = compile(r#"ANY(wtokens, token EQ "x") EQ "true""#).unwrap_err();
        assert!(matches!(err, QueryError::Security(ref e) if e.field == "token"));
    }

    #[test]
    fn test_denied_field_in_valid_clause_is_not_swallowed() {
        let err = compile(r#"name EQ "a", password EQ "b""#).unwrap_err();
        assert!(matches!(err, QueryError::Security(_)));
    }

    #[test]
    fn test_any_compiles_against_target() {
        assert_eq!(
            compile(r#"ANY(wtokens, lect_id EQ "5") EQ "true""#).unwrap(),
            Predicate::compare(
                Predicate::exists("wtokens", Predicate::field("lect_id", CompareOp::Eq, 5i64)),
                CompareOp::Eq,
                true,
            )
        );
    }

    #[test]
    fn test_all_is_double_negation() {
        assert_eq!(
            compile(r#"ALL(wtokens, lect_id GT "0") EQ "true""#).unwrap(),
            Predicate::Not(Box::new(Predicate::compare(
                Predicate::exists(
                    "wtokens",
                    Predicate::Not(Box::new(Predicate::field("lect_id", CompareOp::Gt, 0i64)))
                ),
                CompareOp::Eq,
                true,
            )))
        );
    }

    #[test]
    fn test_has_requires_to_one() {
        let catalog = catalog();
        let parsed = Parser::parse(r#"HAS(webinar, name EQ "x") EQ "true""#);
        let compiler = Compiler::new(&catalog);
        assert!(compiler.compile(parsed.tree.as_ref(), "webinar_tokens").is_ok());

        let err = compile(r#"HAS(wtokens, lect_id EQ "1") EQ "true""#).unwrap_err();
        assert!(matches!(err, QueryError::Schema(SchemaError::RelationshipKind { .. })));
    }

    #[test]
    fn test_sub_expression_fields_belong_to_target() {
        let err = compile(r#"ANY(wtokens, name EQ "x") EQ "true""#).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Schema(SchemaError::UnknownField { ref entity, .. }) if entity == "webinar_tokens"
        ));
    }

    #[test]
    fn test_not_a_relationship() {
        let err = compile(r#"ANY(name, x EQ "1") EQ "true""#).unwrap_err();
        assert!(matches!(err, QueryError::Schema(SchemaError::NotARelationship { .. })));
    }

    #[test]
    fn test_compiling_twice_is_equivalent() {
        let filter = r#"ANY(wtokens, lect_id EQ "5") EQ "true", name NE "x""#;
        assert_eq!(compile(filter).unwrap(), compile(filter).unwrap());
    }
}
