//! Entity catalog
//!
//! The compiler never inspects data. It asks a catalog which names are
//! filterable fields and which are relationships, and what a relationship
//! points at. [`Catalog`] is the in-crate implementation, loadable from JSON:
//!
//! ```json
//! {
//!   "entities": [
//!     {
//!       "name": "webinars",
//!       "fields": [
//!         { "name": "webinar_id", "type": "integer" },
//!         { "name": "name", "type": "text" }
//!       ],
//!       "relationships": [
//!         { "name": "wtokens", "target": "webinar_tokens", "kind": "to_many",
//!           "local_key": "webinar_id", "remote_key": "webinar_id" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SchemaError;
use crate::value::FieldType;

/// Field and relationship introspection for entity types.
pub trait EntityCatalog {
    /// Whether `entity` names a known entity type.
    fn contains_entity(&self, entity: &str) -> bool;

    /// Declared type of a filterable field, `None` if `name` is not one.
    fn field_type(&self, entity: &str, name: &str) -> Option<FieldType>;

    /// Relationship metadata, `None` if `name` is not a relationship.
    fn relationship(&self, entity: &str, name: &str) -> Option<&RelationshipDef>;

    /// Every field of the entity in declared order.
    fn field_names(&self, entity: &str) -> Vec<&str>;

    fn is_filterable_field(&self, entity: &str, name: &str) -> bool {
        self.field_type(entity, name).is_some()
    }

    fn is_relationship(&self, entity: &str, name: &str) -> bool {
        self.relationship(entity, name).is_some()
    }

    fn relationship_target(&self, entity: &str, name: &str) -> Option<&str> {
        self.relationship(entity, name).map(|r| r.target.as_str())
    }
}

/// Cardinality of a relationship, seen from its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ToMany,
    ToOne,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::ToMany => "to-many",
            RelationKind::ToOne => "to-one",
        }
    }
}

/// A declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

/// A declared relationship.
///
/// Related rows are those whose `remote_key` equals the owner's `local_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDef {
    pub name: String,
    pub target: String,
    pub kind: RelationKind,
    pub local_key: String,
    pub remote_key: String,
}

/// Schema of a single entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    /// Backing table name for SQL stores. Defaults to `name`.
    #[serde(default)]
    pub table: Option<String>,
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDef>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            fields: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn to_many(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        local_key: impl Into<String>,
        remote_key: impl Into<String>,
    ) -> Self {
        self.relation(RelationKind::ToMany, name, target, local_key, remote_key)
    }

    pub fn to_one(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        local_key: impl Into<String>,
        remote_key: impl Into<String>,
    ) -> Self {
        self.relation(RelationKind::ToOne, name, target, local_key, remote_key)
    }

    fn relation(
        mut self,
        kind: RelationKind,
        name: impl Into<String>,
        target: impl Into<String>,
        local_key: impl Into<String>,
        remote_key: impl Into<String>,
    ) -> Self {
        self.relationships.push(RelationshipDef {
            name: name.into(),
            target: target.into(),
            kind,
            local_key: local_key.into(),
            remote_key: remote_key.into(),
        });
        self
    }

    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relationship_def(&self, name: &str) -> Option<&RelationshipDef> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

/// A set of entity schemas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    entities: Vec<EntitySchema>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, schema: EntitySchema) -> Self {
        self.entities.push(schema);
        self
    }

    /// Parse and validate a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let catalog: Catalog = serde_json::from_str(json)
            .map_err(|e| SchemaError::InvalidCatalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn entity(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entities.iter()
    }

    /// Check internal consistency: unique names, relationship targets and
    /// join keys exist.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(SchemaError::InvalidCatalog(format!(
                    "duplicate entity '{}'",
                    entity.name
                )));
            }

            let mut names = HashSet::new();
            let declared = entity
                .fields
                .iter()
                .map(|f| &f.name)
                .chain(entity.relationships.iter().map(|r| &r.name));
            for name in declared {
                if !names.insert(name.as_str()) {
                    return Err(SchemaError::InvalidCatalog(format!(
                        "duplicate name '{}' in {}",
                        name, entity.name
                    )));
                }
            }

            for rel in &entity.relationships {
                let target = self.entity(&rel.target).ok_or_else(|| {
                    SchemaError::InvalidCatalog(format!(
                        "relationship '{}' of {} targets unknown entity '{}'",
                        rel.name, entity.name, rel.target
                    ))
                })?;
                if entity.field_def(&rel.local_key).is_none() {
                    return Err(SchemaError::InvalidCatalog(format!(
                        "local key '{}' of relationship '{}' is not a field of {}",
                        rel.local_key, rel.name, entity.name
                    )));
                }
                if target.field_def(&rel.remote_key).is_none() {
                    return Err(SchemaError::InvalidCatalog(format!(
                        "remote key '{}' of relationship '{}' is not a field of {}",
                        rel.remote_key, rel.name, target.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl EntityCatalog for Catalog {
    fn contains_entity(&self, entity: &str) -> bool {
        self.entity(entity).is_some()
    }

    fn field_type(&self, entity: &str, name: &str) -> Option<FieldType> {
        self.entity(entity)?.field_def(name).map(|f| f.ty)
    }

    fn relationship(&self, entity: &str, name: &str) -> Option<&RelationshipDef> {
        self.entity(entity)?.relationship_def(name)
    }

    fn field_names(&self, entity: &str) -> Vec<&str> {
        self.entity(entity)
            .map(|e| e.fields.iter().map(|f| f.name.as_str()).collect())
            .unwrap_or_default()
    }
}
