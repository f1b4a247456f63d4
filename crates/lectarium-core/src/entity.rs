//! Field access by name
//!
//! Everything downstream of the compiler (in-memory evaluation, ordering, CSV
//! export) reads entity fields by their declared name through [`FieldSource`].
//! Dynamic rows use [`Record`]; typed domain structs register their getters
//! once in an [`AccessorTable`].

use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::EntitySchema;
use crate::error::SchemaError;
use crate::value::Value;

/// Read a field value by name. `None` means the name is not a field.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<Value>;
}

/// A dynamic entity row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Build a record from a JSON object, typing every declared field.
    ///
    /// Missing fields become null; keys that are not declared fields are
    /// ignored.
    pub fn from_json(
        schema: &EntitySchema,
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, SchemaError> {
        let mut record = Record::new();
        for def in &schema.fields {
            let value = match object.get(&def.name) {
                None => Value::Null,
                Some(json) => def.ty.from_json(json).ok_or_else(|| SchemaError::InvalidLiteral {
                    field: def.name.clone(),
                    literal: json.to_string(),
                    expected: def.ty,
                })?,
            };
            record.set(def.name.clone(), value);
        }
        Ok(record)
    }
}

impl FieldSource for Record {
    fn field(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

impl<T: FieldSource + ?Sized> FieldSource for &T {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

/// Getter for one field of `T`
pub type Getter<T> = fn(&T) -> Value;

/// Explicit name → getter table for a typed entity, built once.
pub struct AccessorTable<T> {
    getters: Vec<(&'static str, Getter<T>)>,
}

impl<T> AccessorTable<T> {
    pub fn new() -> Self {
        Self {
            getters: Vec::new(),
        }
    }

    pub fn field(mut self, name: &'static str, getter: Getter<T>) -> Self {
        self.getters.push((name, getter));
        self
    }

    pub fn get(&self, entity: &T, name: &str) -> Option<Value> {
        self.getters
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, getter)| getter(entity))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.getters.iter().map(|(n, _)| *n)
    }
}

impl<T> Default for AccessorTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldType;
    use serde_json::json;
    use std::sync::OnceLock;

    struct Webinar {
        webinar_id: i64,
        name: String,
        room_id: Option<i64>,
    }

    fn accessors() -> &'static AccessorTable<Webinar> {
        static TABLE: OnceLock<AccessorTable<Webinar>> = OnceLock::new();
        TABLE.get_or_init(|| {
            AccessorTable::<Webinar>::new()
                .field("webinar_id", |w| w.webinar_id.into())
                .field("name", |w| w.name.as_str().into())
                .field("room_id", |w| w.room_id.into())
        })
    }

    impl FieldSource for Webinar {
        fn field(&self, name: &str) -> Option<Value> {
            accessors().get(self, name)
        }
    }

    #[test]
    fn test_accessor_table() {
        let w = Webinar {
            webinar_id: 3,
            name: "Intro".into(),
            room_id: None,
        };
        assert_eq!(w.field("webinar_id"), Some(Value::Integer(3)));
        assert_eq!(w.field("name"), Some(Value::Text("Intro".into())));
        assert_eq!(w.field("room_id"), Some(Value::Null));
        assert_eq!(w.field("password"), None);
        assert_eq!(
            accessors().names().collect::<Vec<_>>(),
            vec!["webinar_id", "name", "room_id"]
        );
    }

    #[test]
    fn test_record_from_json() {
        let schema = EntitySchema::new("w")
            .field("id", FieldType::Integer)
            .field("name", FieldType::Text)
            .field("closed", FieldType::Boolean);
        let object = json!({ "id": 1, "name": "x", "extra": [1, 2] });
        let record = Record::from_json(&schema, object.as_object().unwrap()).unwrap();
        assert_eq!(record.get("id"), Some(&Value::Integer(1)));
        assert_eq!(record.get("closed"), Some(&Value::Null));
        assert_eq!(record.get("extra"), None);
    }

    #[test]
    fn test_record_from_json_type_mismatch() {
        let schema = EntitySchema::new("w").field("id", FieldType::Integer);
        let object = json!({ "id": "one" });
        let err = Record::from_json(&schema, object.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidLiteral { ref field, .. } if field == "id"));
    }
}
