//! Whole-record coercion for downstream adapters.
//!
//! Every attribute of the entity is coerced, and every failure is collected
//! rather than stopping at the first one.

use super::Entity;
use crate::attribute::{Attribute, CoercionContract};
use crate::error::CoercionError;
use crate::value::Value;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use thiserror::Error;

/// Canonical values keyed by attribute name.
pub type Record = BTreeMap<String, Value>;

/// A record with one or more rejected fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "record for `{entity}` rejected: {} invalid field(s), {} unknown field(s)",
    errors.len(),
    unknown.len()
)]
pub struct RecordError {
    /// Entity name.
    pub entity: String,
    /// Per-attribute coercion failures.
    pub errors: Vec<CoercionError>,
    /// Input keys that are not attributes of the entity.
    pub unknown: Vec<String>,
}

impl RecordError {
    /// Check if the record was accepted.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.unknown.is_empty()
    }
}

impl Entity {
    /// Coerce a record on the storage-write path.
    ///
    /// Attributes missing from `input` are undefined: they take their
    /// default, or null when nullable.
    pub fn set_orm_record(&self, input: &Record) -> Result<Record, RecordError> {
        let unknown = self.unknown_keys(input.keys());
        self.collect(unknown, |name, attribute| {
            attribute.set_orm_property_value(input.get(name))
        })
    }

    /// Coerce a loosely-typed client payload.
    pub fn set_client_record(&self, input: &Map<String, JsonValue>) -> Result<Record, RecordError> {
        let unknown = self.unknown_keys(input.keys());
        self.collect(unknown, |name, attribute| {
            attribute.set_client_property_value(input.get(name))
        })
    }

    /// Render a record for a response body. Only fields present in `record` are rendered.
    pub fn serialize_client_record(&self, record: &Record) -> Result<Map<String, JsonValue>, RecordError> {
        let mut output = Map::new();
        let mut errors = Vec::new();
        let mut unknown = Vec::new();
        for (name, value) in record {
            match self.attributes.get(name) {
                Some(attribute) => match attribute.serialize_client_property_value(value) {
                    Ok(json) => {
                        output.insert(name.clone(), json);
                    }
                    Err(err) => errors.push(err),
                },
                None => unknown.push(name.clone()),
            }
        }
        self.finish(output, errors, unknown)
    }

    fn unknown_keys<'a>(&self, keys: impl Iterator<Item = &'a String>) -> Vec<String> {
        keys.filter(|key| !self.attributes.contains_key(*key))
            .cloned()
            .collect()
    }

    fn collect(
        &self,
        unknown: Vec<String>,
        coerce: impl Fn(&str, &Attribute) -> Result<Value, CoercionError>,
    ) -> Result<Record, RecordError> {
        let mut output = Record::new();
        let mut errors = Vec::new();
        for (name, attribute) in &self.attributes {
            match coerce(name, attribute) {
                Ok(value) => {
                    output.insert(name.clone(), value);
                }
                Err(err) => errors.push(err),
            }
        }
        self.finish(output, errors, unknown)
    }

    fn finish<T>(&self, output: T, errors: Vec<CoercionError>, unknown: Vec<String>) -> Result<T, RecordError> {
        if errors.is_empty() && unknown.is_empty() {
            Ok(output)
        } else {
            Err(RecordError {
                entity: self.name.clone(),
                errors,
                unknown,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{integer, string};
    use crate::error::CoercionErrorKind;
    use crate::schema::{finalize, EntityDecl};
    use serde_json::json;

    fn user() -> Entity {
        let decl = EntityDecl::new("User")
            .attribute("name", string().required(true).build().unwrap())
            .attribute("age", integer().min(0).max(150).build().unwrap())
            .attribute("credits", integer().default_value(10).build().unwrap());
        finalize(&[decl]).unwrap().entity("User").unwrap().clone()
    }

    #[test]
    fn test_orm_record_fills_defaults() {
        let user = user();
        let mut input = Record::new();
        input.insert("name".into(), Value::Text("Ada".into()));

        let record = user.set_orm_record(&input).unwrap();
        assert_eq!(record["name"], Value::Text("Ada".into()));
        assert_eq!(record["age"], Value::Null);
        assert_eq!(record["credits"], Value::Integer(10));
        assert!(matches!(record["id"], Value::Uuid(_)));
    }

    #[test]
    fn test_orm_record_collects_every_error() {
        let user = user();
        let mut input = Record::new();
        input.insert("age".into(), Value::Integer(200));
        input.insert("id".into(), Value::Text("mine".into()));
        input.insert("nickname".into(), Value::Text("x".into()));

        let err = user.set_orm_record(&input).unwrap_err();
        assert_eq!(err.entity, "User");
        assert_eq!(err.unknown, vec!["nickname".to_string()]);
        let kinds: Vec<_> = err.errors.iter().map(|e| (e.attribute.as_str(), e.kind.clone())).collect();
        assert_eq!(kinds.len(), 3);
        assert!(kinds.contains(&("id", CoercionErrorKind::ReadOnly)));
        assert!(kinds.contains(&("name", CoercionErrorKind::Undefined)));
        assert!(kinds.iter().any(|(name, kind)| *name == "age" && matches!(kind, CoercionErrorKind::Bound { .. })));
        assert!(!err.is_empty());
    }

    #[test]
    fn test_client_record_round_trip() {
        let user = user();
        let payload = json!({ "name": "Ada", "age": "36" });
        let record = user.set_client_record(payload.as_object().unwrap()).unwrap();
        assert_eq!(record["age"], Value::Integer(36));

        let mut subset = Record::new();
        subset.insert("name".into(), record["name"].clone());
        subset.insert("age".into(), record["age"].clone());
        let rendered = user.serialize_client_record(&subset).unwrap();
        assert_eq!(JsonValue::Object(rendered), json!({ "name": "Ada", "age": 36 }));
    }
}
