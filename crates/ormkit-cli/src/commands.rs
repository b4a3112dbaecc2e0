//! Subcommand handlers.

use clap::ValueEnum;
use ormkit_schema::{
    finalize_with, CoercionContract, CoercionError, Entity, Schema, SchemaConfig, SchemaFile,
    Value,
};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Schema(#[from] ormkit_schema::Error),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error("unknown entity `{0}`")]
    UnknownEntity(String),

    #[error("entity `{entity}` has no attribute `{attribute}`")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("invalid input value: {0}")]
    InvalidValue(String),
}

/// Coercion function selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    /// Loose client payload to canonical value
    ClientProperty,
    /// Client query-filter token to canonical value
    ClientFilter,
    /// Storage-write value to canonical value
    OrmProperty,
    /// Storage query-filter token to canonical value
    OrmFilter,
    /// Response payload to canonical value
    Response,
    /// Canonical value to client payload
    SerializeClient,
    /// Canonical value to client filter token
    SerializeFilter,
    /// Canonical value to storage value
    SerializeOrm,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => write!(f, "{:?}", self),
        }
    }
}

/// Result of one coercion call.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub entity: String,
    pub attribute: String,
    pub direction: Direction,
    pub output: Rendered,
}

/// Output of a coercion function.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Value(Value),
    Json(JsonValue),
    Token(String),
}

/// Read and finalize a declaration file.
pub fn load(path: &Path, config: &SchemaConfig) -> Result<Schema, CliError> {
    let source = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let schema = load_str(&source, config)?;
    info!(path = %path.display(), entities = schema.len(), "loaded schema");
    Ok(schema)
}

/// Finalize declarations held in memory.
pub fn load_str(source: &str, config: &SchemaConfig) -> Result<Schema, CliError> {
    let decls = SchemaFile::from_json(source)?;
    finalize_with(&decls, config).map_err(|err| CliError::Schema(err.into()))
}

/// One entity by name, or all of them.
pub fn select<'a>(schema: &'a Schema, entity: Option<&str>) -> Result<Vec<&'a Entity>, CliError> {
    match entity {
        Some(name) => schema
            .entity(name)
            .map(|e| vec![e])
            .ok_or_else(|| CliError::UnknownEntity(name.to_string())),
        None => Ok(schema.entities().values().collect()),
    }
}

/// Run one coercion function of an attribute.
///
/// JSON inputs that do not parse are taken as strings, so `hello` and
/// `"hello"` are equivalent.
pub fn coerce(
    schema: &Schema,
    entity: &str,
    attribute: &str,
    direction: Direction,
    input: Option<&str>,
) -> Result<Outcome, CliError> {
    let found = schema
        .entity(entity)
        .ok_or_else(|| CliError::UnknownEntity(entity.to_string()))?
        .attribute(attribute)
        .ok_or_else(|| CliError::UnknownAttribute {
            entity: entity.to_string(),
            attribute: attribute.to_string(),
        })?;

    let json = input.map(parse_json);
    let output = match direction {
        Direction::ClientProperty => Rendered::Value(found.set_client_property_value(json.as_ref())?),
        Direction::ClientFilter => Rendered::Value(found.set_client_query_filter_value(input)?),
        Direction::OrmProperty => {
            let value = json.as_ref().map(json_to_value).transpose()?;
            Rendered::Value(found.set_orm_property_value(value.as_ref())?)
        }
        Direction::OrmFilter => Rendered::Value(found.set_orm_query_filter_value(input)?),
        Direction::Response => {
            Rendered::Value(found.set_client_property_value_from_response(json.as_ref())?)
        }
        Direction::SerializeClient => {
            let value = canonical(json.as_ref())?;
            Rendered::Json(found.serialize_client_property_value(&value)?)
        }
        Direction::SerializeFilter => {
            let value = canonical(json.as_ref())?;
            Rendered::Token(found.serialize_client_query_filter_value(&value)?)
        }
        Direction::SerializeOrm => {
            let value = canonical(json.as_ref())?;
            Rendered::Value(found.serialize_orm_property_value(&value)?)
        }
    };

    Ok(Outcome {
        entity: entity.to_string(),
        attribute: attribute.to_string(),
        direction,
        output,
    })
}

fn parse_json(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

fn canonical(json: Option<&JsonValue>) -> Result<Value, CliError> {
    match json {
        Some(json) => json_to_value(json),
        None => Err(CliError::InvalidValue(
            "serializing requires an input value".to_string(),
        )),
    }
}

fn json_to_value(json: &JsonValue) -> Result<Value, CliError> {
    match json {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Integer(i)),
            None => n
                .as_f64()
                .map(Value::Number)
                .ok_or_else(|| CliError::InvalidValue(n.to_string())),
        },
        JsonValue::String(s) => Ok(Value::Text(s.clone())),
        other => Err(CliError::InvalidValue(format!(
            "arrays and objects are not attribute values: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormkit_schema::CoercionErrorKind;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"{
        "entities": [
            {
                "name": "Order",
                "attributes": {
                    "quantity": { "type": "integer", "required": true, "max": 1000 },
                    "note": { "type": "text" }
                }
            }
        ]
    }"#;

    fn schema() -> Schema {
        load_str(SOURCE, &SchemaConfig::default()).unwrap()
    }

    #[test]
    fn test_select() {
        let schema = schema();
        assert_eq!(select(&schema, None).unwrap().len(), 1);
        assert_eq!(select(&schema, Some("Order")).unwrap()[0].name, "Order");
        assert!(matches!(
            select(&schema, Some("Invoice")),
            Err(CliError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_coerce_directions() {
        let schema = schema();
        let outcome = coerce(&schema, "Order", "quantity", Direction::ClientProperty, Some("\"500\"")).unwrap();
        assert_eq!(outcome.output, Rendered::Value(Value::Integer(500)));

        let outcome = coerce(&schema, "Order", "quantity", Direction::OrmFilter, Some("42")).unwrap();
        assert_eq!(outcome.output, Rendered::Value(Value::Integer(42)));

        let outcome = coerce(&schema, "Order", "quantity", Direction::SerializeFilter, Some("7")).unwrap();
        assert_eq!(outcome.output, Rendered::Token("7".into()));

        let outcome = coerce(&schema, "Order", "note", Direction::ClientProperty, Some("hello")).unwrap();
        assert_eq!(outcome.output, Rendered::Value(Value::Text("hello".into())));
    }

    #[test]
    fn test_coerce_errors() {
        let schema = schema();
        match coerce(&schema, "Order", "quantity", Direction::OrmProperty, Some("1001")) {
            Err(CliError::Coercion(err)) => assert!(matches!(err.kind, CoercionErrorKind::Bound { .. })),
            other => panic!("unexpected result: {other:?}"),
        }
        match coerce(&schema, "Order", "quantity", Direction::OrmProperty, None) {
            Err(CliError::Coercion(err)) => assert_eq!(err.kind, CoercionErrorKind::Undefined),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            coerce(&schema, "Order", "total", Direction::OrmProperty, None),
            Err(CliError::UnknownAttribute { .. })
        ));
        assert!(matches!(
            coerce(&schema, "Order", "quantity", Direction::SerializeClient, None),
            Err(CliError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_load_errors() {
        let err = load_str("{", &SchemaConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Schema(ormkit_schema::Error::Declaration(_))));

        let err = load(Path::new("/nonexistent/schema.json"), &SchemaConfig::default()).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/schema.json"));
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::ClientProperty.to_string(), "client-property");
        assert_eq!(Direction::SerializeOrm.to_string(), "serialize-orm");
    }
}
