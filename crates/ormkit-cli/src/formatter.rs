//! Output formatters for schemas and coercion results.

use crate::commands::{Outcome, Rendered};
use clap::ValueEnum;
use comfy_table::{Cell, Table};
use ormkit_schema::{Attribute, DefaultValue, Entity, Relationship, Schema};
use serde_json::json;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a one-line-per-entity schema summary.
    fn format_summary(&self, schema: &Schema) -> String;

    /// Format full entity descriptions.
    fn format_entities(&self, entities: &[&Entity]) -> String;

    /// Format the result of a coercion call.
    fn format_outcome(&self, outcome: &Outcome) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_summary(&self, schema: &Schema) -> String {
        let mut table = Table::new();
        table.set_header(vec![
            "Entity",
            "Collection",
            "Primary Key",
            "Attributes",
            "Relationships",
            "Origin",
        ]);

        for entity in schema.entities().values() {
            table.add_row(vec![
                Cell::new(&entity.name),
                Cell::new(&entity.collection),
                Cell::new(entity.primary_key.to_string()),
                Cell::new(entity.attributes.len()),
                Cell::new(entity.relationships.len()),
                Cell::new(if entity.is_join() { "join" } else { "declared" }),
            ]);
        }

        let mut output = format!("{}\n{} entit(ies)", table, schema.len());
        let derived = schema.derived_join_names();
        if !derived.is_empty() {
            output.push_str(&format!(
                "\nJoin entities named after their endpoints: {}",
                derived.join(", ")
            ));
        }
        output
    }

    fn format_entities(&self, entities: &[&Entity]) -> String {
        entities
            .iter()
            .map(|entity| format_entity_as_table(entity))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn format_outcome(&self, outcome: &Outcome) -> String {
        let (kind, rendered) = match &outcome.output {
            Rendered::Value(value) => (value.type_name().to_string(), value.to_string()),
            Rendered::Json(json) => ("json".to_string(), json.to_string()),
            Rendered::Token(token) => ("token".to_string(), token.clone()),
        };
        format!(
            "{}.{} ({}): {} [{}]",
            outcome.entity, outcome.attribute, outcome.direction, rendered, kind
        )
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_summary(&self, schema: &Schema) -> String {
        let entities: Vec<_> = schema
            .entities()
            .values()
            .map(|entity| {
                json!({
                    "name": entity.name,
                    "collection": entity.collection,
                    "primaryKey": entity.primary_key.names(),
                    "attributes": entity.attributes.len(),
                    "relationships": entity.relationships.len(),
                    "join": entity.is_join(),
                })
            })
            .collect();
        let summary = json!({
            "entities": entities,
            "derivedJoinNames": schema.derived_join_names(),
        });
        serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_entities(&self, entities: &[&Entity]) -> String {
        serde_json::to_string_pretty(entities).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_outcome(&self, outcome: &Outcome) -> String {
        let output = match &outcome.output {
            Rendered::Value(value) => serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
            Rendered::Json(json) => json.clone(),
            Rendered::Token(token) => serde_json::Value::String(token.clone()),
        };
        json!({
            "entity": outcome.entity,
            "attribute": outcome.attribute,
            "direction": outcome.direction.to_string(),
            "output": output,
        })
        .to_string()
    }

    fn format_error(&self, error: &str) -> String {
        json!({
            "error": error
        })
        .to_string()
    }
}

/// Format an entity as an attribute table followed by a relationship table.
fn format_entity_as_table(entity: &Entity) -> String {
    let mut attributes = Table::new();
    attributes.set_header(vec![
        "Attribute", "Type", "Column", "Engine", "Required", "Flags", "Default",
    ]);
    for attribute in entity.attributes.values() {
        attributes.add_row(vec![
            Cell::new(attribute.name()),
            Cell::new(attribute.label()),
            Cell::new(&attribute.storage().column),
            Cell::new(attribute.storage().engine_type.to_string()),
            Cell::new(if attribute.is_required() { "yes" } else { "no" }),
            Cell::new(format_flags(attribute)),
            Cell::new(format_default(&attribute.control().default)),
        ]);
    }

    let mut output = format!(
        "{} ({}, key {}, label {})\n{}",
        entity.name, entity.collection, entity.primary_key, entity.label, attributes
    );

    if !entity.relationships.is_empty() {
        let mut relationships = Table::new();
        relationships.set_header(vec!["Relationship", "Kind", "Target", "Keys"]);
        for (name, relationship) in &entity.relationships {
            relationships.add_row(vec![
                Cell::new(name),
                Cell::new(relationship.kind_name()),
                Cell::new(relationship.target()),
                Cell::new(format_keys(relationship)),
            ]);
        }
        output.push('\n');
        output.push_str(&relationships.to_string());
    }

    output
}

fn format_flags(attribute: &Attribute) -> String {
    let control = attribute.control();
    let flags: Vec<&str> = [
        (control.primary, "primary"),
        (control.unique, "unique"),
        (control.read_only, "read-only"),
        (control.hidden, "hidden"),
        (!control.case_sensitive, "case-insensitive"),
    ]
    .into_iter()
    .filter_map(|(set, flag)| set.then_some(flag))
    .collect();
    flags.join(", ")
}

fn format_default(default: &DefaultValue) -> String {
    match default {
        DefaultValue::Null => String::new(),
        DefaultValue::Value(value) => value.to_string(),
        DefaultValue::Generator(generator) => format!("{}()", generator.name()),
    }
}

fn format_keys(relationship: &Relationship) -> String {
    match relationship {
        Relationship::BelongsTo { foreign_key, .. }
        | Relationship::HasOne { foreign_key, .. }
        | Relationship::HasMany { foreign_key, .. } => foreign_key.clone(),
        Relationship::ManyToMany {
            through,
            source_key,
            target_key,
            ..
        } => format!("{through}({source_key}, {target_key})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{load_str, Direction};
    use ormkit_schema::{SchemaConfig, Value};
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        let source = r#"{ "entities": [
            { "name": "User", "relationships": { "todos": { "kind": "manyToMany" } } },
            { "name": "Todo", "attributes": { "title": { "type": "string", "required": true } } }
        ] }"#;
        load_str(source, &SchemaConfig::default()).unwrap()
    }

    #[test]
    fn test_table_summary() {
        let output = TableFormatter.format_summary(&schema());
        assert!(output.contains("TodoUser"));
        assert!(output.contains("(userId, todoId)"));
        assert!(output.contains("3 entit(ies)"));
        assert!(output.contains("Join entities named after their endpoints: TodoUser"));
    }

    #[test]
    fn test_table_entity() {
        let schema = schema();
        let output = TableFormatter.format_entities(&[schema.entity("User").unwrap()]);
        assert!(output.contains("uuid()"));
        assert!(output.contains("primary, read-only"));
        assert!(output.contains("TodoUser(userId, todoId)"));
    }

    #[test]
    fn test_json_summary() {
        let output = JsonFormatter.format_summary(&schema());
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["entities"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["derivedJoinNames"], json!(["TodoUser"]));
    }

    #[test]
    fn test_format_outcome() {
        let outcome = Outcome {
            entity: "Todo".into(),
            attribute: "title".into(),
            direction: Direction::ClientProperty,
            output: Rendered::Value(Value::Text("milk".into())),
        };
        assert_eq!(
            TableFormatter.format_outcome(&outcome),
            "Todo.title (client-property): milk [text]"
        );
        assert_eq!(
            JsonFormatter.format_outcome(&outcome),
            r#"{"attribute":"title","direction":"client-property","entity":"Todo","output":"milk"}"#
        );
    }

    #[test]
    fn test_format_error() {
        assert_eq!(TableFormatter.format_error("boom"), "Error: boom");
        assert_eq!(JsonFormatter.format_error("boom"), r#"{"error":"boom"}"#);
    }
}
