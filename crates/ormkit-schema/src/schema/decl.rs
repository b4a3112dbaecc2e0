//! Entity declarations: the assembler's input.

use crate::attribute::PartialAttribute;
use crate::relationship::PartialRelationship;
use std::collections::BTreeMap;

/// An entity as authored.
///
/// # Example
///
/// ```
/// use ormkit_schema::{integer, string, EntityDecl, PartialRelationship};
///
/// # fn main() -> Result<(), ormkit_schema::SchemaError> {
/// let user = EntityDecl::new("User")
///     .attribute("name", string().required(true).build()?)
///     .attribute("age", integer().min(0).build()?)
///     .relationship("todos", PartialRelationship::many_to_many())
///     .label("name");
/// assert_eq!(user.attributes.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDecl {
    /// Entity name.
    pub name: String,
    /// Optional namespace.
    pub namespace: Option<String>,
    /// Explicit primary identifier; one is synthesized when absent.
    pub primary_key: Option<(String, PartialAttribute)>,
    /// Attributes keyed by name.
    pub attributes: BTreeMap<String, PartialAttribute>,
    /// Relationships keyed by name.
    pub relationships: BTreeMap<String, PartialRelationship>,
    /// Attribute used as the human-readable label; defaults to the primary key.
    pub label: Option<String>,
}

impl EntityDecl {
    /// Declare an entity with no attributes or relationships.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            primary_key: None,
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            label: None,
        }
    }

    /// Set the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the primary identifier. The attribute is marked primary on finalization.
    pub fn primary_key(mut self, name: impl Into<String>, attribute: PartialAttribute) -> Self {
        self.primary_key = Some((name.into(), attribute));
        self
    }

    /// Add an attribute.
    pub fn attribute(mut self, name: impl Into<String>, attribute: PartialAttribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Add a relationship.
    pub fn relationship(mut self, name: impl Into<String>, relationship: PartialRelationship) -> Self {
        self.relationships.insert(name.into(), relationship);
        self
    }

    /// Set the label attribute.
    pub fn label(mut self, attribute: impl Into<String>) -> Self {
        self.label = Some(attribute.into());
        self
    }
}
