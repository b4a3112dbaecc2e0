//! The finalized schema graph and the assembler producing it.

mod assembler;
mod decl;
mod record;

pub use assembler::{finalize, finalize_with};
pub use decl::EntityDecl;
pub use record::{Record, RecordError};

use crate::attribute::Attribute;
use crate::relationship::Relationship;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Entities keyed by name.
pub type EntityMap = BTreeMap<String, Entity>;

/// Primary identifier of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimaryKey {
    /// One attribute (declared entities).
    Single(String),
    /// Both foreign keys of a synthesized join entity. Each is flagged
    /// primary in its control and storage facets.
    Composite(String, String),
}

impl PrimaryKey {
    /// Check if `name` is part of the key.
    pub fn contains(&self, name: &str) -> bool {
        match self {
            PrimaryKey::Single(key) => key == name,
            PrimaryKey::Composite(a, b) => a == name || b == name,
        }
    }

    /// Key attribute names, in order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            PrimaryKey::Single(key) => vec![key.as_str()],
            PrimaryKey::Composite(a, b) => vec![a.as_str(), b.as_str()],
        }
    }

    /// The key attribute, unless composite.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            PrimaryKey::Single(key) => Some(key),
            PrimaryKey::Composite(..) => None,
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Single(key) => f.write_str(key),
            PrimaryKey::Composite(a, b) => write!(f, "({a}, {b})"),
        }
    }
}

/// Where an entity came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Origin {
    /// Authored in a declaration.
    Declared,
    /// Synthesized for a many-to-many relationship between `left` and `right`.
    #[serde(rename_all = "camelCase")]
    Join {
        left: String,
        right: String,
        /// Whether the name was derived from the endpoint names rather than given.
        name_derived: bool,
    },
}

/// A finalized entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Entity name (unique within the schema).
    pub name: String,
    /// Optional namespace.
    pub namespace: Option<String>,
    /// Storage collection name.
    pub collection: String,
    /// Primary identifier.
    pub primary_key: PrimaryKey,
    /// Attributes keyed by name, including synthesized foreign keys.
    pub attributes: BTreeMap<String, Attribute>,
    /// Relationships keyed by name.
    pub relationships: BTreeMap<String, Relationship>,
    /// Attribute used as the human-readable label.
    pub label: String,
    /// Declared or synthesized.
    pub origin: Origin,
}

impl Entity {
    /// Get an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Get a relationship by name.
    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }

    /// The primary key attribute, unless the key is composite.
    pub fn primary_attribute(&self) -> Option<&Attribute> {
        self.primary_key
            .as_single()
            .and_then(|key| self.attributes.get(key))
    }

    /// Every attribute of the primary key, in key order.
    pub fn primary_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.primary_key
            .names()
            .into_iter()
            .filter_map(|key| self.attributes.get(key))
    }

    /// Attributes shown in default UI listings (not hidden).
    ///
    /// Hidden attributes remain filterable and fetchable.
    pub fn listed_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values().filter(|a| !a.is_hidden())
    }

    /// Check if this is a synthesized join entity.
    pub fn is_join(&self) -> bool {
        matches!(self.origin, Origin::Join { .. })
    }
}

/// A finalized, cross-referenced schema. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    entities: EntityMap,
}

impl Schema {
    pub(crate) fn new(entities: EntityMap) -> Self {
        Self { entities }
    }

    /// All entities, keyed by name.
    pub fn entities(&self) -> &EntityMap {
        &self.entities
    }

    /// Consume the schema, returning the entity map.
    pub fn into_entities(self) -> EntityMap {
        self.entities
    }

    /// Number of entities, synthesized ones included.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if there are no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get an entity by name.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Get an attribute of an entity.
    pub fn attribute(&self, entity: &str, attribute: &str) -> Option<&Attribute> {
        self.entity(entity)?.attribute(attribute)
    }

    /// All relationships targeting `entity`, as (source entity, name, relationship).
    pub fn relationships_to(&self, entity: &str) -> Vec<(&str, &str, &Relationship)> {
        self.entities
            .values()
            .flat_map(|source| {
                source
                    .relationships
                    .iter()
                    .filter(|(_, rel)| rel.target() == entity)
                    .map(move |(name, rel)| (source.name.as_str(), name.as_str(), rel))
            })
            .collect()
    }

    /// Synthesized join entities.
    pub fn join_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| e.is_join())
    }

    /// Join entities whose names were derived by sorting their endpoint names.
    ///
    /// Renaming an endpoint renames these; migration tooling should pin them
    /// with an explicit `through`.
    pub fn derived_join_names(&self) -> Vec<&str> {
        self.join_entities()
            .filter(|e| matches!(e.origin, Origin::Join { name_derived: true, .. }))
            .map(|e| e.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key() {
        let single = PrimaryKey::Single("id".into());
        assert!(single.contains("id"));
        assert!(!single.contains("userId"));
        assert_eq!(single.as_single(), Some("id"));
        assert_eq!(single.to_string(), "id");

        let composite = PrimaryKey::Composite("userId".into(), "todoId".into());
        assert!(composite.contains("todoId"));
        assert_eq!(composite.names(), vec!["userId", "todoId"]);
        assert_eq!(composite.as_single(), None);
        assert_eq!(composite.to_string(), "(userId, todoId)");
    }

    #[test]
    fn test_origin_serialization() {
        let origin = Origin::Join {
            left: "User".into(),
            right: "Todo".into(),
            name_derived: true,
        };
        let json = serde_json::to_value(&origin).unwrap();
        assert_eq!(json["type"], "join");
        assert_eq!(json["nameDerived"], true);
    }
}
