//! Schema assembly: declarations in, finalized schema graph out.
//!
//! Runs in three phases over a map keyed by entity name:
//! 1. finalize every declared entity's attributes and primary key,
//! 2. fold every relationship declaration into the map, in sorted
//!    (entity, relationship) order so the result does not depend on
//!    declaration order,
//! 3. check label references, which may name synthesized foreign keys.

use super::{Entity, EntityDecl, EntityMap, Origin, PrimaryKey, Schema};
use crate::attribute::{uuid, Attribute};
use crate::config::SchemaConfig;
use crate::error::SchemaError;
use crate::naming;
use crate::relationship::{self, PartialRelationship};
use crate::value::Generator;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Finalize declarations with the default conventions.
pub fn finalize(decls: &[EntityDecl]) -> Result<Schema, SchemaError> {
    finalize_with(decls, &SchemaConfig::default())
}

/// Finalize declarations into a schema graph.
///
/// Declarations are read, never modified. Any schema-invalid declaration
/// aborts the whole run.
#[instrument(skip_all, fields(declared = decls.len()))]
pub fn finalize_with(decls: &[EntityDecl], config: &SchemaConfig) -> Result<Schema, SchemaError> {
    let mut entities = EntityMap::new();
    for decl in decls {
        if entities.contains_key(&decl.name) {
            return Err(SchemaError::DuplicateEntity(decl.name.clone()));
        }
        let entity = finalize_entity(decl, config)?;
        entities.insert(decl.name.clone(), entity);
    }

    let mut pending: Vec<(&str, &str, &PartialRelationship)> = decls
        .iter()
        .flat_map(|decl| {
            decl.relationships
                .iter()
                .map(move |(name, rel)| (decl.name.as_str(), name.as_str(), rel))
        })
        .collect();
    pending.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    let relationship_count = pending.len();

    let entities = pending
        .into_iter()
        .try_fold(entities, |acc, (source, name, rel)| {
            relationship::resolve(source, rel, name, acc, config)
        })?;

    for entity in entities.values() {
        if !entity.attributes.contains_key(&entity.label) {
            return Err(SchemaError::UnknownLabel {
                entity: entity.name.clone(),
                attribute: entity.label.clone(),
            });
        }
    }

    let schema = Schema::new(entities);
    info!(
        entities = schema.len(),
        relationships = relationship_count,
        joins = schema.join_entities().count(),
        derived_join_names = schema.derived_join_names().len(),
        "schema finalized"
    );
    Ok(schema)
}

fn finalize_entity(decl: &EntityDecl, config: &SchemaConfig) -> Result<Entity, SchemaError> {
    let entity = decl.name.as_str();
    let mut attributes = BTreeMap::new();
    let mut primary: Option<String> = None;

    if let Some((name, partial)) = &decl.primary_key {
        if decl.attributes.contains_key(name) {
            return Err(SchemaError::NameCollision {
                entity: entity.to_string(),
                name: name.clone(),
                reason: "is declared both as the primary key and as an attribute".into(),
            });
        }
        let attribute = partial
            .as_primary()
            .finalize_with(name, config)
            .map_err(|err| err.in_declaration(entity, name))?;
        attributes.insert(name.clone(), attribute);
        primary = Some(name.clone());
    }

    for (name, partial) in &decl.attributes {
        let attribute = partial
            .finalize_with(name, config)
            .map_err(|err| err.in_declaration(entity, name))?;
        if partial.is_primary() {
            if let Some(first) = &primary {
                return Err(SchemaError::MultiplePrimaryKeys {
                    entity: entity.to_string(),
                    first: first.clone(),
                    second: name.clone(),
                });
            }
            primary = Some(name.clone());
        }
        attributes.insert(name.clone(), attribute);
    }

    let primary = match primary {
        Some(primary) => primary,
        None => {
            let name = config.primary_key_name.clone();
            if attributes.contains_key(&name) {
                return Err(SchemaError::NameCollision {
                    entity: entity.to_string(),
                    name,
                    reason: "is reserved for the synthesized primary key; mark it primary or rename it"
                        .into(),
                });
            }
            let attribute = default_primary_key(&name, config)
                .map_err(|err| err.in_declaration(entity, &name))?;
            debug!(entity, attribute = %name, "synthesized primary key");
            attributes.insert(name.clone(), attribute);
            name
        }
    };

    Ok(Entity {
        name: decl.name.clone(),
        namespace: decl.namespace.clone(),
        collection: naming::collection_name(decl.namespace.as_deref(), &decl.name),
        label: decl.label.clone().unwrap_or_else(|| primary.clone()),
        primary_key: PrimaryKey::Single(primary),
        attributes,
        relationships: BTreeMap::new(),
        origin: Origin::Declared,
    })
}

/// Random identifier assigned on insert and never reassigned.
fn default_primary_key(name: &str, config: &SchemaConfig) -> Result<Attribute, SchemaError> {
    uuid()
        .primary(true)
        .required(true)
        .read_only(true)
        .default_with(Generator::uuid_v4())
        .build()?
        .finalize_with(name, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{integer, string, AttributeKind};
    use crate::relationship::Relationship;

    #[test]
    fn test_synthesized_primary_key() {
        let schema = finalize(&[EntityDecl::new("User")]).unwrap();
        let user = schema.entity("User").unwrap();
        assert_eq!(user.primary_key, PrimaryKey::Single("id".into()));
        assert_eq!(user.label, "id");
        assert_eq!(user.collection, "users");

        let id = user.primary_attribute().unwrap();
        assert_eq!(id.kind(), AttributeKind::Uuid);
        assert!(id.is_primary());
        assert!(id.is_required());
        assert!(id.control().read_only);
        assert_eq!(id.control().default.resolve().type_name(), "uuid");
    }

    #[test]
    fn test_explicit_primary_key_is_forced_primary() {
        let decl = EntityDecl::new("Country").primary_key("code", string().max_length(2).build().unwrap());
        let schema = finalize(&[decl]).unwrap();
        let country = schema.entity("Country").unwrap();
        assert_eq!(country.primary_key, PrimaryKey::Single("code".into()));
        assert!(country.attribute("code").unwrap().is_primary());
        assert!(country.attribute("id").is_none());
    }

    #[test]
    fn test_primary_flag_on_attribute() {
        let decl = EntityDecl::new("Ticket").attribute("number", integer().primary(true).build().unwrap());
        let schema = finalize(&[decl]).unwrap();
        assert_eq!(
            schema.entity("Ticket").unwrap().primary_key,
            PrimaryKey::Single("number".into())
        );
    }

    #[test]
    fn test_multiple_primary_keys() {
        let decl = EntityDecl::new("Pair")
            .attribute("a", integer().primary(true).build().unwrap())
            .attribute("b", integer().primary(true).build().unwrap());
        assert_eq!(
            finalize(&[decl]).unwrap_err(),
            SchemaError::MultiplePrimaryKeys {
                entity: "Pair".into(),
                first: "a".into(),
                second: "b".into(),
            }
        );
    }

    #[test]
    fn test_reserved_primary_key_name() {
        let decl = EntityDecl::new("Legacy").attribute("id", integer().build().unwrap());
        assert!(matches!(
            finalize(&[decl]).unwrap_err(),
            SchemaError::NameCollision { .. }
        ));

        let config = SchemaConfig::new().with_primary_key_name("uid");
        let decl = EntityDecl::new("Legacy").attribute("id", integer().build().unwrap());
        let schema = finalize_with(&[decl], &config).unwrap();
        assert_eq!(
            schema.entity("Legacy").unwrap().primary_key,
            PrimaryKey::Single("uid".into())
        );
    }

    #[test]
    fn test_duplicate_entity() {
        let err = finalize(&[EntityDecl::new("User"), EntityDecl::new("User")]).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateEntity("User".into()));
    }

    #[test]
    fn test_unknown_label() {
        let decl = EntityDecl::new("User").label("name");
        assert_eq!(
            finalize(&[decl]).unwrap_err(),
            SchemaError::UnknownLabel {
                entity: "User".into(),
                attribute: "name".into(),
            }
        );
    }

    #[test]
    fn test_label_may_name_synthesized_foreign_key() {
        let decls = [
            EntityDecl::new("User"),
            EntityDecl::new("Todo")
                .relationship("owner", PartialRelationship::belongs_to().target("User"))
                .label("ownerId"),
        ];
        let schema = finalize(&decls).unwrap();
        assert_eq!(schema.entity("Todo").unwrap().label, "ownerId");
    }

    #[test]
    fn test_attribute_errors_carry_declaration_context() {
        let mut partial = integer().build().unwrap();
        partial.control.constraints = crate::attribute::PartialConstraints::Enum { values: vec![] };
        let decl = EntityDecl::new("User").attribute("role", partial);
        let err = finalize(&[decl]).unwrap_err();
        assert!(matches!(err, SchemaError::InDeclaration { .. }));
        let message = err.to_string();
        assert!(message.contains("User"));
        assert!(message.contains("role"));
    }

    #[test]
    fn test_relationship_name_collides_with_attribute() {
        let decls = [
            EntityDecl::new("User"),
            EntityDecl::new("Todo")
                .attribute("owner", string().build().unwrap())
                .relationship("owner", PartialRelationship::belongs_to().target("User")),
        ];
        assert!(matches!(
            finalize(&decls).unwrap_err(),
            SchemaError::NameCollision { .. }
        ));
    }

    #[test]
    fn test_has_many_places_key_on_target() {
        let decls = [
            EntityDecl::new("User").relationship("todos", PartialRelationship::has_many()),
            EntityDecl::new("Todo"),
        ];
        let schema = finalize(&decls).unwrap();
        assert_eq!(
            schema.entity("User").unwrap().relationship("todos"),
            Some(&Relationship::HasMany {
                target: "Todo".into(),
                foreign_key: "userId".into(),
            })
        );
        let key = schema.attribute("Todo", "userId").unwrap();
        assert!(key.is_hidden());
        assert!(!key.is_required());
        assert_eq!(key.kind(), AttributeKind::Uuid);
    }
}
