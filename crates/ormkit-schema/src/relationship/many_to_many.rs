//! To-many relationships through a join entity.

use super::{referenced_key, synthesize_foreign_key, PartialJoin, Relationship};
use crate::attribute::Attribute;
use crate::config::SchemaConfig;
use crate::error::SchemaError;
use crate::naming;
use crate::schema::{Entity, EntityMap, Origin, PrimaryKey};
use std::collections::BTreeMap;
use tracing::debug;

/// One side of a join: the key on the join entity, the endpoint it
/// references, that endpoint's primary key and the reciprocal relation name.
struct Side {
    key: String,
    endpoint: String,
    reference: Attribute,
    relation: String,
}

/// `User.todos` defaults to target `Todo`, join entity `TodoUser` and keys
/// `TodoUser.userId` / `TodoUser.todoId`.
pub(super) fn resolve(
    source: &str,
    name: &str,
    join: &PartialJoin,
    entities: &mut EntityMap,
    config: &SchemaConfig,
) -> Result<Relationship, SchemaError> {
    let suffix = &config.foreign_key_suffix;
    let target = join
        .target
        .clone()
        .unwrap_or_else(|| naming::target_entity_name(name));
    let target_reference = referenced_key(entities, source, name, &target)?;
    let source_reference = referenced_key(entities, source, name, source)?;

    let source_key = join
        .source_key
        .clone()
        .unwrap_or_else(|| naming::foreign_key_name(source, suffix));
    let target_key = join.target_key.clone().unwrap_or_else(|| {
        let key = naming::foreign_key_name(&target, suffix);
        if key == source_key {
            naming::foreign_key_name(&naming::singular(name), suffix)
        } else {
            key
        }
    });
    if source_key == target_key {
        return Err(SchemaError::NameCollision {
            entity: source.to_string(),
            name: source_key,
            reason: format!("is used for both sides of relationship `{name}`"),
        });
    }

    let (through, name_derived) = match &join.through {
        Some(through) => (through.clone(), false),
        None => (naming::join_entity_name(source, &target), true),
    };
    if through == source || through == target {
        return Err(SchemaError::NameCollision {
            entity: source.to_string(),
            name: through,
            reason: format!("cannot be both an endpoint and the join entity of `{name}`"),
        });
    }

    let source_relation = naming::camel(source);
    let target_relation = {
        let relation = naming::camel(&target);
        if relation == source_relation {
            naming::camel(target_key.strip_suffix(suffix.as_str()).unwrap_or(&target_key))
        } else {
            relation
        }
    };
    let sides = [
        Side {
            key: source_key.clone(),
            endpoint: source.to_string(),
            reference: source_reference,
            relation: source_relation,
        },
        Side {
            key: target_key.clone(),
            endpoint: target.clone(),
            reference: target_reference,
            relation: target_relation,
        },
    ];

    let namespace = shared_namespace(entities, source, &target);
    if entities.contains_key(&through) {
        reuse(entities, &through, source, &target, &sides, config)?;
    } else {
        let entity = synthesize(&through, namespace, name_derived, &sides, config)?;
        debug!(
            entity = %through,
            left = source,
            right = %target,
            name_derived,
            "synthesized join entity"
        );
        if name_derived {
            debug!(
                join = %through,
                name_derived = true,
                "join entity name derived from endpoint names; renaming either endpoint renames it"
            );
        }
        entities.insert(through.clone(), entity);
    }

    Ok(Relationship::ManyToMany {
        target,
        through,
        source_key,
        target_key,
    })
}

/// The endpoints' namespace, when both share one.
fn shared_namespace(entities: &EntityMap, left: &str, right: &str) -> Option<String> {
    let left = entities.get(left)?.namespace.as_ref()?;
    let right = entities.get(right)?.namespace.as_ref()?;
    (left == right).then(|| left.clone())
}

fn synthesize(
    through: &str,
    namespace: Option<String>,
    name_derived: bool,
    sides: &[Side; 2],
    config: &SchemaConfig,
) -> Result<Entity, SchemaError> {
    let mut attributes = BTreeMap::new();
    let mut relationships = BTreeMap::new();
    for side in sides {
        let mut attribute = synthesize_foreign_key(through, &side.key, &side.reference, true, config)?;
        attribute.mark_primary();
        attributes.insert(side.key.clone(), attribute);
        relationships.insert(side.relation.clone(), reciprocal(side));
    }

    let [left, right] = sides;
    Ok(Entity {
        name: through.to_string(),
        collection: naming::collection_name(namespace.as_deref(), through),
        namespace,
        primary_key: PrimaryKey::Composite(left.key.clone(), right.key.clone()),
        attributes,
        relationships,
        label: left.key.clone(),
        origin: Origin::Join {
            left: left.endpoint.clone(),
            right: right.endpoint.clone(),
            name_derived,
        },
    })
}

/// Complete an existing join entity without overwriting anything it has.
fn reuse(
    entities: &mut EntityMap,
    through: &str,
    source: &str,
    target: &str,
    sides: &[Side; 2],
    config: &SchemaConfig,
) -> Result<(), SchemaError> {
    let Some(entity) = entities.get_mut(through) else {
        return Err(SchemaError::UnknownEntity(through.to_string()));
    };

    if let Origin::Join { left, right, .. } = &entity.origin {
        let same_pair = (left == source && right == target) || (left == target && right == source);
        if !same_pair {
            return Err(SchemaError::JoinConflict {
                name: through.to_string(),
                left: left.clone(),
                right: right.clone(),
                requested_left: source.to_string(),
                requested_right: target.to_string(),
            });
        }
    }

    for side in sides {
        match entity.attributes.get_mut(&side.key) {
            Some(existing) => {
                if existing.kind() != side.reference.kind() {
                    return Err(SchemaError::ForeignKeyMismatch {
                        entity: through.to_string(),
                        attribute: side.key.clone(),
                        target: side.endpoint.clone(),
                        expected: side.reference.kind(),
                        actual: existing.kind(),
                    });
                }
                existing.mark_hidden();
            }
            None => {
                let attribute = synthesize_foreign_key(through, &side.key, &side.reference, true, config)?;
                entity.attributes.insert(side.key.clone(), attribute);
            }
        }
        if !entity.attributes.contains_key(&side.relation) {
            entity
                .relationships
                .entry(side.relation.clone())
                .or_insert_with(|| reciprocal(side));
        }
    }

    debug!(entity = through, left = source, right = target, "reused join entity");
    Ok(())
}

fn reciprocal(side: &Side) -> Relationship {
    Relationship::BelongsTo {
        target: side.endpoint.clone(),
        foreign_key: side.key.clone(),
    }
}
