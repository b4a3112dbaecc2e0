//! To-one and to-many relationships whose foreign key lives on the target.

use super::{ensure_foreign_key, referenced_key, require_target, PartialLink, Relationship};
use crate::config::SchemaConfig;
use crate::error::SchemaError;
use crate::naming;
use crate::schema::EntityMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Arity {
    One,
    Many,
}

/// `User.todos` defaults to target `Todo` and key `Todo.userId`.
pub(super) fn resolve(
    source: &str,
    name: &str,
    link: &PartialLink,
    arity: Arity,
    entities: &mut EntityMap,
    config: &SchemaConfig,
) -> Result<Relationship, SchemaError> {
    let target = link
        .target
        .clone()
        .unwrap_or_else(|| naming::target_entity_name(name));
    require_target(entities, source, name, &target)?;
    let reference = referenced_key(entities, source, name, source)?;

    let foreign_key = link
        .foreign_key
        .clone()
        .unwrap_or_else(|| naming::foreign_key_name(source, &config.foreign_key_suffix));
    ensure_foreign_key(entities, &target, &foreign_key, source, &reference, false, config)?;

    Ok(match arity {
        Arity::One => Relationship::HasOne {
            target,
            foreign_key,
        },
        Arity::Many => Relationship::HasMany {
            target,
            foreign_key,
        },
    })
}
