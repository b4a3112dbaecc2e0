//! To-one relationships whose foreign key lives on the declaring entity.

use super::{ensure_foreign_key, referenced_key, PartialLink, Relationship};
use crate::config::SchemaConfig;
use crate::error::SchemaError;
use crate::naming;
use crate::schema::EntityMap;

/// `Todo.owner` defaults to target `Owner` and key `Todo.ownerId`.
pub(super) fn resolve(
    source: &str,
    name: &str,
    link: &PartialLink,
    entities: &mut EntityMap,
    config: &SchemaConfig,
) -> Result<Relationship, SchemaError> {
    let target = link
        .target
        .clone()
        .unwrap_or_else(|| naming::target_entity_name(name));
    let reference = referenced_key(entities, source, name, &target)?;

    let foreign_key = link
        .foreign_key
        .clone()
        .unwrap_or_else(|| naming::foreign_key_name(name, &config.foreign_key_suffix));
    ensure_foreign_key(entities, source, &foreign_key, &target, &reference, false, config)?;

    Ok(Relationship::BelongsTo {
        target,
        foreign_key,
    })
}
