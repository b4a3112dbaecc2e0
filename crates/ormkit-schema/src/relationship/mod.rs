//! Relationship declarations and their resolvers.
//!
//! Each resolver is one reducer step: it takes the in-progress entity map,
//! folds a single relationship declaration into it and returns the map.
//! Entities are addressed by name only, so relationships may point at
//! entities that are declared later or at their own entity.

mod belongs_to;
mod has;
mod many_to_many;

use crate::attribute::Attribute;
use crate::config::SchemaConfig;
use crate::error::SchemaError;
use crate::schema::{EntityMap, PrimaryKey};
use serde::Serialize;
use tracing::debug;

/// Target and foreign key of a foreign-key relationship, as declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialLink {
    /// Target entity; defaults from the relationship name.
    pub target: Option<String>,
    /// Foreign key attribute name; defaults by convention.
    pub foreign_key: Option<String>,
}

/// Target, join entity and join-side keys of a many-to-many relationship, as declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialJoin {
    /// Target entity; defaults from the relationship name.
    pub target: Option<String>,
    /// Join entity; defaults to both entity names sorted and concatenated.
    pub through: Option<String>,
    /// Join attribute referencing the declaring entity.
    pub source_key: Option<String>,
    /// Join attribute referencing the target entity.
    pub target_key: Option<String>,
}

/// A relationship as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialRelationship {
    /// To-one; the declaring entity holds the foreign key.
    BelongsTo(PartialLink),
    /// To-one; the target holds the foreign key.
    HasOne(PartialLink),
    /// To-many; the target holds the foreign key.
    HasMany(PartialLink),
    /// To-many through a join entity.
    ManyToMany(PartialJoin),
}

impl PartialRelationship {
    pub fn belongs_to() -> Self {
        PartialRelationship::BelongsTo(PartialLink::default())
    }

    pub fn has_one() -> Self {
        PartialRelationship::HasOne(PartialLink::default())
    }

    pub fn has_many() -> Self {
        PartialRelationship::HasMany(PartialLink::default())
    }

    pub fn many_to_many() -> Self {
        PartialRelationship::ManyToMany(PartialJoin::default())
    }

    /// Set the target entity.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        let target = Some(target.into());
        match &mut self {
            PartialRelationship::BelongsTo(link)
            | PartialRelationship::HasOne(link)
            | PartialRelationship::HasMany(link) => link.target = target,
            PartialRelationship::ManyToMany(join) => join.target = target,
        }
        self
    }

    /// Set the foreign key name (the source-side key for many-to-many).
    pub fn foreign_key(mut self, key: impl Into<String>) -> Self {
        let key = Some(key.into());
        match &mut self {
            PartialRelationship::BelongsTo(link)
            | PartialRelationship::HasOne(link)
            | PartialRelationship::HasMany(link) => link.foreign_key = key,
            PartialRelationship::ManyToMany(join) => join.source_key = key,
        }
        self
    }

    /// Set the join entity name. Ignored by foreign-key kinds.
    pub fn through(mut self, through: impl Into<String>) -> Self {
        if let PartialRelationship::ManyToMany(join) = &mut self {
            join.through = Some(through.into());
        }
        self
    }

    /// Set the join attribute referencing the declaring entity.
    pub fn source_key(self, key: impl Into<String>) -> Self {
        self.foreign_key(key)
    }

    /// Set the join attribute referencing the target. Ignored by foreign-key kinds.
    pub fn target_key(mut self, key: impl Into<String>) -> Self {
        if let PartialRelationship::ManyToMany(join) = &mut self {
            join.target_key = Some(key.into());
        }
        self
    }

    /// Kind name, as used in declaration files.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PartialRelationship::BelongsTo(_) => "belongsTo",
            PartialRelationship::HasOne(_) => "hasOne",
            PartialRelationship::HasMany(_) => "hasMany",
            PartialRelationship::ManyToMany(_) => "manyToMany",
        }
    }
}

/// A fully resolved relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Relationship {
    /// To-one; `foreign_key` lives on the declaring entity.
    #[serde(rename_all = "camelCase")]
    BelongsTo { target: String, foreign_key: String },
    /// To-one; `foreign_key` lives on the target.
    #[serde(rename_all = "camelCase")]
    HasOne { target: String, foreign_key: String },
    /// To-many; `foreign_key` lives on the target.
    #[serde(rename_all = "camelCase")]
    HasMany { target: String, foreign_key: String },
    /// To-many through the `through` join entity.
    #[serde(rename_all = "camelCase")]
    ManyToMany {
        target: String,
        through: String,
        source_key: String,
        target_key: String,
    },
}

impl Relationship {
    /// Target entity name.
    pub fn target(&self) -> &str {
        match self {
            Relationship::BelongsTo { target, .. }
            | Relationship::HasOne { target, .. }
            | Relationship::HasMany { target, .. }
            | Relationship::ManyToMany { target, .. } => target,
        }
    }

    /// Kind name, as used in declaration files.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Relationship::BelongsTo { .. } => "belongsTo",
            Relationship::HasOne { .. } => "hasOne",
            Relationship::HasMany { .. } => "hasMany",
            Relationship::ManyToMany { .. } => "manyToMany",
        }
    }

    /// Whether the relationship is collection-valued on the declaring side.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Relationship::HasMany { .. } | Relationship::ManyToMany { .. }
        )
    }

    /// Join entity, for many-to-many relationships.
    pub fn through(&self) -> Option<&str> {
        match self {
            Relationship::ManyToMany { through, .. } => Some(through),
            _ => None,
        }
    }
}

/// Fold one relationship declaration into the entity map.
///
/// Defaults the target and key names, materializes missing foreign keys
/// (typed after the referenced primary key) and, for many-to-many, the join
/// entity. The only failure a well-formed declaration set can hit is an
/// unknown target.
pub fn resolve(
    source: &str,
    partial: &PartialRelationship,
    name: &str,
    mut entities: EntityMap,
    config: &SchemaConfig,
) -> Result<EntityMap, SchemaError> {
    let entity = entities
        .get(source)
        .ok_or_else(|| SchemaError::UnknownEntity(source.to_string()))?;
    if entity.attributes.contains_key(name) {
        return Err(SchemaError::NameCollision {
            entity: source.to_string(),
            name: name.to_string(),
            reason: "is already an attribute".into(),
        });
    }

    let relationship = match partial {
        PartialRelationship::BelongsTo(link) => {
            belongs_to::resolve(source, name, link, &mut entities, config)?
        }
        PartialRelationship::HasOne(link) => {
            has::resolve(source, name, link, has::Arity::One, &mut entities, config)?
        }
        PartialRelationship::HasMany(link) => {
            has::resolve(source, name, link, has::Arity::Many, &mut entities, config)?
        }
        PartialRelationship::ManyToMany(join) => {
            many_to_many::resolve(source, name, join, &mut entities, config)?
        }
    };

    debug!(
        entity = source,
        relationship = name,
        kind = relationship.kind_name(),
        target = relationship.target(),
        "resolved relationship"
    );
    if let Some(entity) = entities.get_mut(source) {
        entity.relationships.insert(name.to_string(), relationship);
    }
    Ok(entities)
}

/// Fail with [`SchemaError::UnknownTarget`] unless `target` is in the map.
fn require_target(
    entities: &EntityMap,
    source: &str,
    relationship: &str,
    target: &str,
) -> Result<(), SchemaError> {
    if entities.contains_key(target) {
        Ok(())
    } else {
        Err(SchemaError::UnknownTarget {
            entity: source.to_string(),
            relationship: relationship.to_string(),
            target: target.to_string(),
        })
    }
}

/// The primary key attribute of `referenced`, which foreign keys copy their type from.
fn referenced_key(
    entities: &EntityMap,
    source: &str,
    relationship: &str,
    referenced: &str,
) -> Result<Attribute, SchemaError> {
    require_target(entities, source, relationship, referenced)?;
    let entity = &entities[referenced];
    match &entity.primary_key {
        PrimaryKey::Single(key) => entity.attributes.get(key).cloned().ok_or_else(|| {
            SchemaError::invalid(key, format!("primary key of `{referenced}` is not an attribute"))
        }),
        PrimaryKey::Composite(..) => Err(SchemaError::CompositeReference {
            entity: source.to_string(),
            relationship: relationship.to_string(),
            target: referenced.to_string(),
        }),
    }
}

/// Make sure `holder.key` exists as a hidden foreign key able to hold
/// `reference` values. A pre-existing attribute is kept and marked hidden.
fn ensure_foreign_key(
    entities: &mut EntityMap,
    holder: &str,
    key: &str,
    referenced: &str,
    reference: &Attribute,
    required: bool,
    config: &SchemaConfig,
) -> Result<(), SchemaError> {
    let entity = entities
        .get_mut(holder)
        .ok_or_else(|| SchemaError::UnknownEntity(holder.to_string()))?;

    if entity.primary_key.contains(key) {
        return Err(SchemaError::NameCollision {
            entity: holder.to_string(),
            name: key.to_string(),
            reason: "is the primary key and cannot also be a foreign key".into(),
        });
    }
    if entity.relationships.contains_key(key) {
        return Err(SchemaError::NameCollision {
            entity: holder.to_string(),
            name: key.to_string(),
            reason: "is already a relationship".into(),
        });
    }

    match entity.attributes.get_mut(key) {
        Some(existing) => {
            if existing.kind() != reference.kind() {
                return Err(SchemaError::ForeignKeyMismatch {
                    entity: holder.to_string(),
                    attribute: key.to_string(),
                    target: referenced.to_string(),
                    expected: reference.kind(),
                    actual: existing.kind(),
                });
            }
            existing.mark_hidden();
        }
        None => {
            let attribute = synthesize_foreign_key(holder, key, reference, required, config)?;
            debug!(
                entity = holder,
                attribute = key,
                references = referenced,
                kind = %attribute.kind(),
                "synthesized foreign key"
            );
            entity.attributes.insert(key.to_string(), attribute);
        }
    }
    Ok(())
}

fn synthesize_foreign_key(
    holder: &str,
    key: &str,
    reference: &Attribute,
    required: bool,
    config: &SchemaConfig,
) -> Result<Attribute, SchemaError> {
    reference
        .foreign_key_partial(required)
        .finalize_with(key, config)
        .map_err(|err| err.in_declaration(holder, key))
}
