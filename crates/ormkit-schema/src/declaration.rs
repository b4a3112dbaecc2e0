//! JSON declaration files.
//!
//! ```json
//! {
//!   "entities": [
//!     {
//!       "name": "User",
//!       "attributes": {
//!         "email": { "type": "string", "required": true, "unique": true, "maxLength": 320 },
//!         "age": { "type": "integer", "min": 0, "max": 150 },
//!         "createdAt": { "type": "dateTime", "readOnly": true, "default": { "generate": "now" } }
//!       },
//!       "relationships": {
//!         "todos": { "kind": "manyToMany" },
//!         "manager": { "kind": "belongsTo", "target": "User" }
//!       },
//!       "label": "email"
//!     }
//!   ]
//! }
//! ```
//!
//! Literal defaults are decoded through the attribute's own client coercion,
//! so `"default": "2024-01-01"` on a date attribute becomes a date.

use crate::attribute::{
    boolean, date, date_time, enumeration, integer, number, string, text, uuid, AttributeBuilder,
    CoercionContract, PartialAttribute, RangeKind, StringKind,
};
use crate::error::{Error, SchemaError};
use crate::relationship::{PartialJoin, PartialLink, PartialRelationship};
use crate::schema::EntityDecl;
use crate::value::{DefaultValue, Generator};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tracing::debug;

/// A parsed declaration file.
#[derive(Debug, Deserialize)]
pub struct SchemaFile {
    entities: Vec<EntityFile>,
}

impl SchemaFile {
    /// Parse a declaration file.
    pub fn parse(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Parse a declaration file and build its entity declarations.
    pub fn from_json(source: &str) -> Result<Vec<EntityDecl>, Error> {
        Ok(Self::parse(source)?.into_decls()?)
    }

    /// Number of declared entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the file declares no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Build entity declarations, running every attribute builder.
    pub fn into_decls(self) -> Result<Vec<EntityDecl>, SchemaError> {
        let decls = self
            .entities
            .into_iter()
            .map(EntityFile::into_decl)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(entities = decls.len(), "loaded declaration file");
        Ok(decls)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityFile {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    primary_key: Option<PrimaryKeyFile>,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeFile>,
    #[serde(default)]
    relationships: BTreeMap<String, RelationshipFile>,
    #[serde(default)]
    label: Option<String>,
}

impl EntityFile {
    fn into_decl(self) -> Result<EntityDecl, SchemaError> {
        let mut decl = EntityDecl::new(self.name.clone());
        decl.namespace = self.namespace;
        decl.label = self.label;

        if let Some(pk) = self.primary_key {
            let attribute = pk
                .attribute
                .into_partial(&pk.name)
                .map_err(|err| err.in_declaration(&self.name, &pk.name))?;
            decl = decl.primary_key(pk.name, attribute);
        }
        for (name, file) in self.attributes {
            let attribute = file
                .into_partial(&name)
                .map_err(|err| err.in_declaration(&self.name, &name))?;
            decl = decl.attribute(name, attribute);
        }
        for (name, file) in self.relationships {
            decl = decl.relationship(name, file.into());
        }
        Ok(decl)
    }
}

#[derive(Debug, Deserialize)]
struct PrimaryKeyFile {
    name: String,
    attribute: AttributeFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommonFile {
    required: Option<bool>,
    primary: Option<bool>,
    unique: Option<bool>,
    read_only: Option<bool>,
    hidden: Option<bool>,
    default: Option<DefaultFile>,
    display_name: Option<String>,
    max_display_length: Option<usize>,
    case_sensitive: Option<bool>,
    column: Option<String>,
}

impl CommonFile {
    fn apply<K>(&self, mut builder: AttributeBuilder<K>) -> AttributeBuilder<K> {
        if let Some(required) = self.required {
            builder = builder.required(required);
        }
        if let Some(primary) = self.primary {
            builder = builder.primary(primary);
        }
        if let Some(unique) = self.unique {
            builder = builder.unique(unique);
        }
        if let Some(read_only) = self.read_only {
            builder = builder.read_only(read_only);
        }
        if let Some(hidden) = self.hidden {
            builder = builder.hidden(hidden);
        }
        if let Some(name) = &self.display_name {
            builder = builder.display_name(name.clone());
        }
        if let Some(length) = self.max_display_length {
            builder = builder.max_display_length(length);
        }
        if let Some(case_sensitive) = self.case_sensitive {
            builder = builder.case_sensitive(case_sensitive);
        }
        if let Some(column) = &self.column {
            builder = builder.column(column.clone());
        }
        builder
    }

    /// Build, then attach the default decoded through the attribute's own coercion.
    fn finish<K>(&self, builder: AttributeBuilder<K>, name: &str) -> Result<PartialAttribute, SchemaError> {
        let mut partial = self.apply(builder).build()?;
        let default = match &self.default {
            None | Some(DefaultFile::Literal(JsonValue::Null)) => return Ok(partial),
            Some(DefaultFile::Generate { generate }) => Generator::builtin(generate)
                .map(DefaultValue::Generator)
                .ok_or_else(|| SchemaError::invalid(&partial.label, format!("unknown generator `{generate}`")))?,
            Some(DefaultFile::Literal(literal)) => {
                let probe = partial.finalize(name)?;
                let value = probe
                    .set_client_property_value(Some(literal))
                    .map_err(|err| SchemaError::invalid(&partial.label, format!("default value rejected: {err}")))?;
                DefaultValue::from(value)
            }
        };
        partial.control.default = Some(default);
        Ok(partial)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefaultFile {
    Generate { generate: String },
    Literal(JsonValue),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LengthFile {
    Fixed(usize),
    Named(String),
}

impl LengthFile {
    /// `None` for an infinite length.
    fn fixed(&self, label: &str) -> Result<Option<usize>, SchemaError> {
        match self {
            LengthFile::Fixed(n) => Ok(Some(*n)),
            LengthFile::Named(name) if name == "infinite" || name == "unbounded" => Ok(None),
            LengthFile::Named(name) => Err(SchemaError::invalid(
                label,
                format!("length must be a number or \"infinite\", got `{name}`"),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StringFile {
    #[serde(flatten)]
    common: CommonFile,
    min_length: Option<usize>,
    max_length: Option<LengthFile>,
    pattern: Option<String>,
    storage_length: Option<LengthFile>,
}

impl StringFile {
    fn apply<K: StringKind>(&self, label: &str, mut builder: AttributeBuilder<K>) -> Result<AttributeBuilder<K>, SchemaError> {
        if let Some(min) = self.min_length {
            builder = builder.min_length(min);
        }
        if let Some(max) = &self.max_length {
            builder = match max.fixed(label)? {
                Some(n) => builder.max_length(n),
                None => builder.unbounded(),
            };
        }
        if let Some(pattern) = &self.pattern {
            builder = builder.pattern(pattern);
        }
        Ok(builder)
    }
}

#[derive(Debug, Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "T: Deserialize<'de>, S: Deserialize<'de>")
)]
struct RangeFile<T, S = T> {
    #[serde(flatten)]
    common: CommonFile,
    min: Option<T>,
    max: Option<T>,
    step: Option<S>,
}

impl<T, S> RangeFile<T, S> {
    fn apply<K>(self, mut builder: AttributeBuilder<K>) -> (CommonFile, AttributeBuilder<K>)
    where
        K: RangeKind<Item = T, Step = S>,
    {
        if let Some(min) = self.min {
            builder = builder.min(min);
        }
        if let Some(max) = self.max {
            builder = builder.max(max);
        }
        if let Some(step) = self.step {
            builder = builder.step(step);
        }
        (self.common, builder)
    }
}

#[derive(Debug, Deserialize)]
struct EnumFile {
    #[serde(flatten)]
    common: CommonFile,
    values: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum AttributeFile {
    Text(StringFile),
    String(StringFile),
    Integer(RangeFile<i64>),
    Number(RangeFile<f64>),
    Boolean(CommonFile),
    Date(RangeFile<NaiveDate, i64>),
    DateTime(RangeFile<DateTime<Utc>, i64>),
    Enum(EnumFile),
    Uuid(CommonFile),
}

impl AttributeFile {
    fn into_partial(self, name: &str) -> Result<PartialAttribute, SchemaError> {
        match self {
            AttributeFile::Text(file) => {
                if file.storage_length.is_some() {
                    return Err(SchemaError::invalid("text", "storage length applies to string attributes only"));
                }
                let builder = file.apply("text", text())?;
                file.common.finish(builder, name)
            }
            AttributeFile::String(file) => {
                let mut builder = file.apply("string", string())?;
                if let Some(length) = &file.storage_length {
                    if let Some(n) = length.fixed("string")? {
                        builder = builder.storage_length(n);
                    }
                }
                file.common.finish(builder, name)
            }
            AttributeFile::Integer(file) => {
                let (common, builder) = file.apply(integer());
                common.finish(builder, name)
            }
            AttributeFile::Number(file) => {
                let (common, builder) = file.apply(number());
                common.finish(builder, name)
            }
            AttributeFile::Boolean(common) => common.finish(boolean(), name),
            AttributeFile::Date(file) => {
                let (common, builder) = file.apply(date());
                common.finish(builder, name)
            }
            AttributeFile::DateTime(file) => {
                let (common, builder) = file.apply(date_time());
                common.finish(builder, name)
            }
            AttributeFile::Enum(file) => file.common.finish(enumeration(file.values.clone()), name),
            AttributeFile::Uuid(common) => common.finish(uuid(), name),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkFile {
    target: Option<String>,
    foreign_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinFile {
    target: Option<String>,
    through: Option<String>,
    source_key: Option<String>,
    target_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum RelationshipFile {
    BelongsTo(LinkFile),
    HasOne(LinkFile),
    HasMany(LinkFile),
    ManyToMany(JoinFile),
}

impl From<LinkFile> for PartialLink {
    fn from(file: LinkFile) -> Self {
        PartialLink {
            target: file.target,
            foreign_key: file.foreign_key,
        }
    }
}

impl From<RelationshipFile> for PartialRelationship {
    fn from(file: RelationshipFile) -> Self {
        match file {
            RelationshipFile::BelongsTo(link) => PartialRelationship::BelongsTo(link.into()),
            RelationshipFile::HasOne(link) => PartialRelationship::HasOne(link.into()),
            RelationshipFile::HasMany(link) => PartialRelationship::HasMany(link.into()),
            RelationshipFile::ManyToMany(join) => PartialRelationship::ManyToMany(PartialJoin {
                target: join.target,
                through: join.through,
                source_key: join.source_key,
                target_key: join.target_key,
            }),
        }
    }
}
