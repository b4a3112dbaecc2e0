//! Control and storage facets, in partial and final form.
//!
//! The control facet carries client-facing constraints and UI hints; the
//! storage facet carries the engine column mapping. Partial facets are what
//! builders produce; final facets have every optional field resolved.

use crate::config::SchemaConfig;
use crate::naming;
use crate::value::DefaultValue;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Bound;

/// Attribute primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeKind {
    /// Unbounded text.
    Text,
    /// Fixed-length string.
    String,
    /// Integer.
    Integer,
    /// Floating point number.
    Number,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Date and time.
    DateTime,
    /// Enumerated string.
    Enum,
    /// Unique identifier.
    Uuid,
}

impl AttributeKind {
    /// Lowercase kind name, also used as the debug label of built attributes.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::Text => "text",
            AttributeKind::String => "string",
            AttributeKind::Integer => "integer",
            AttributeKind::Number => "number",
            AttributeKind::Boolean => "boolean",
            AttributeKind::Date => "date",
            AttributeKind::DateTime => "dateTime",
            AttributeKind::Enum => "enum",
            AttributeKind::Uuid => "uuid",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested string length before finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// No limit ("infinite").
    Unbounded,
    /// At most this many characters.
    Fixed(usize),
}

/// Compiled regular expression compared by its source.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compile a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Pattern)
    }

    /// Pattern source.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Check a value against the pattern.
    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Range constraints as declared.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialRange<T, S = T> {
    /// Inclusive minimum.
    pub min: Option<T>,
    /// Inclusive maximum.
    pub max: Option<T>,
    /// Step, counted from the minimum when one is set.
    pub step: Option<S>,
}

impl<T, S> Default for PartialRange<T, S> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            step: None,
        }
    }
}

impl<T: Clone, S: Clone> PartialRange<T, S> {
    /// Unspecified bounds become unbounded; unspecified step means no step.
    pub fn finalize(&self) -> Range<T, S> {
        Range {
            min: self.min.clone().map_or(Bound::Unbounded, Bound::Included),
            max: self.max.clone().map_or(Bound::Unbounded, Bound::Included),
            step: self.step.clone(),
        }
    }
}

/// Resolved range constraints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Range<T, S = T> {
    /// Lower bound.
    pub min: Bound<T>,
    /// Upper bound.
    pub max: Bound<T>,
    /// Step, if constrained.
    pub step: Option<S>,
}

impl<T: Clone, S: Clone> Range<T, S> {
    /// The value steps are counted from, when a minimum is present.
    pub fn anchor(&self) -> Option<&T> {
        match &self.min {
            Bound::Included(min) | Bound::Excluded(min) => Some(min),
            Bound::Unbounded => None,
        }
    }

    pub(crate) fn to_partial(&self) -> PartialRange<T, S> {
        PartialRange {
            min: bound_value(&self.min),
            max: bound_value(&self.max),
            step: self.step.clone(),
        }
    }
}

fn bound_value<T: Clone>(bound: &Bound<T>) -> Option<T> {
    match bound {
        Bound::Included(v) | Bound::Excluded(v) => Some(v.clone()),
        Bound::Unbounded => None,
    }
}

/// String constraints as declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialStringConstraints {
    /// Minimum length in characters.
    pub min_length: Option<usize>,
    /// Maximum length in characters.
    pub max_length: Option<Length>,
    /// Pattern values must match.
    pub pattern: Option<Pattern>,
}

impl PartialStringConstraints {
    /// Unspecified minimum is zero; unspecified or infinite maximum is unbounded.
    pub fn finalize(&self) -> StringConstraints {
        StringConstraints {
            min_length: self.min_length.unwrap_or(0),
            max_length: match self.max_length {
                Some(Length::Fixed(n)) => Bound::Included(n),
                Some(Length::Unbounded) | None => Bound::Unbounded,
            },
            pattern: self.pattern.clone(),
        }
    }
}

/// Resolved string constraints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StringConstraints {
    /// Minimum length in characters.
    pub min_length: usize,
    /// Maximum length in characters.
    pub max_length: Bound<usize>,
    /// Pattern the value must match.
    pub pattern: Option<Pattern>,
}

impl StringConstraints {
    pub(crate) fn to_partial(&self) -> PartialStringConstraints {
        PartialStringConstraints {
            min_length: Some(self.min_length),
            max_length: Some(match self.max_length {
                Bound::Included(n) | Bound::Excluded(n) => Length::Fixed(n),
                Bound::Unbounded => Length::Unbounded,
            }),
            pattern: self.pattern.clone(),
        }
    }
}

/// Type-specific constraints as declared.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialConstraints {
    /// Unbounded text.
    Text(PartialStringConstraints),
    /// Fixed-length string.
    String(PartialStringConstraints),
    /// Integer range; step is an integer.
    Integer(PartialRange<i64>),
    /// Number range; step is a number.
    Number(PartialRange<f64>),
    /// Booleans carry no constraints.
    Boolean,
    /// Date range; step in days.
    Date(PartialRange<NaiveDate, i64>),
    /// Date-time range; step in seconds.
    DateTime(PartialRange<DateTime<Utc>, i64>),
    /// Allowed values.
    Enum {
        /// Allowed values in declaration order.
        values: Vec<String>,
    },
    /// Identifiers carry no constraints.
    Uuid,
}

impl PartialConstraints {
    /// The attribute kind these constraints belong to.
    pub fn kind(&self) -> AttributeKind {
        match self {
            PartialConstraints::Text(_) => AttributeKind::Text,
            PartialConstraints::String(_) => AttributeKind::String,
            PartialConstraints::Integer(_) => AttributeKind::Integer,
            PartialConstraints::Number(_) => AttributeKind::Number,
            PartialConstraints::Boolean => AttributeKind::Boolean,
            PartialConstraints::Date(_) => AttributeKind::Date,
            PartialConstraints::DateTime(_) => AttributeKind::DateTime,
            PartialConstraints::Enum { .. } => AttributeKind::Enum,
            PartialConstraints::Uuid => AttributeKind::Uuid,
        }
    }
}

/// Resolved type-specific constraints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Constraints {
    /// Unbounded text.
    Text(StringConstraints),
    /// Fixed-length string.
    String(StringConstraints),
    /// Integer range.
    Integer(Range<i64>),
    /// Number range.
    Number(Range<f64>),
    /// No constraints.
    Boolean,
    /// Date range, step in days.
    Date(Range<NaiveDate, i64>),
    /// Date-time range, step in seconds.
    DateTime(Range<DateTime<Utc>, i64>),
    /// Allowed values.
    Enum {
        /// Allowed values in declaration order.
        values: Vec<String>,
    },
    /// No constraints.
    Uuid,
}

impl Constraints {
    /// The attribute kind these constraints belong to.
    pub fn kind(&self) -> AttributeKind {
        self.to_partial().kind()
    }

    /// Convert back into declarable constraints.
    pub fn to_partial(&self) -> PartialConstraints {
        match self {
            Constraints::Text(c) => PartialConstraints::Text(c.to_partial()),
            Constraints::String(c) => PartialConstraints::String(c.to_partial()),
            Constraints::Integer(r) => PartialConstraints::Integer(r.to_partial()),
            Constraints::Number(r) => PartialConstraints::Number(r.to_partial()),
            Constraints::Boolean => PartialConstraints::Boolean,
            Constraints::Date(r) => PartialConstraints::Date(r.to_partial()),
            Constraints::DateTime(r) => PartialConstraints::DateTime(r.to_partial()),
            Constraints::Enum { values } => PartialConstraints::Enum {
                values: values.clone(),
            },
            Constraints::Uuid => PartialConstraints::Uuid,
        }
    }
}

/// Client-facing constraints and UI hints as declared.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialControl {
    /// Whether a value is required (non-nullable).
    pub required: Option<bool>,
    /// Whether this is the primary identifier.
    pub primary: Option<bool>,
    /// Whether values must be unique.
    pub unique: Option<bool>,
    /// Whether the storage-write path rejects assignments.
    pub read_only: Option<bool>,
    /// Whether the attribute is left out of default UI listings.
    pub hidden: Option<bool>,
    /// Default value or producer.
    pub default: Option<DefaultValue>,
    /// Human-readable name.
    pub display_name: Option<String>,
    /// Truncation length for display.
    pub max_display_length: Option<usize>,
    /// Whether comparisons are case-sensitive.
    pub case_sensitive: Option<bool>,
    /// Type-specific constraints.
    pub constraints: PartialConstraints,
}

impl PartialControl {
    /// A control facet with only constraints set.
    pub fn new(constraints: PartialConstraints) -> Self {
        Self {
            required: None,
            primary: None,
            unique: None,
            read_only: None,
            hidden: None,
            default: None,
            display_name: None,
            max_display_length: None,
            case_sensitive: None,
            constraints,
        }
    }

    /// Resolve the fields shared by every kind.
    pub(crate) fn finalize_common(
        &self,
        name: &str,
        constraints: Constraints,
        display_length: Option<usize>,
    ) -> Control {
        let primary = self.primary.unwrap_or(false);
        Control {
            nullable: resolve_nullable(self.required, primary),
            primary,
            unique: self.unique.unwrap_or(false),
            read_only: self.read_only.unwrap_or(false),
            hidden: self.hidden.unwrap_or(false),
            default: DefaultValue::normalized(self.default.as_ref()),
            display_name: self
                .display_name
                .clone()
                .unwrap_or_else(|| naming::title(name)),
            max_display_length: self.max_display_length.or(display_length),
            case_sensitive: self.case_sensitive.unwrap_or(true),
            constraints,
        }
    }
}

/// Resolved client-facing facet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    /// Whether null is accepted.
    pub nullable: bool,
    /// Whether this is the primary identifier.
    pub primary: bool,
    /// Whether values must be unique.
    pub unique: bool,
    /// Whether the storage-write path rejects assignments.
    pub read_only: bool,
    /// Whether the attribute is left out of default UI listings.
    pub hidden: bool,
    /// Default value or producer.
    pub default: DefaultValue,
    /// Human-readable name.
    pub display_name: String,
    /// Truncation length for display; `None` means no truncation.
    pub max_display_length: Option<usize>,
    /// Whether comparisons are case-sensitive.
    pub case_sensitive: bool,
    /// Type-specific constraints.
    pub constraints: Constraints,
}

impl Control {
    /// Whether a value is required.
    pub fn is_required(&self) -> bool {
        !self.nullable
    }
}

/// Engine column types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum EngineType {
    /// Unbounded text.
    Text,
    /// Bounded string.
    VarChar {
        /// Maximum length.
        length: usize,
    },
    /// 64-bit integer.
    BigInt,
    /// Double precision float.
    Double,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Timestamp with time zone.
    Timestamp,
    /// Enumerated type.
    Enum {
        /// Allowed values.
        values: Vec<String>,
    },
    /// UUID.
    Uuid,
}

impl EngineType {
    /// Engine type name.
    pub fn name(&self) -> &'static str {
        match self {
            EngineType::Text => "text",
            EngineType::VarChar { .. } => "varchar",
            EngineType::BigInt => "bigint",
            EngineType::Double => "double",
            EngineType::Boolean => "boolean",
            EngineType::Date => "date",
            EngineType::Timestamp => "timestamp",
            EngineType::Enum { .. } => "enum",
            EngineType::Uuid => "uuid",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineType::VarChar { length } => write!(f, "varchar({length})"),
            EngineType::Enum { values } => write!(f, "enum({})", values.join(", ")),
            other => f.write_str(other.name()),
        }
    }
}

/// Engine-facing column mapping as declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialStorage {
    /// Column name.
    pub column: Option<String>,
    /// Length for bounded strings.
    pub length: Option<Length>,
    /// Whether the column accepts null.
    pub nullable: Option<bool>,
    /// Whether the column carries a unique constraint.
    pub unique: Option<bool>,
    /// Whether the column is the primary key.
    pub primary: Option<bool>,
    /// Column default.
    pub default: Option<DefaultValue>,
}

impl PartialStorage {
    /// Resolve the fields shared by every kind. Flags not overridden at the
    /// storage level follow the finalized control facet.
    pub(crate) fn finalize_common(
        &self,
        name: &str,
        engine_type: EngineType,
        control: &Control,
    ) -> Storage {
        let default = match &self.default {
            Some(default) => DefaultValue::normalized(Some(default)),
            None => control.default.clone(),
        };
        Storage {
            column: self.column.clone().unwrap_or_else(|| name.to_string()),
            engine_type,
            nullable: self.nullable.unwrap_or(control.nullable),
            unique: self.unique.unwrap_or(control.unique),
            primary: self.primary.unwrap_or(control.primary),
            default,
        }
    }

    /// Storage length for a bounded string: unspecified or infinite lengths
    /// fall back to the engine default.
    pub(crate) fn resolved_length(&self, config: &SchemaConfig) -> usize {
        match self.length {
            Some(Length::Fixed(n)) => n,
            Some(Length::Unbounded) | None => config.string_storage_length,
        }
    }
}

/// Resolved engine-facing facet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Storage {
    /// Column name.
    pub column: String,
    /// Column type.
    pub engine_type: EngineType,
    /// Whether the column accepts null.
    pub nullable: bool,
    /// Whether the column carries a unique constraint.
    pub unique: bool,
    /// Whether the column is the primary key.
    pub primary: bool,
    /// Column default.
    pub default: DefaultValue,
}

/// Unspecified nullability means nullable, unless the attribute is primary.
pub(crate) fn resolve_nullable(required: Option<bool>, primary: bool) -> bool {
    match required {
        Some(required) => !required,
        None => !primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_nullable() {
        assert!(resolve_nullable(None, false));
        assert!(!resolve_nullable(None, true));
        assert!(resolve_nullable(Some(false), true));
        assert!(!resolve_nullable(Some(true), false));
    }

    #[test]
    fn test_range_finalize() {
        let partial = PartialRange::<i64> {
            min: Some(0),
            max: None,
            step: None,
        };
        let range = partial.finalize();
        assert_eq!(range.min, Bound::Included(0));
        assert_eq!(range.max, Bound::Unbounded);
        assert_eq!(range.step, None);
        assert_eq!(range.anchor(), Some(&0));
        assert_eq!(range.to_partial(), partial);
    }

    #[test]
    fn test_string_constraints_finalize() {
        let finalized = PartialStringConstraints::default().finalize();
        assert_eq!(finalized.min_length, 0);
        assert_eq!(finalized.max_length, Bound::Unbounded);

        let infinite = PartialStringConstraints {
            max_length: Some(Length::Unbounded),
            ..Default::default()
        };
        assert_eq!(infinite.finalize().max_length, Bound::Unbounded);
    }

    #[test]
    fn test_storage_length_defaults() {
        let config = SchemaConfig::default();
        assert_eq!(PartialStorage::default().resolved_length(&config), 255);

        let infinite = PartialStorage {
            length: Some(Length::Unbounded),
            ..Default::default()
        };
        assert_eq!(infinite.resolved_length(&config), 255);

        let fixed = PartialStorage {
            length: Some(Length::Fixed(40)),
            ..Default::default()
        };
        assert_eq!(fixed.resolved_length(&config), 40);
    }

    #[test]
    fn test_engine_type_display() {
        assert_eq!(EngineType::VarChar { length: 255 }.to_string(), "varchar(255)");
        assert_eq!(EngineType::Uuid.to_string(), "uuid");
        assert_eq!(
            EngineType::Enum {
                values: vec!["a".into(), "b".into()]
            }
            .to_string(),
            "enum(a, b)"
        );
    }

    #[test]
    fn test_pattern_equality_by_source() {
        let a = Pattern::new("^[a-z]+$").unwrap();
        let b = Pattern::new("^[a-z]+$").unwrap();
        assert_eq!(a, b);
        assert!(a.is_match("abc"));
        assert!(!a.is_match("ABC"));
    }
}
