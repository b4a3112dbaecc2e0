//! Attribute descriptor builders.
//!
//! # Example
//!
//! ```
//! use ormkit_schema::{integer, string};
//!
//! let age = integer().required(true).min(0).max(150).build().unwrap();
//! let email = string().unique(true).max_length(320).build().unwrap();
//! assert!(age.control.constraints != email.control.constraints);
//! ```

use super::facet::{
    Length, PartialConstraints, PartialControl, PartialRange, PartialStorage, PartialStringConstraints,
    Pattern,
};
use super::{types, PartialAttribute};
use crate::error::SchemaError;
use crate::value::{DefaultValue, Generator, Value};
use chrono::{DateTime as ChronoDateTime, NaiveDate, Utc};
use std::marker::PhantomData;

/// Builder marker types, one per attribute kind.
pub mod kinds {
    /// Unbounded text.
    #[derive(Debug)]
    pub struct Text;
    /// Fixed-length string.
    #[derive(Debug)]
    pub struct FixedString;
    /// Integer.
    #[derive(Debug)]
    pub struct Integer;
    /// Floating point number.
    #[derive(Debug)]
    pub struct Number;
    /// Boolean.
    #[derive(Debug)]
    pub struct Boolean;
    /// Calendar date.
    #[derive(Debug)]
    pub struct Date;
    /// Date and time.
    #[derive(Debug)]
    pub struct DateTime;
    /// Enumerated string.
    #[derive(Debug)]
    pub struct Enumeration;
    /// Unique identifier.
    #[derive(Debug)]
    pub struct Uuid;
}

/// Kinds with min/max/step constraints.
pub trait RangeKind {
    /// Bound type.
    type Item;
    /// Step type.
    type Step;

    #[doc(hidden)]
    fn range(constraints: &mut PartialConstraints) -> Option<&mut PartialRange<Self::Item, Self::Step>>;
}

/// Kinds with length and pattern constraints.
pub trait StringKind {
    #[doc(hidden)]
    fn string(constraints: &mut PartialConstraints) -> Option<&mut PartialStringConstraints>;
}

macro_rules! range_kind {
    ($kind:ty, $variant:ident, $item:ty, $step:ty) => {
        impl RangeKind for $kind {
            type Item = $item;
            type Step = $step;

            fn range(constraints: &mut PartialConstraints) -> Option<&mut PartialRange<$item, $step>> {
                match constraints {
                    PartialConstraints::$variant(range) => Some(range),
                    _ => None,
                }
            }
        }
    };
}

range_kind!(kinds::Integer, Integer, i64, i64);
range_kind!(kinds::Number, Number, f64, f64);
range_kind!(kinds::Date, Date, NaiveDate, i64);
range_kind!(kinds::DateTime, DateTime, ChronoDateTime<Utc>, i64);

impl StringKind for kinds::Text {
    fn string(constraints: &mut PartialConstraints) -> Option<&mut PartialStringConstraints> {
        match constraints {
            PartialConstraints::Text(c) => Some(c),
            _ => None,
        }
    }
}

impl StringKind for kinds::FixedString {
    fn string(constraints: &mut PartialConstraints) -> Option<&mut PartialStringConstraints> {
        match constraints {
            PartialConstraints::String(c) => Some(c),
            _ => None,
        }
    }
}

/// Chainable builder producing a [`PartialAttribute`].
///
/// Setter errors (such as an invalid pattern) are held until [`build`](Self::build).
#[derive(Debug)]
pub struct AttributeBuilder<K> {
    control: PartialControl,
    storage: PartialStorage,
    error: Option<SchemaError>,
    kind: PhantomData<K>,
}

impl<K> AttributeBuilder<K> {
    fn new(constraints: PartialConstraints) -> Self {
        Self {
            control: PartialControl::new(constraints),
            storage: PartialStorage::default(),
            error: None,
            kind: PhantomData,
        }
    }

    fn label(&self) -> &'static str {
        self.control.constraints.kind().as_str()
    }

    fn fail(&mut self, reason: String) {
        if self.error.is_none() {
            self.error = Some(SchemaError::invalid(self.label(), reason));
        }
    }

    /// Require a value (non-nullable) or explicitly allow null.
    pub fn required(mut self, required: bool) -> Self {
        self.control.required = Some(required);
        self
    }

    /// Mark as the primary identifier.
    pub fn primary(mut self, primary: bool) -> Self {
        self.control.primary = Some(primary);
        self
    }

    /// Require unique values.
    pub fn unique(mut self, unique: bool) -> Self {
        self.control.unique = Some(unique);
        self
    }

    /// Reject assignments on the storage-write path.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.control.read_only = Some(read_only);
        self
    }

    /// Leave out of default UI listings.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.control.hidden = Some(hidden);
        self
    }

    /// Constant default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.control.default = Some(DefaultValue::from(value.into()));
        self
    }

    /// Default produced on demand.
    pub fn default_with(mut self, generator: Generator) -> Self {
        self.control.default = Some(DefaultValue::Generator(generator));
        self
    }

    /// Human-readable name.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.control.display_name = Some(name.into());
        self
    }

    /// Truncation length for display.
    pub fn max_display_length(mut self, length: usize) -> Self {
        self.control.max_display_length = Some(length);
        self
    }

    /// Whether comparisons are case-sensitive.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.control.case_sensitive = Some(case_sensitive);
        self
    }

    /// Storage column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.storage.column = Some(column.into());
        self
    }

    /// Check local constraints and produce the partial descriptor.
    pub fn build(self) -> Result<PartialAttribute, SchemaError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let label = self.label();
        types::validate(label, &self.control, &self.storage)?;
        Ok(PartialAttribute {
            label: label.to_string(),
            control: self.control,
            storage: self.storage,
        })
    }
}

impl<K: RangeKind> AttributeBuilder<K> {
    fn range_mut(&mut self) -> Option<&mut PartialRange<K::Item, K::Step>> {
        K::range(&mut self.control.constraints)
    }

    /// Inclusive minimum; also the anchor of the step.
    pub fn min(mut self, min: K::Item) -> Self {
        if let Some(range) = self.range_mut() {
            range.min = Some(min);
        }
        self
    }

    /// Inclusive maximum.
    pub fn max(mut self, max: K::Item) -> Self {
        if let Some(range) = self.range_mut() {
            range.max = Some(max);
        }
        self
    }

    /// Values must be whole multiples of `step` from the minimum.
    pub fn step(mut self, step: K::Step) -> Self {
        if let Some(range) = self.range_mut() {
            range.step = Some(step);
        }
        self
    }
}

impl<K: StringKind> AttributeBuilder<K> {
    fn string_mut(&mut self) -> Option<&mut PartialStringConstraints> {
        K::string(&mut self.control.constraints)
    }

    /// Minimum length in characters.
    pub fn min_length(mut self, length: usize) -> Self {
        if let Some(c) = self.string_mut() {
            c.min_length = Some(length);
        }
        self
    }

    /// Maximum length in characters.
    pub fn max_length(mut self, length: usize) -> Self {
        if let Some(c) = self.string_mut() {
            c.max_length = Some(Length::Fixed(length));
        }
        self
    }

    /// No maximum length.
    pub fn unbounded(mut self) -> Self {
        if let Some(c) = self.string_mut() {
            c.max_length = Some(Length::Unbounded);
        }
        self
    }

    /// Regular expression values must match.
    pub fn pattern(mut self, source: &str) -> Self {
        match Pattern::new(source) {
            Ok(pattern) => {
                if let Some(c) = self.string_mut() {
                    c.pattern = Some(pattern);
                }
            }
            Err(err) => self.fail(format!("invalid pattern `{source}`: {err}")),
        }
        self
    }
}

impl AttributeBuilder<kinds::FixedString> {
    /// Engine column length; defaults to the configured string storage length.
    pub fn storage_length(mut self, length: usize) -> Self {
        self.storage.length = Some(Length::Fixed(length));
        self
    }
}

/// Unbounded text.
pub fn text() -> AttributeBuilder<kinds::Text> {
    AttributeBuilder::new(PartialConstraints::Text(PartialStringConstraints::default()))
}

/// Fixed-length string, stored as a bounded column.
pub fn string() -> AttributeBuilder<kinds::FixedString> {
    AttributeBuilder::new(PartialConstraints::String(PartialStringConstraints::default()))
}

/// Integer within the safe integer range.
pub fn integer() -> AttributeBuilder<kinds::Integer> {
    AttributeBuilder::new(PartialConstraints::Integer(PartialRange::default()))
}

/// Finite floating point number.
pub fn number() -> AttributeBuilder<kinds::Number> {
    AttributeBuilder::new(PartialConstraints::Number(PartialRange::default()))
}

/// Boolean.
pub fn boolean() -> AttributeBuilder<kinds::Boolean> {
    AttributeBuilder::new(PartialConstraints::Boolean)
}

/// Calendar date; steps are in days.
pub fn date() -> AttributeBuilder<kinds::Date> {
    AttributeBuilder::new(PartialConstraints::Date(PartialRange::default()))
}

/// Date and time; steps are in seconds.
pub fn date_time() -> AttributeBuilder<kinds::DateTime> {
    AttributeBuilder::new(PartialConstraints::DateTime(PartialRange::default()))
}

/// Enumerated string. An empty value set fails at [`AttributeBuilder::build`].
pub fn enumeration<I, S>(values: I) -> AttributeBuilder<kinds::Enumeration>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    AttributeBuilder::new(PartialConstraints::Enum {
        values: values.into_iter().map(Into::into).collect(),
    })
}

/// Unique identifier.
pub fn uuid() -> AttributeBuilder<kinds::Uuid> {
    AttributeBuilder::new(PartialConstraints::Uuid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeKind;

    #[test]
    fn test_builders_record_kind_and_label() {
        let attr = integer().min(1).max(10).build().unwrap();
        assert_eq!(attr.label, "integer");
        assert_eq!(attr.kind(), AttributeKind::Integer);
        assert_eq!(
            attr.control.constraints,
            PartialConstraints::Integer(PartialRange {
                min: Some(1),
                max: Some(10),
                step: None
            })
        );
    }

    #[test]
    fn test_empty_enumeration_fails_at_build() {
        let err = enumeration(Vec::<String>::new()).build().unwrap_err();
        assert_eq!(
            err,
            SchemaError::EmptyEnumeration {
                attribute: "enum".into()
            }
        );
    }

    #[test]
    fn test_invalid_pattern_is_deferred() {
        let builder = string().pattern("(unclosed");
        let err = builder.max_length(5).build().unwrap_err();
        assert!(matches!(err, SchemaError::InvalidAttribute { .. }));
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn test_inverted_range_fails() {
        assert!(number().min(2.0).max(1.0).build().is_err());
        assert!(text().min_length(4).max_length(2).build().is_err());
        assert!(integer().step(-1).build().is_err());
    }

    #[test]
    fn test_builder_is_pure_data() {
        let a = string().max_length(10).build().unwrap();
        let b = string().max_length(10).build().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_defaults() {
        let attr = uuid().default_with(Generator::uuid_v4()).build().unwrap();
        assert_eq!(
            attr.control.default,
            Some(DefaultValue::Generator(Generator::uuid_v4()))
        );

        let attr = boolean().default_value(false).build().unwrap();
        assert_eq!(attr.control.default, Some(DefaultValue::Value(Value::Bool(false))));
    }
}
