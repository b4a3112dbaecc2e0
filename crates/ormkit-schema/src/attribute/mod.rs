//! Attribute descriptors.
//!
//! Builders ([`integer`], [`string`], ...) produce a [`PartialAttribute`]:
//! pure data with a debug label and partial control/storage facets.
//! [`PartialAttribute::finalize`] resolves every optional field and attaches
//! the coercion functions, producing an [`Attribute`].

mod builder;
mod coerce;
mod facet;
mod types;

pub use builder::{
    boolean, date, date_time, enumeration, integer, kinds, number, string, text, uuid,
    AttributeBuilder, RangeKind, StringKind,
};
pub use coerce::CoercionContract;
pub use facet::{
    AttributeKind, Constraints, Control, EngineType, Length, PartialConstraints, PartialControl,
    PartialRange, PartialStorage, PartialStringConstraints, Pattern, Range, Storage,
    StringConstraints,
};
pub use types::MAX_SAFE_INTEGER;

use crate::config::SchemaConfig;
use crate::error::{CoercionError, SchemaError};
use crate::value::Value;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// An attribute as declared: every optional field may still be unset.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialAttribute {
    /// Debug label (the kind name for built attributes).
    pub label: String,
    /// Client-facing facet.
    pub control: PartialControl,
    /// Engine-facing facet.
    pub storage: PartialStorage,
}

impl PartialAttribute {
    /// A partial attribute from raw facets, labelled by its kind.
    pub fn new(control: PartialControl, storage: PartialStorage) -> Self {
        Self {
            label: control.constraints.kind().as_str().to_string(),
            control,
            storage,
        }
    }

    /// Attribute kind.
    pub fn kind(&self) -> AttributeKind {
        self.control.constraints.kind()
    }

    /// Whether the declaration claims to be the primary identifier.
    pub fn is_primary(&self) -> bool {
        self.control.primary == Some(true) || self.storage.primary == Some(true)
    }

    /// A copy marked as the primary identifier.
    pub fn as_primary(&self) -> Self {
        let mut primary = self.clone();
        primary.control.primary = Some(true);
        primary
    }

    /// Finalize with the default conventions.
    pub fn finalize(&self, name: &str) -> Result<Attribute, SchemaError> {
        self.finalize_with(name, &SchemaConfig::default())
    }

    /// Resolve every optional field and attach the coercion functions.
    ///
    /// Does not modify `self`; calling it twice yields equal attributes.
    pub fn finalize_with(&self, name: &str, config: &SchemaConfig) -> Result<Attribute, SchemaError> {
        let finalized = types::finalize(name, &self.label, &self.control, &self.storage, config)?;
        Ok(Attribute {
            name: name.to_string(),
            label: self.label.clone(),
            control: finalized.control,
            storage: finalized.storage,
            coercion: finalized.coercion,
        })
    }
}

/// A finalized attribute: both facets fully resolved, plus its coercion functions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    name: String,
    label: String,
    control: Control,
    storage: Storage,
    #[serde(skip)]
    coercion: Arc<dyn CoercionContract>,
}

impl Attribute {
    /// Attribute name within its entity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Client-facing facet.
    pub fn control(&self) -> &Control {
        &self.control
    }

    /// Engine-facing facet.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Attribute kind.
    pub fn kind(&self) -> AttributeKind {
        self.control.constraints.kind()
    }

    pub fn is_primary(&self) -> bool {
        self.control.primary
    }

    pub fn is_hidden(&self) -> bool {
        self.control.hidden
    }

    pub fn is_required(&self) -> bool {
        self.control.is_required()
    }

    pub(crate) fn mark_hidden(&mut self) {
        self.control.hidden = true;
    }

    /// Flag as part of the primary key in both facets. Only used for keys
    /// that are already required.
    pub(crate) fn mark_primary(&mut self) {
        self.control.primary = true;
        self.storage.primary = true;
    }

    /// A partial attribute able to hold references to this attribute's values.
    ///
    /// Keeps the kind and constraints; drops primary, unique, read-only and
    /// default; always hidden.
    pub fn foreign_key_partial(&self, required: bool) -> PartialAttribute {
        let mut control = PartialControl::new(self.control.constraints.to_partial());
        control.required = Some(required);
        control.hidden = Some(true);
        control.case_sensitive = Some(self.control.case_sensitive);

        let storage = PartialStorage {
            length: match self.storage.engine_type {
                EngineType::VarChar { length } => Some(Length::Fixed(length)),
                _ => None,
            },
            ..PartialStorage::default()
        };

        PartialAttribute {
            label: self.label.clone(),
            control,
            storage,
        }
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.label == other.label
            && self.control == other.control
            && self.storage == other.storage
    }
}

impl CoercionContract for Attribute {
    fn set_client_property_value(&self, input: Option<&JsonValue>) -> Result<Value, CoercionError> {
        self.coercion.set_client_property_value(input)
    }

    fn set_client_query_filter_value(&self, input: Option<&str>) -> Result<Value, CoercionError> {
        self.coercion.set_client_query_filter_value(input)
    }

    fn serialize_client_property_value(&self, value: &Value) -> Result<JsonValue, CoercionError> {
        self.coercion.serialize_client_property_value(value)
    }

    fn serialize_client_query_filter_value(&self, value: &Value) -> Result<String, CoercionError> {
        self.coercion.serialize_client_query_filter_value(value)
    }

    fn set_orm_property_value(&self, input: Option<&Value>) -> Result<Value, CoercionError> {
        self.coercion.set_orm_property_value(input)
    }

    fn set_orm_query_filter_value(&self, input: Option<&str>) -> Result<Value, CoercionError> {
        self.coercion.set_orm_query_filter_value(input)
    }

    fn serialize_orm_property_value(&self, value: &Value) -> Result<Value, CoercionError> {
        self.coercion.serialize_orm_property_value(value)
    }

    fn set_client_property_value_from_response(
        &self,
        input: Option<&JsonValue>,
    ) -> Result<Value, CoercionError> {
        self.coercion.set_client_property_value_from_response(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoercionErrorKind;
    use crate::value::{DefaultValue, Generator};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::ops::Bound;

    #[test]
    fn test_finalize_fills_every_field() {
        let attr = integer().build().unwrap().finalize("count").unwrap();
        let control = attr.control();
        assert!(control.nullable);
        assert!(!control.primary);
        assert!(!control.unique);
        assert!(!control.read_only);
        assert!(!control.hidden);
        assert_eq!(control.default, DefaultValue::Null);
        assert_eq!(control.display_name, "Count");
        assert_eq!(control.max_display_length, None);
        assert!(control.case_sensitive);
        assert_eq!(
            control.constraints,
            Constraints::Integer(Range {
                min: Bound::Unbounded,
                max: Bound::Unbounded,
                step: None
            })
        );

        let storage = attr.storage();
        assert_eq!(storage.column, "count");
        assert_eq!(storage.engine_type, EngineType::BigInt);
        assert!(storage.nullable);
        assert!(!storage.primary);
    }

    #[test]
    fn test_primary_defaults_to_non_nullable() {
        let attr = uuid().primary(true).build().unwrap().finalize("id").unwrap();
        assert!(attr.is_required());
        assert!(!attr.storage().nullable);
        assert!(attr.storage().primary);

        let attr = uuid()
            .primary(true)
            .required(false)
            .build()
            .unwrap()
            .finalize("id")
            .unwrap();
        assert!(!attr.is_required());
    }

    #[test]
    fn test_finalize_is_repeatable() {
        let partial = string()
            .max_length(20)
            .default_value("guest")
            .build()
            .unwrap();
        let before = partial.clone();
        let a = partial.finalize("nick").unwrap();
        let b = partial.finalize("nick").unwrap();
        assert_eq!(a, b);
        assert_eq!(partial, before);
    }

    #[test]
    fn test_string_storage_length_from_config() {
        let partial = string().build().unwrap();
        let attr = partial
            .finalize_with("code", &SchemaConfig::new().with_string_storage_length(8))
            .unwrap();
        assert_eq!(attr.storage().engine_type, EngineType::VarChar { length: 8 });
        assert_eq!(attr.control().max_display_length, None);
        assert!(matches!(
            attr.set_client_property_value(Some(&json!("123456789"))),
            Err(CoercionError {
                kind: CoercionErrorKind::Bound { .. },
                ..
            })
        ));

        let text = text().build().unwrap().finalize("body").unwrap();
        assert_eq!(text.storage().engine_type, EngineType::Text);
    }

    #[test]
    fn test_invalid_default_is_a_schema_error() {
        let partial = integer().max(10).default_value(20).build().unwrap();
        let err = partial.finalize("limit").unwrap_err();
        assert!(err.to_string().contains("default value rejected"));
    }

    #[test]
    fn test_required_integer_round_trip() {
        let attr = integer()
            .required(true)
            .max(1000)
            .build()
            .unwrap()
            .finalize("quota")
            .unwrap();

        assert_eq!(
            attr.set_orm_property_value(Some(&Value::Integer(500))).unwrap(),
            Value::Integer(500)
        );
        let err = attr
            .set_orm_property_value(Some(&Value::Integer(1001)))
            .unwrap_err();
        assert_eq!(err.attribute, "quota");
        assert!(err.to_string().contains("1000"));
        assert_eq!(
            attr.set_orm_property_value(None).unwrap_err().kind,
            CoercionErrorKind::Undefined
        );
    }

    #[test]
    fn test_generator_default_on_write() {
        let attr = uuid()
            .required(true)
            .read_only(true)
            .default_with(Generator::uuid_v4())
            .build()
            .unwrap()
            .finalize("id")
            .unwrap();
        assert!(matches!(attr.set_orm_property_value(None), Ok(Value::Uuid(_))));
        assert_eq!(
            attr.set_orm_property_value(Some(&Value::Uuid(uuid::Uuid::nil())))
                .unwrap_err()
                .kind,
            CoercionErrorKind::ReadOnly
        );
    }

    #[test]
    fn test_foreign_key_partial() {
        let pk = string()
            .primary(true)
            .unique(true)
            .read_only(true)
            .storage_length(36)
            .build()
            .unwrap()
            .finalize("code")
            .unwrap();

        let fk = pk.foreign_key_partial(false).finalize("countryCode").unwrap();
        assert_eq!(fk.kind(), AttributeKind::String);
        assert!(fk.is_hidden());
        assert!(!fk.is_primary());
        assert!(!fk.control().unique);
        assert!(!fk.control().read_only);
        assert!(!fk.is_required());
        assert_eq!(fk.storage().engine_type, EngineType::VarChar { length: 36 });
        assert_eq!(fk.control().display_name, "Country Code");
    }

    #[test]
    fn test_attribute_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Attribute>();
        assert_send_sync::<PartialAttribute>();
    }
}
