//! The coercion pipeline shared by every attribute kind.
//!
//! Each finalized attribute carries one [`CoercionContract`] implementation.
//! Checks always run in the same order: undefined, null, shape, bounds, step.
//! Kinds only supply the shape and bound checks through a [`Codec`].

use crate::error::{CoercionError, CoercionErrorKind};
use crate::value::{DefaultValue, Value};
use serde_json::Value as JsonValue;
use std::fmt;

/// Value transformations at every boundary an attribute value crosses.
///
/// `None` stands for an undefined (absent) value; explicit null is
/// [`Value::Null`], [`JsonValue::Null`] or the filter token `null`.
pub trait CoercionContract: fmt::Debug + Send + Sync {
    /// Validate loosely-typed client input.
    fn set_client_property_value(&self, input: Option<&JsonValue>) -> Result<Value, CoercionError>;

    /// Validate a client query-string token.
    fn set_client_query_filter_value(&self, input: Option<&str>) -> Result<Value, CoercionError>;

    /// Render a canonical value for a request or response body.
    fn serialize_client_property_value(&self, value: &Value) -> Result<JsonValue, CoercionError>;

    /// Render a canonical value as a query-string token.
    fn serialize_client_query_filter_value(&self, value: &Value) -> Result<String, CoercionError>;

    /// Validate a value on the storage-write path. Read-only attributes
    /// reject any assignment.
    ///
    /// Undefined input takes the attribute default when one is declared,
    /// even on a nullable attribute; it becomes null only when there is no
    /// default.
    fn set_orm_property_value(&self, input: Option<&Value>) -> Result<Value, CoercionError>;

    /// Turn a query-string token into a typed predicate value.
    fn set_orm_query_filter_value(&self, input: Option<&str>) -> Result<Value, CoercionError>;

    /// Convert a stored value back into its canonical form.
    fn serialize_orm_property_value(&self, value: &Value) -> Result<Value, CoercionError>;

    /// Validate a value received in a wire response.
    fn set_client_property_value_from_response(
        &self,
        input: Option<&JsonValue>,
    ) -> Result<Value, CoercionError>;
}

/// Attribute-wide rules applied before any kind-specific check.
#[derive(Debug, Clone)]
pub(crate) struct Rules {
    pub attribute: String,
    pub nullable: bool,
    pub read_only: bool,
    pub default: DefaultValue,
}

/// Kind-specific shape and bound checks.
///
/// Decoders return the canonical [`Value`] or the shape failure; `check`
/// runs bound and step constraints against a decoded value.
pub(crate) trait Codec: fmt::Debug + Send + Sync {
    /// Expected shape, as worded in shape errors.
    fn expected(&self) -> &'static str;

    fn decode_json(&self, input: &JsonValue) -> Result<Value, CoercionErrorKind>;

    fn decode_token(&self, input: &str) -> Result<Value, CoercionErrorKind>;

    fn decode_value(&self, input: &Value) -> Result<Value, CoercionErrorKind>;

    /// Render an already-canonical value.
    fn encode_json(&self, value: &Value) -> JsonValue;

    fn encode_token(&self, value: &Value) -> String {
        value.to_string()
    }

    fn check(&self, _value: &Value) -> Result<(), CoercionErrorKind> {
        Ok(())
    }

    fn shape(&self) -> CoercionErrorKind {
        CoercionErrorKind::Shape {
            expected: self.expected(),
        }
    }
}

/// Which undefined rule a direction follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Absent {
    /// Substitute the default, else null when nullable.
    Default,
    /// Null when nullable; defaults never apply.
    Null,
}

/// The one [`CoercionContract`] implementation, generic over a kind's codec.
#[derive(Debug)]
pub(crate) struct Coercer<C> {
    rules: Rules,
    codec: C,
}

impl<C: Codec> Coercer<C> {
    pub(crate) fn new(rules: Rules, codec: C) -> Self {
        Self { rules, codec }
    }

    /// Check a literal default against the attribute's own constraints.
    pub(crate) fn check_default(&self) -> Result<(), CoercionErrorKind> {
        match &self.rules.default {
            DefaultValue::Value(value) => {
                let value = self.codec.decode_value(value)?;
                self.codec.check(&value)
            }
            DefaultValue::Null | DefaultValue::Generator(_) => Ok(()),
        }
    }

    fn fail(&self, kind: CoercionErrorKind) -> CoercionError {
        CoercionError::new(self.rules.attribute.clone(), kind)
    }

    fn absent(&self, rule: Absent) -> Result<Value, CoercionError> {
        if rule == Absent::Default && !self.rules.default.is_null() {
            let value = self.rules.default.resolve();
            return self.accept(self.codec.decode_value(&value));
        }
        if self.rules.nullable {
            Ok(Value::Null)
        } else {
            Err(self.fail(CoercionErrorKind::Undefined))
        }
    }

    fn null(&self) -> Result<Value, CoercionError> {
        if self.rules.nullable {
            Ok(Value::Null)
        } else {
            Err(self.fail(CoercionErrorKind::Null))
        }
    }

    fn accept(&self, decoded: Result<Value, CoercionErrorKind>) -> Result<Value, CoercionError> {
        let value = decoded.map_err(|kind| self.fail(kind))?;
        self.codec.check(&value).map_err(|kind| self.fail(kind))?;
        Ok(value)
    }

    fn from_json(&self, input: Option<&JsonValue>, rule: Absent) -> Result<Value, CoercionError> {
        match input {
            None => self.absent(rule),
            Some(JsonValue::Null) => self.null(),
            Some(json) => self.accept(self.codec.decode_json(json)),
        }
    }

    fn from_token(&self, input: Option<&str>) -> Result<Value, CoercionError> {
        match input {
            None => self.absent(Absent::Null),
            Some("null") => self.null(),
            Some(token) => self.accept(self.codec.decode_token(token)),
        }
    }

    /// Shape-check a canonical value on its way out.
    fn outbound(&self, value: &Value) -> Result<Option<Value>, CoercionError> {
        if value.is_null() {
            return self.null().map(|_| None);
        }
        self.codec
            .decode_value(value)
            .map(Some)
            .map_err(|kind| self.fail(kind))
    }
}

impl<C: Codec> CoercionContract for Coercer<C> {
    fn set_client_property_value(&self, input: Option<&JsonValue>) -> Result<Value, CoercionError> {
        self.from_json(input, Absent::Default)
    }

    fn set_client_query_filter_value(&self, input: Option<&str>) -> Result<Value, CoercionError> {
        self.from_token(input)
    }

    fn serialize_client_property_value(&self, value: &Value) -> Result<JsonValue, CoercionError> {
        Ok(match self.outbound(value)? {
            Some(value) => self.codec.encode_json(&value),
            None => JsonValue::Null,
        })
    }

    fn serialize_client_query_filter_value(&self, value: &Value) -> Result<String, CoercionError> {
        Ok(match self.outbound(value)? {
            Some(value) => self.codec.encode_token(&value),
            None => "null".to_string(),
        })
    }

    fn set_orm_property_value(&self, input: Option<&Value>) -> Result<Value, CoercionError> {
        match input {
            None => self.absent(Absent::Default),
            Some(_) if self.rules.read_only => Err(self.fail(CoercionErrorKind::ReadOnly)),
            Some(Value::Null) => self.null(),
            Some(value) => self.accept(self.codec.decode_value(value)),
        }
    }

    fn set_orm_query_filter_value(&self, input: Option<&str>) -> Result<Value, CoercionError> {
        self.from_token(input)
    }

    fn serialize_orm_property_value(&self, value: &Value) -> Result<Value, CoercionError> {
        Ok(self.outbound(value)?.unwrap_or(Value::Null))
    }

    fn set_client_property_value_from_response(
        &self,
        input: Option<&JsonValue>,
    ) -> Result<Value, CoercionError> {
        self.from_json(input, Absent::Null)
    }
}
