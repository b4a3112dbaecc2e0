//! Canonical in-memory values and attribute defaults.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A canonical value, as produced by an attribute's inbound coercion functions.
///
/// Enumerated attributes use [`Value::Text`]; every other attribute kind maps
/// to exactly one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer within the safe integer range.
    Integer(i64),
    /// Finite floating point number.
    Number(f64),
    /// UTF-8 string (text, fixed-length string, enumerated value).
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Instant in UTC.
    DateTime(DateTime<Utc>),
    /// Unique identifier.
    Uuid(Uuid),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::DateTime(_) => "date-time",
            Value::Uuid(_) => "uuid",
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64), // Widening conversion
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get as date-time.
    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Try to get as UUID.
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(u) => Some(*u),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Uuid(u) => write!(f, "{}", u.hyphenated()),
        }
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

type GeneratorFn = dyn Fn() -> Value + Send + Sync;

/// A named, zero-argument value producer used as an attribute default.
///
/// Generators compare and serialize by name only.
#[derive(Clone)]
pub struct Generator {
    name: Cow<'static, str>,
    produce: Arc<GeneratorFn>,
}

impl Generator {
    /// Create a generator from a name and a producing function.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        produce: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            produce: Arc::new(produce),
        }
    }

    /// Random (version 4) UUID.
    pub fn uuid_v4() -> Self {
        Self::new("uuid", || Value::Uuid(Uuid::new_v4()))
    }

    /// Current instant.
    pub fn now() -> Self {
        Self::new("now", || Value::DateTime(Utc::now()))
    }

    /// Current UTC calendar date.
    pub fn today() -> Self {
        Self::new("today", || Value::Date(Utc::now().date_naive()))
    }

    /// Look up a built-in generator by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "uuid" => Some(Self::uuid_v4()),
            "now" => Some(Self::now()),
            "today" => Some(Self::today()),
            _ => None,
        }
    }

    /// Generator name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produce a fresh value.
    pub fn generate(&self) -> Value {
        (self.produce)()
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Generator").field(&self.name).finish()
    }
}

impl PartialEq for Generator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Serialize for Generator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            generate: &'a str,
        }

        Repr {
            generate: &self.name,
        }
        .serialize(serializer)
    }
}

/// Default value of an attribute.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// No default; absent values become null.
    #[default]
    Null,
    /// A constant value.
    Value(Value),
    /// A value produced on demand.
    Generator(Generator),
}

impl DefaultValue {
    /// Check if there is no default.
    pub fn is_null(&self) -> bool {
        matches!(self, DefaultValue::Null | DefaultValue::Value(Value::Null))
    }

    /// Produce the default value (evaluating generators).
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Null => Value::Null,
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Generator(generator) => generator.generate(),
        }
    }

    /// Collapse an optional, possibly-null default into its canonical form.
    pub(crate) fn normalized(partial: Option<&DefaultValue>) -> DefaultValue {
        match partial {
            None | Some(DefaultValue::Value(Value::Null)) => DefaultValue::Null,
            Some(other) => other.clone(),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => DefaultValue::Null,
            other => DefaultValue::Value(other),
        }
    }
}

impl From<Generator> for DefaultValue {
    fn from(g: Generator) -> Self {
        DefaultValue::Generator(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());

        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(42).as_i64(), Some(42));
        assert_eq!(Value::Integer(42).as_f64(), Some(42.0)); // Widening conversion
        assert_eq!(Value::Text("hello".into()).as_str(), Some("hello"));
        assert_eq!(Value::Number(1.5).as_i64(), None);
    }

    #[test]
    fn test_value_conversions() {
        let v: Value = 42i32.into();
        assert_eq!(v, Value::Integer(42));

        let v: Value = "hello".into();
        assert_eq!(v, Value::Text("hello".into()));

        let v: Value = None::<i64>.into();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn test_value_display() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-02-29");

        let instant = date.and_hms_opt(12, 30, 0).unwrap().and_utc();
        assert_eq!(
            Value::DateTime(instant).to_string(),
            "2024-02-29T12:30:00.000Z"
        );
    }

    #[test]
    fn test_generator_identity_is_name() {
        let a = Generator::uuid_v4();
        let b = Generator::uuid_v4();
        assert_eq!(a, b);
        assert_ne!(a.generate(), b.generate());
        assert!(Generator::builtin("nope").is_none());
    }

    #[test]
    fn test_default_normalization() {
        assert_eq!(DefaultValue::normalized(None), DefaultValue::Null);
        assert_eq!(
            DefaultValue::normalized(Some(&DefaultValue::Value(Value::Null))),
            DefaultValue::Null
        );
        assert_eq!(
            DefaultValue::normalized(Some(&DefaultValue::Value(Value::Integer(3)))),
            DefaultValue::Value(Value::Integer(3))
        );
        assert_eq!(DefaultValue::Value(Value::Integer(3)).resolve(), Value::Integer(3));
    }

    #[test]
    fn test_default_serialization() {
        let json = serde_json::to_value(DefaultValue::Generator(Generator::now())).unwrap();
        assert_eq!(json, serde_json::json!({ "generate": "now" }));

        let json = serde_json::to_value(DefaultValue::Null).unwrap();
        assert!(json.is_null());
    }
}
