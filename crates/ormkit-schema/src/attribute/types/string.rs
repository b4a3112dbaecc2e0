//! Text and fixed-length string attributes.

use crate::attribute::coerce::Codec;
use crate::attribute::facet::{
    Constraints, Control, EngineType, Length, PartialControl, PartialStorage,
    PartialStringConstraints, Pattern, Storage, StringConstraints,
};
use crate::config::SchemaConfig;
use crate::error::{CoercionErrorKind, SchemaError};
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::ops::Bound;

pub(crate) fn validate(
    label: &str,
    constraints: &PartialStringConstraints,
    storage: &PartialStorage,
) -> Result<(), SchemaError> {
    if let (Some(min), Some(Length::Fixed(max))) = (constraints.min_length, constraints.max_length) {
        if min > max {
            return Err(SchemaError::invalid(
                label,
                format!("min length {min} exceeds max length {max}"),
            ));
        }
    }
    if storage.length == Some(Length::Fixed(0)) {
        return Err(SchemaError::invalid(label, "storage length must be positive"));
    }
    Ok(())
}

pub(crate) fn finalize_control(
    name: &str,
    control: &PartialControl,
    constraints: &PartialStringConstraints,
    wrap: fn(StringConstraints) -> Constraints,
) -> Control {
    let constraints = constraints.finalize();
    let display_length = match constraints.max_length {
        Bound::Included(n) | Bound::Excluded(n) => Some(n),
        Bound::Unbounded => None,
    };
    control.finalize_common(name, wrap(constraints), display_length)
}

pub(crate) fn finalize_text_storage(name: &str, storage: &PartialStorage, control: &Control) -> Storage {
    storage.finalize_common(name, EngineType::Text, control)
}

pub(crate) fn finalize_string_storage(
    name: &str,
    storage: &PartialStorage,
    control: &Control,
    config: &SchemaConfig,
) -> Storage {
    let length = storage.resolved_length(config);
    storage.finalize_common(name, EngineType::VarChar { length }, control)
}

#[derive(Debug)]
pub(crate) struct StringCodec {
    min_length: usize,
    max_length: Option<usize>,
    pattern: Option<Pattern>,
}

impl StringCodec {
    /// The effective maximum is the tighter of the control and storage limits.
    pub(crate) fn new(constraints: &StringConstraints, storage_length: Option<usize>) -> Self {
        let control_max = match constraints.max_length {
            Bound::Included(n) | Bound::Excluded(n) => Some(n),
            Bound::Unbounded => None,
        };
        let max_length = match (control_max, storage_length) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            min_length: constraints.min_length,
            max_length,
            pattern: constraints.pattern.clone(),
        }
    }
}

impl Codec for StringCodec {
    fn expected(&self) -> &'static str {
        "as a string"
    }

    fn decode_json(&self, input: &JsonValue) -> Result<Value, CoercionErrorKind> {
        input
            .as_str()
            .map(|s| Value::Text(s.to_string()))
            .ok_or_else(|| self.shape())
    }

    fn decode_token(&self, input: &str) -> Result<Value, CoercionErrorKind> {
        Ok(Value::Text(input.to_string()))
    }

    fn decode_value(&self, input: &Value) -> Result<Value, CoercionErrorKind> {
        match input {
            Value::Text(_) => Ok(input.clone()),
            _ => Err(self.shape()),
        }
    }

    fn encode_json(&self, value: &Value) -> JsonValue {
        JsonValue::String(value.to_string())
    }

    fn check(&self, value: &Value) -> Result<(), CoercionErrorKind> {
        let Some(text) = value.as_str() else {
            return Err(self.shape());
        };
        let length = text.chars().count();
        if length < self.min_length {
            return Err(CoercionErrorKind::Bound {
                constraint: format!("with at least {} characters", self.min_length),
            });
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(CoercionErrorKind::Bound {
                    constraint: format!("with at most {max} characters"),
                });
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(text) {
                return Err(CoercionErrorKind::Bound {
                    constraint: format!("matching pattern {}", pattern.as_str()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(min: Option<usize>, max: Option<Length>, pattern: Option<&str>) -> StringConstraints {
        PartialStringConstraints {
            min_length: min,
            max_length: max,
            pattern: pattern.map(|p| Pattern::new(p).unwrap()),
        }
        .finalize()
    }

    #[test]
    fn test_validate_lengths() {
        let bad = PartialStringConstraints {
            min_length: Some(5),
            max_length: Some(Length::Fixed(3)),
            pattern: None,
        };
        assert!(validate("string", &bad, &PartialStorage::default()).is_err());

        let zero_storage = PartialStorage {
            length: Some(Length::Fixed(0)),
            ..Default::default()
        };
        assert!(validate("string", &PartialStringConstraints::default(), &zero_storage).is_err());
    }

    #[test]
    fn test_effective_max_is_tighter_limit() {
        let codec = StringCodec::new(&constraints(None, Some(Length::Fixed(10)), None), Some(4));
        assert!(codec.check(&Value::Text("abcd".into())).is_ok());
        assert_eq!(
            codec.check(&Value::Text("abcde".into())),
            Err(CoercionErrorKind::Bound {
                constraint: "with at most 4 characters".into()
            })
        );

        let unbounded = StringCodec::new(&constraints(None, None, None), None);
        assert!(unbounded.check(&Value::Text("x".repeat(10_000))).is_ok());
    }

    #[test]
    fn test_lengths_count_characters() {
        let codec = StringCodec::new(&constraints(Some(2), Some(Length::Fixed(3)), None), None);
        assert!(codec.check(&Value::Text("héé".into())).is_ok());
        assert!(codec.check(&Value::Text("h".into())).is_err());
    }

    #[test]
    fn test_pattern() {
        let codec = StringCodec::new(&constraints(None, None, Some("^[a-z]+$")), None);
        assert!(codec.check(&Value::Text("abc".into())).is_ok());
        assert_eq!(
            codec.check(&Value::Text("ABC".into())),
            Err(CoercionErrorKind::Bound {
                constraint: "matching pattern ^[a-z]+$".into()
            })
        );
    }

    #[test]
    fn test_decode_shapes() {
        let codec = StringCodec::new(&constraints(None, None, None), None);
        assert_eq!(
            codec.decode_json(&serde_json::json!("hi")).unwrap(),
            Value::Text("hi".into())
        );
        assert!(codec.decode_json(&serde_json::json!(3)).is_err());
        assert!(codec.decode_value(&Value::Integer(3)).is_err());
    }

    #[test]
    fn test_finalize_defaults() {
        let control = PartialControl::new(crate::attribute::PartialConstraints::String(
            PartialStringConstraints::default(),
        ));
        let finalized = finalize_control(
            "nickName",
            &control,
            &PartialStringConstraints {
                max_length: Some(Length::Fixed(40)),
                ..Default::default()
            },
            Constraints::String,
        );
        assert_eq!(finalized.display_name, "Nick Name");
        assert_eq!(finalized.max_display_length, Some(40));
        assert!(finalized.nullable);

        let storage = finalize_string_storage(
            "nickName",
            &PartialStorage::default(),
            &finalized,
            &SchemaConfig::default(),
        );
        assert_eq!(storage.engine_type, EngineType::VarChar { length: 255 });
        assert_eq!(storage.column, "nickName");
        assert!(storage.nullable);
    }
}
