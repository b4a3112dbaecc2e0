//! Integer attributes.

use crate::attribute::coerce::Codec;
use crate::attribute::facet::{
    Constraints, Control, EngineType, PartialControl, PartialRange, PartialStorage, Range, Storage,
};
use crate::error::{CoercionErrorKind, SchemaError};
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::ops::Bound;

/// Largest integer exactly representable as a double: 2^53 - 1.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

pub(crate) fn is_safe(value: i64) -> bool {
    (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&value)
}

pub(crate) fn validate(label: &str, range: &PartialRange<i64>) -> Result<(), SchemaError> {
    for bound in [range.min, range.max].into_iter().flatten() {
        if !is_safe(bound) {
            return Err(SchemaError::invalid(
                label,
                format!("bound {bound} is outside the safe integer range"),
            ));
        }
    }
    if let (Some(min), Some(max)) = (range.min, range.max) {
        if min > max {
            return Err(SchemaError::invalid(label, format!("min {min} exceeds max {max}")));
        }
    }
    if let Some(step) = range.step {
        if step <= 0 {
            return Err(SchemaError::invalid(label, format!("step must be positive, got {step}")));
        }
    }
    Ok(())
}

pub(crate) fn finalize_control(name: &str, control: &PartialControl, range: &PartialRange<i64>) -> Control {
    control.finalize_common(name, Constraints::Integer(range.finalize()), None)
}

pub(crate) fn finalize_storage(name: &str, storage: &PartialStorage, control: &Control) -> Storage {
    storage.finalize_common(name, EngineType::BigInt, control)
}

#[derive(Debug)]
pub(crate) struct IntegerCodec {
    range: Range<i64>,
}

impl IntegerCodec {
    pub(crate) fn new(range: Range<i64>) -> Self {
        Self { range }
    }

    fn from_f64(&self, value: f64) -> Result<Value, CoercionErrorKind> {
        if !value.is_finite() {
            return Err(CoercionErrorKind::NonFinite);
        }
        if value.fract() != 0.0 {
            return Err(self.shape());
        }
        if value.abs() > MAX_SAFE_INTEGER as f64 {
            return Err(CoercionErrorKind::UnsafeInteger);
        }
        Ok(Value::Integer(value as i64))
    }

    fn from_i64(&self, value: i64) -> Result<Value, CoercionErrorKind> {
        if is_safe(value) {
            Ok(Value::Integer(value))
        } else {
            Err(CoercionErrorKind::UnsafeInteger)
        }
    }
}

impl Codec for IntegerCodec {
    fn expected(&self) -> &'static str {
        "as an integer"
    }

    fn decode_json(&self, input: &JsonValue) -> Result<Value, CoercionErrorKind> {
        match input {
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    self.from_i64(i)
                } else if n.is_u64() {
                    Err(CoercionErrorKind::UnsafeInteger)
                } else {
                    n.as_f64().map_or_else(|| Err(self.shape()), |f| self.from_f64(f))
                }
            }
            JsonValue::String(s) => self.decode_token(s),
            _ => Err(self.shape()),
        }
    }

    fn decode_token(&self, input: &str) -> Result<Value, CoercionErrorKind> {
        let input = input.trim();
        if let Ok(i) = input.parse::<i64>() {
            return self.from_i64(i);
        }
        match input.parse::<f64>() {
            Ok(f) => self.from_f64(f),
            Err(_) => Err(self.shape()),
        }
    }

    fn decode_value(&self, input: &Value) -> Result<Value, CoercionErrorKind> {
        match input {
            Value::Integer(i) => self.from_i64(*i),
            Value::Number(f) => self.from_f64(*f),
            _ => Err(self.shape()),
        }
    }

    fn encode_json(&self, value: &Value) -> JsonValue {
        value.as_i64().map_or(JsonValue::Null, JsonValue::from)
    }

    fn check(&self, value: &Value) -> Result<(), CoercionErrorKind> {
        let Some(v) = value.as_i64() else {
            return Err(self.shape());
        };
        if let Bound::Included(min) = self.range.min {
            if v < min {
                return Err(CoercionErrorKind::Bound {
                    constraint: format!("greater than or equal to {min}"),
                });
            }
        }
        if let Bound::Included(max) = self.range.max {
            if v > max {
                return Err(CoercionErrorKind::Bound {
                    constraint: format!("less than or equal to {max}"),
                });
            }
        }
        if let Some(step) = self.range.step {
            let anchor = self.range.anchor().copied();
            let offset = i128::from(v) - i128::from(anchor.unwrap_or(0));
            if offset % i128::from(step) != 0 {
                return Err(CoercionErrorKind::Step {
                    step: step.to_string(),
                    anchor: anchor.map(|a| a.to_string()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec(min: Option<i64>, max: Option<i64>, step: Option<i64>) -> IntegerCodec {
        IntegerCodec::new(PartialRange { min, max, step }.finalize())
    }

    #[test]
    fn test_validate_range() {
        let ok = PartialRange {
            min: Some(0),
            max: Some(10),
            step: Some(2),
        };
        assert!(validate("integer", &ok).is_ok());

        let inverted = PartialRange {
            min: Some(10),
            max: Some(0),
            step: None,
        };
        assert!(validate("integer", &inverted).is_err());

        let zero_step = PartialRange {
            min: None,
            max: None,
            step: Some(0),
        };
        assert!(validate("integer", &zero_step).is_err());

        let unsafe_bound = PartialRange {
            min: None,
            max: Some(i64::MAX),
            step: None,
        };
        assert!(validate("integer", &unsafe_bound).is_err());
    }

    #[test]
    fn test_decode_json() {
        let c = codec(None, None, None);
        assert_eq!(c.decode_json(&json!(42)).unwrap(), Value::Integer(42));
        assert_eq!(c.decode_json(&json!(42.0)).unwrap(), Value::Integer(42));
        assert_eq!(c.decode_json(&json!("17")).unwrap(), Value::Integer(17));
        assert_eq!(
            c.decode_json(&json!(1.5)),
            Err(CoercionErrorKind::Shape {
                expected: "as an integer"
            })
        );
        assert_eq!(c.decode_json(&json!(true)).unwrap_err(), c.shape());
        assert_eq!(
            c.decode_json(&json!(9_007_199_254_740_992_i64)),
            Err(CoercionErrorKind::UnsafeInteger)
        );
        assert_eq!(c.decode_json(&json!(u64::MAX)), Err(CoercionErrorKind::UnsafeInteger));
    }

    #[test]
    fn test_non_finite_is_distinct() {
        let c = codec(None, None, None);
        assert_eq!(c.decode_token("NaN"), Err(CoercionErrorKind::NonFinite));
        assert_eq!(c.decode_token("inf"), Err(CoercionErrorKind::NonFinite));
        assert_eq!(c.decode_value(&Value::Number(f64::INFINITY)), Err(CoercionErrorKind::NonFinite));
        assert_eq!(c.decode_token("abc").unwrap_err(), c.shape());
        assert_eq!(c.decode_token("1e300"), Err(CoercionErrorKind::UnsafeInteger));
    }

    #[test]
    fn test_bounds() {
        let c = codec(Some(0), Some(1000), None);
        assert!(c.check(&Value::Integer(500)).is_ok());
        assert_eq!(
            c.check(&Value::Integer(1001)),
            Err(CoercionErrorKind::Bound {
                constraint: "less than or equal to 1000".into()
            })
        );
        assert_eq!(
            c.check(&Value::Integer(-1)),
            Err(CoercionErrorKind::Bound {
                constraint: "greater than or equal to 0".into()
            })
        );
    }

    #[test]
    fn test_step_is_relative_to_min() {
        let c = codec(Some(3), None, Some(5));
        assert!(c.check(&Value::Integer(3)).is_ok());
        assert!(c.check(&Value::Integer(13)).is_ok());
        assert_eq!(
            c.check(&Value::Integer(10)),
            Err(CoercionErrorKind::Step {
                step: "5".into(),
                anchor: Some("3".into())
            })
        );

        let unanchored = codec(None, None, Some(5));
        assert!(unanchored.check(&Value::Integer(-10)).is_ok());
        assert_eq!(
            unanchored.check(&Value::Integer(3)),
            Err(CoercionErrorKind::Step {
                step: "5".into(),
                anchor: None
            })
        );
    }
}
