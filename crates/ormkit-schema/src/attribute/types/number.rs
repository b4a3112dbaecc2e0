//! Floating point number attributes.

use super::integer::MAX_SAFE_INTEGER;
use crate::attribute::coerce::Codec;
use crate::attribute::facet::{
    Constraints, Control, EngineType, PartialControl, PartialRange, PartialStorage, Range, Storage,
};
use crate::error::{CoercionErrorKind, SchemaError};
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::ops::Bound;

/// Relative tolerance of the step check.
const STEP_EPSILON: f64 = 1e-9;

pub(crate) fn validate(label: &str, range: &PartialRange<f64>) -> Result<(), SchemaError> {
    for bound in [range.min, range.max, range.step].into_iter().flatten() {
        if !bound.is_finite() {
            return Err(SchemaError::invalid(label, "bounds and step must be finite"));
        }
    }
    if let (Some(min), Some(max)) = (range.min, range.max) {
        if min > max {
            return Err(SchemaError::invalid(label, format!("min {min} exceeds max {max}")));
        }
    }
    if let Some(step) = range.step {
        if step <= 0.0 {
            return Err(SchemaError::invalid(label, format!("step must be positive, got {step}")));
        }
    }
    Ok(())
}

pub(crate) fn finalize_control(name: &str, control: &PartialControl, range: &PartialRange<f64>) -> Control {
    control.finalize_common(name, Constraints::Number(range.finalize()), None)
}

pub(crate) fn finalize_storage(name: &str, storage: &PartialStorage, control: &Control) -> Storage {
    storage.finalize_common(name, EngineType::Double, control)
}

#[derive(Debug)]
pub(crate) struct NumberCodec {
    range: Range<f64>,
}

impl NumberCodec {
    pub(crate) fn new(range: Range<f64>) -> Self {
        Self { range }
    }

    fn from_f64(&self, value: f64) -> Result<Value, CoercionErrorKind> {
        if !value.is_finite() {
            return Err(CoercionErrorKind::NonFinite);
        }
        if value.abs() > MAX_SAFE_INTEGER as f64 {
            return Err(CoercionErrorKind::UnsafeInteger);
        }
        Ok(Value::Number(value))
    }
}

impl Codec for NumberCodec {
    fn expected(&self) -> &'static str {
        "as a number"
    }

    fn decode_json(&self, input: &JsonValue) -> Result<Value, CoercionErrorKind> {
        match input {
            JsonValue::Number(n) => n.as_f64().map_or_else(|| Err(self.shape()), |f| self.from_f64(f)),
            JsonValue::String(s) => self.decode_token(s),
            _ => Err(self.shape()),
        }
    }

    fn decode_token(&self, input: &str) -> Result<Value, CoercionErrorKind> {
        match input.trim().parse::<f64>() {
            Ok(f) => self.from_f64(f),
            Err(_) => Err(self.shape()),
        }
    }

    fn decode_value(&self, input: &Value) -> Result<Value, CoercionErrorKind> {
        match input {
            Value::Number(f) => self.from_f64(*f),
            Value::Integer(i) => self.from_f64(*i as f64),
            _ => Err(self.shape()),
        }
    }

    fn encode_json(&self, value: &Value) -> JsonValue {
        value.as_f64().map_or(JsonValue::Null, JsonValue::from)
    }

    fn check(&self, value: &Value) -> Result<(), CoercionErrorKind> {
        let Some(v) = value.as_f64() else {
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
            let steps = (v - anchor.unwrap_or(0.0)) / step;
            if (steps - steps.round()).abs() > STEP_EPSILON * steps.abs().max(1.0) {
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

    fn codec(min: Option<f64>, max: Option<f64>, step: Option<f64>) -> NumberCodec {
        NumberCodec::new(PartialRange { min, max, step }.finalize())
    }

    #[test]
    fn test_validate_range() {
        let nan_bound = PartialRange {
            min: Some(f64::NAN),
            max: None,
            step: None,
        };
        assert!(validate("number", &nan_bound).is_err());

        let negative_step = PartialRange {
            min: None,
            max: None,
            step: Some(-0.5),
        };
        assert!(validate("number", &negative_step).is_err());
    }

    #[test]
    fn test_decode() {
        let c = codec(None, None, None);
        assert_eq!(c.decode_json(&json!(1.25)).unwrap(), Value::Number(1.25));
        assert_eq!(c.decode_json(&json!(2)).unwrap(), Value::Number(2.0));
        assert_eq!(c.decode_token(" 3.5 ").unwrap(), Value::Number(3.5));
        assert_eq!(c.decode_token("NaN"), Err(CoercionErrorKind::NonFinite));
        assert_eq!(c.decode_token("1e20"), Err(CoercionErrorKind::UnsafeInteger));
        assert_eq!(c.decode_json(&json!(null)).unwrap_err(), c.shape());
        assert_eq!(c.decode_value(&Value::Integer(4)).unwrap(), Value::Number(4.0));
    }

    #[test]
    fn test_fractional_step_from_anchor() {
        let c = codec(Some(0.5), Some(10.0), Some(0.25));
        assert!(c.check(&Value::Number(0.75)).is_ok());
        assert!(c.check(&Value::Number(1.1)).is_err());
        assert_eq!(
            c.check(&Value::Number(10.5)),
            Err(CoercionErrorKind::Bound {
                constraint: "less than or equal to 10".into()
            })
        );
    }
}
