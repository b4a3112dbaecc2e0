//! Boolean attributes.

use crate::attribute::coerce::Codec;
use crate::attribute::facet::{Constraints, Control, EngineType, PartialControl, PartialStorage, Storage};
use crate::error::CoercionErrorKind;
use crate::value::Value;
use serde_json::Value as JsonValue;

pub(crate) fn finalize_control(name: &str, control: &PartialControl) -> Control {
    control.finalize_common(name, Constraints::Boolean, None)
}

pub(crate) fn finalize_storage(name: &str, storage: &PartialStorage, control: &Control) -> Storage {
    storage.finalize_common(name, EngineType::Boolean, control)
}

#[derive(Debug)]
pub(crate) struct BooleanCodec;

impl Codec for BooleanCodec {
    fn expected(&self) -> &'static str {
        "as a boolean"
    }

    fn decode_json(&self, input: &JsonValue) -> Result<Value, CoercionErrorKind> {
        match input {
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            _ => Err(self.shape()),
        }
    }

    fn decode_token(&self, input: &str) -> Result<Value, CoercionErrorKind> {
        match input.trim() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(self.shape()),
        }
    }

    fn decode_value(&self, input: &Value) -> Result<Value, CoercionErrorKind> {
        match input {
            Value::Bool(_) => Ok(input.clone()),
            _ => Err(self.shape()),
        }
    }

    fn encode_json(&self, value: &Value) -> JsonValue {
        value.as_bool().map_or(JsonValue::Null, JsonValue::Bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode() {
        let c = BooleanCodec;
        assert_eq!(c.decode_json(&json!(true)).unwrap(), Value::Bool(true));
        assert_eq!(
            c.decode_json(&json!("true")),
            Err(CoercionErrorKind::Shape {
                expected: "as a boolean"
            })
        );
        assert_eq!(c.decode_token("0").unwrap(), Value::Bool(false));
        assert_eq!(c.decode_token("false").unwrap(), Value::Bool(false));
        assert!(c.decode_token("yes").is_err());
        assert!(c.decode_value(&Value::Integer(1)).is_err());
    }

    #[test]
    fn test_encode() {
        assert_eq!(BooleanCodec.encode_json(&Value::Bool(false)), json!(false));
        assert_eq!(BooleanCodec.encode_token(&Value::Bool(true)), "true");
    }
}
