//! Unique identifier attributes.

use crate::attribute::coerce::Codec;
use crate::attribute::facet::{Constraints, Control, EngineType, PartialControl, PartialStorage, Storage};
use crate::error::CoercionErrorKind;
use crate::value::Value;
use serde_json::Value as JsonValue;
use uuid::Uuid;

pub(crate) fn finalize_control(name: &str, control: &PartialControl) -> Control {
    control.finalize_common(name, Constraints::Uuid, None)
}

pub(crate) fn finalize_storage(name: &str, storage: &PartialStorage, control: &Control) -> Storage {
    storage.finalize_common(name, EngineType::Uuid, control)
}

#[derive(Debug)]
pub(crate) struct UuidCodec;

impl Codec for UuidCodec {
    fn expected(&self) -> &'static str {
        "as a UUID string"
    }

    fn decode_json(&self, input: &JsonValue) -> Result<Value, CoercionErrorKind> {
        match input {
            JsonValue::String(s) => self.decode_token(s),
            _ => Err(self.shape()),
        }
    }

    fn decode_token(&self, input: &str) -> Result<Value, CoercionErrorKind> {
        Uuid::parse_str(input.trim())
            .map(Value::Uuid)
            .map_err(|_| self.shape())
    }

    fn decode_value(&self, input: &Value) -> Result<Value, CoercionErrorKind> {
        match input {
            Value::Uuid(_) => Ok(input.clone()),
            Value::Text(s) => self.decode_token(s),
            _ => Err(self.shape()),
        }
    }

    fn encode_json(&self, value: &Value) -> JsonValue {
        JsonValue::String(value.to_string())
    }
}
