//! Enumerated string attributes.

use crate::attribute::coerce::Codec;
use crate::attribute::facet::{Constraints, Control, EngineType, PartialControl, PartialStorage, Storage};
use crate::error::{CoercionErrorKind, SchemaError};
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::collections::HashSet;

pub(crate) fn validate(label: &str, values: &[String]) -> Result<(), SchemaError> {
    if values.is_empty() {
        return Err(SchemaError::EmptyEnumeration {
            attribute: label.to_string(),
        });
    }
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value.as_str()) {
            return Err(SchemaError::invalid(label, format!("duplicate enumerated value `{value}`")));
        }
    }
    Ok(())
}

pub(crate) fn finalize_control(name: &str, control: &PartialControl, values: &[String]) -> Control {
    let constraints = Constraints::Enum {
        values: values.to_vec(),
    };
    control.finalize_common(name, constraints, None)
}

pub(crate) fn finalize_storage(
    name: &str,
    storage: &PartialStorage,
    control: &Control,
    values: &[String],
) -> Storage {
    let engine_type = EngineType::Enum {
        values: values.to_vec(),
    };
    storage.finalize_common(name, engine_type, control)
}

#[derive(Debug)]
pub(crate) struct EnumCodec {
    values: Vec<String>,
    case_sensitive: bool,
}

impl EnumCodec {
    pub(crate) fn new(values: Vec<String>, case_sensitive: bool) -> Self {
        Self {
            values,
            case_sensitive,
        }
    }

    /// The declared spelling of `input`, or `input` unchanged if none matches.
    fn canonical(&self, input: &str) -> Value {
        let found = if self.case_sensitive {
            self.values.iter().find(|v| v.as_str() == input)
        } else {
            self.values.iter().find(|v| v.eq_ignore_ascii_case(input))
        };
        Value::Text(found.map_or_else(|| input.to_string(), Clone::clone))
    }
}

impl Codec for EnumCodec {
    fn expected(&self) -> &'static str {
        "as a string"
    }

    fn decode_json(&self, input: &JsonValue) -> Result<Value, CoercionErrorKind> {
        input
            .as_str()
            .map(|s| self.canonical(s))
            .ok_or_else(|| self.shape())
    }

    fn decode_token(&self, input: &str) -> Result<Value, CoercionErrorKind> {
        Ok(self.canonical(input))
    }

    fn decode_value(&self, input: &Value) -> Result<Value, CoercionErrorKind> {
        input
            .as_str()
            .map(|s| self.canonical(s))
            .ok_or_else(|| self.shape())
    }

    fn encode_json(&self, value: &Value) -> JsonValue {
        JsonValue::String(value.to_string())
    }

    fn check(&self, value: &Value) -> Result<(), CoercionErrorKind> {
        match value.as_str() {
            Some(s) if self.values.iter().any(|v| v == s) => Ok(()),
            _ => Err(CoercionErrorKind::Bound {
                constraint: format!("one of the enumerated values ({})", self.values.join(", ")),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> Vec<String> {
        vec!["admin".into(), "member".into()]
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            validate("enumeration", &[]),
            Err(SchemaError::EmptyEnumeration {
                attribute: "enumeration".into()
            })
        );
        assert!(validate("enumeration", &["a".into(), "a".into()]).is_err());
        assert!(validate("enumeration", &roles()).is_ok());
    }

    #[test]
    fn test_membership() {
        let c = EnumCodec::new(roles(), true);
        let decoded = c.decode_token("admin").unwrap();
        assert!(c.check(&decoded).is_ok());

        let decoded = c.decode_token("Admin").unwrap();
        assert_eq!(
            c.check(&decoded),
            Err(CoercionErrorKind::Bound {
                constraint: "one of the enumerated values (admin, member)".into()
            })
        );
    }

    #[test]
    fn test_case_insensitive_canonicalizes() {
        let c = EnumCodec::new(roles(), false);
        let decoded = c.decode_json(&serde_json::json!("MEMBER")).unwrap();
        assert_eq!(decoded, Value::Text("member".into()));
        assert!(c.check(&decoded).is_ok());
    }
}
