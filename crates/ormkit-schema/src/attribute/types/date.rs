//! Calendar date attributes. Steps are counted in days.

use crate::attribute::coerce::Codec;
use crate::attribute::facet::{
    Constraints, Control, EngineType, PartialControl, PartialRange, PartialStorage, Range, Storage,
};
use crate::error::{CoercionErrorKind, SchemaError};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use std::ops::Bound;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn validate(label: &str, range: &PartialRange<NaiveDate, i64>) -> Result<(), SchemaError> {
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

pub(crate) fn finalize_control(
    name: &str,
    control: &PartialControl,
    range: &PartialRange<NaiveDate, i64>,
) -> Control {
    control.finalize_common(name, Constraints::Date(range.finalize()), None)
}

pub(crate) fn finalize_storage(name: &str, storage: &PartialStorage, control: &Control) -> Storage {
    storage.finalize_common(name, EngineType::Date, control)
}

#[derive(Debug)]
pub(crate) struct DateCodec {
    range: Range<NaiveDate, i64>,
}

impl DateCodec {
    pub(crate) fn new(range: Range<NaiveDate, i64>) -> Self {
        Self { range }
    }
}

impl Codec for DateCodec {
    fn expected(&self) -> &'static str {
        "as an ISO-8601 date string"
    }

    fn decode_json(&self, input: &JsonValue) -> Result<Value, CoercionErrorKind> {
        match input {
            JsonValue::String(s) => self.decode_token(s),
            _ => Err(self.shape()),
        }
    }

    fn decode_token(&self, input: &str) -> Result<Value, CoercionErrorKind> {
        NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
            .map(Value::Date)
            .map_err(|_| self.shape())
    }

    fn decode_value(&self, input: &Value) -> Result<Value, CoercionErrorKind> {
        match input {
            Value::Date(_) => Ok(input.clone()),
            Value::Text(s) => self.decode_token(s),
            _ => Err(self.shape()),
        }
    }

    fn encode_json(&self, value: &Value) -> JsonValue {
        JsonValue::String(value.to_string())
    }

    fn check(&self, value: &Value) -> Result<(), CoercionErrorKind> {
        let Some(date) = value.as_date() else {
            return Err(self.shape());
        };
        if let Bound::Included(min) = self.range.min {
            if date < min {
                return Err(CoercionErrorKind::Bound {
                    constraint: format!("on or after {min}"),
                });
            }
        }
        if let Bound::Included(max) = self.range.max {
            if date > max {
                return Err(CoercionErrorKind::Bound {
                    constraint: format!("on or before {max}"),
                });
            }
        }
        if let Some(step) = self.range.step {
            let anchor = self.range.anchor().copied();
            let origin = anchor.unwrap_or(DateTime::<Utc>::UNIX_EPOCH.date_naive());
            if (date - origin).num_days() % step != 0 {
                return Err(CoercionErrorKind::Step {
                    step: format!("{step} days"),
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

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_decode() {
        let c = DateCodec::new(PartialRange::default().finalize());
        assert_eq!(c.decode_json(&json!("2024-02-29")).unwrap(), Value::Date(ymd(2024, 2, 29)));
        assert_eq!(
            c.decode_json(&json!("2023-02-29")),
            Err(CoercionErrorKind::Shape {
                expected: "as an ISO-8601 date string"
            })
        );
        assert!(c.decode_json(&json!(20240229)).is_err());
        assert_eq!(
            c.decode_value(&Value::Text("2024-01-01".into())).unwrap(),
            Value::Date(ymd(2024, 1, 1))
        );
        assert_eq!(c.encode_json(&Value::Date(ymd(2024, 1, 1))), json!("2024-01-01"));
    }

    #[test]
    fn test_weekly_step_from_min() {
        let range = PartialRange {
            min: Some(ymd(2024, 1, 1)),
            max: Some(ymd(2024, 12, 31)),
            step: Some(7),
        };
        let c = DateCodec::new(range.finalize());
        assert!(c.check(&Value::Date(ymd(2024, 1, 8))).is_ok());
        assert_eq!(
            c.check(&Value::Date(ymd(2024, 1, 9))),
            Err(CoercionErrorKind::Step {
                step: "7 days".into(),
                anchor: Some("2024-01-01".into())
            })
        );
        assert_eq!(
            c.check(&Value::Date(ymd(2023, 12, 25))),
            Err(CoercionErrorKind::Bound {
                constraint: "on or after 2024-01-01".into()
            })
        );
    }

    #[test]
    fn test_validate() {
        let inverted = PartialRange {
            min: Some(ymd(2024, 2, 1)),
            max: Some(ymd(2024, 1, 1)),
            step: None,
        };
        assert!(validate("date", &inverted).is_err());
    }
}
