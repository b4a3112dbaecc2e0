//! Date-time attributes. Values are normalized to UTC; steps are in seconds.

use crate::attribute::coerce::Codec;
use crate::attribute::facet::{
    Constraints, Control, EngineType, PartialControl, PartialRange, PartialStorage, Range, Storage,
};
use crate::error::{CoercionErrorKind, SchemaError};
use crate::value::Value;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use std::ops::Bound;

pub(crate) fn validate(label: &str, range: &PartialRange<DateTime<Utc>, i64>) -> Result<(), SchemaError> {
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
    range: &PartialRange<DateTime<Utc>, i64>,
) -> Control {
    control.finalize_common(name, Constraints::DateTime(range.finalize()), None)
}

pub(crate) fn finalize_storage(name: &str, storage: &PartialStorage, control: &Control) -> Storage {
    storage.finalize_common(name, EngineType::Timestamp, control)
}

fn render(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug)]
pub(crate) struct DateTimeCodec {
    range: Range<DateTime<Utc>, i64>,
}

impl DateTimeCodec {
    pub(crate) fn new(range: Range<DateTime<Utc>, i64>) -> Self {
        Self { range }
    }
}

impl Codec for DateTimeCodec {
    fn expected(&self) -> &'static str {
        "as an ISO-8601 date-time string"
    }

    fn decode_json(&self, input: &JsonValue) -> Result<Value, CoercionErrorKind> {
        match input {
            JsonValue::String(s) => self.decode_token(s),
            _ => Err(self.shape()),
        }
    }

    fn decode_token(&self, input: &str) -> Result<Value, CoercionErrorKind> {
        DateTime::parse_from_rfc3339(input.trim())
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
            .map_err(|_| self.shape())
    }

    fn decode_value(&self, input: &Value) -> Result<Value, CoercionErrorKind> {
        match input {
            Value::DateTime(_) => Ok(input.clone()),
            Value::Text(s) => self.decode_token(s),
            _ => Err(self.shape()),
        }
    }

    fn encode_json(&self, value: &Value) -> JsonValue {
        JsonValue::String(value.to_string())
    }

    fn check(&self, value: &Value) -> Result<(), CoercionErrorKind> {
        let Some(instant) = value.as_date_time() else {
            return Err(self.shape());
        };
        if let Bound::Included(min) = self.range.min {
            if instant < min {
                return Err(CoercionErrorKind::Bound {
                    constraint: format!("at or after {}", render(&min)),
                });
            }
        }
        if let Bound::Included(max) = self.range.max {
            if instant > max {
                return Err(CoercionErrorKind::Bound {
                    constraint: format!("at or before {}", render(&max)),
                });
            }
        }
        if let Some(step) = self.range.step {
            let anchor = self.range.anchor().copied();
            let origin = anchor.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            let offset = (instant - origin).num_milliseconds();
            if offset % step.saturating_mul(1000) != 0 {
                return Err(CoercionErrorKind::Step {
                    step: format!("{step} seconds"),
                    anchor: anchor.as_ref().map(render),
                });
            }
        }
        Ok(())
    }
}
