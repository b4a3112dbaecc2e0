//! Per-kind validation, defaulting and codecs.

mod boolean;
mod date;
mod datetime;
mod enumeration;
mod identifier;
mod integer;
mod number;
mod string;

pub use integer::MAX_SAFE_INTEGER;

use super::coerce::{Codec, CoercionContract, Coercer, Rules};
use super::facet::{Constraints, Control, EngineType, PartialConstraints, PartialControl, PartialStorage, Storage};
use crate::config::SchemaConfig;
use crate::error::SchemaError;
use std::sync::Arc;

/// Local shape checks. Runs at build time and again at finalization.
pub(crate) fn validate(
    label: &str,
    control: &PartialControl,
    storage: &PartialStorage,
) -> Result<(), SchemaError> {
    if control.max_display_length == Some(0) {
        return Err(SchemaError::invalid(label, "max display length must be positive"));
    }
    match &control.constraints {
        PartialConstraints::Text(c) | PartialConstraints::String(c) => string::validate(label, c, storage),
        PartialConstraints::Integer(r) => integer::validate(label, r),
        PartialConstraints::Number(r) => number::validate(label, r),
        PartialConstraints::Date(r) => date::validate(label, r),
        PartialConstraints::DateTime(r) => datetime::validate(label, r),
        PartialConstraints::Enum { values } => enumeration::validate(label, values),
        PartialConstraints::Boolean | PartialConstraints::Uuid => Ok(()),
    }
}

/// Both facets with every field resolved, plus the coercion functions.
pub(crate) struct Finalized {
    pub control: Control,
    pub storage: Storage,
    pub coercion: Arc<dyn CoercionContract>,
}

pub(crate) fn finalize(
    name: &str,
    label: &str,
    control: &PartialControl,
    storage: &PartialStorage,
    config: &SchemaConfig,
) -> Result<Finalized, SchemaError> {
    validate(label, control, storage)?;

    let (control, storage) = match &control.constraints {
        PartialConstraints::Text(c) => {
            let control = string::finalize_control(name, control, c, Constraints::Text);
            let storage = string::finalize_text_storage(name, storage, &control);
            (control, storage)
        }
        PartialConstraints::String(c) => {
            let control = string::finalize_control(name, control, c, Constraints::String);
            let storage = string::finalize_string_storage(name, storage, &control, config);
            (control, storage)
        }
        PartialConstraints::Integer(r) => {
            let control = integer::finalize_control(name, control, r);
            let storage = integer::finalize_storage(name, storage, &control);
            (control, storage)
        }
        PartialConstraints::Number(r) => {
            let control = number::finalize_control(name, control, r);
            let storage = number::finalize_storage(name, storage, &control);
            (control, storage)
        }
        PartialConstraints::Boolean => {
            let control = boolean::finalize_control(name, control);
            let storage = boolean::finalize_storage(name, storage, &control);
            (control, storage)
        }
        PartialConstraints::Date(r) => {
            let control = date::finalize_control(name, control, r);
            let storage = date::finalize_storage(name, storage, &control);
            (control, storage)
        }
        PartialConstraints::DateTime(r) => {
            let control = datetime::finalize_control(name, control, r);
            let storage = datetime::finalize_storage(name, storage, &control);
            (control, storage)
        }
        PartialConstraints::Enum { values } => {
            let control = enumeration::finalize_control(name, control, values);
            let storage = enumeration::finalize_storage(name, storage, &control, values);
            (control, storage)
        }
        PartialConstraints::Uuid => {
            let control = identifier::finalize_control(name, control);
            let storage = identifier::finalize_storage(name, storage, &control);
            (control, storage)
        }
    };

    let rules = Rules {
        attribute: name.to_string(),
        nullable: control.nullable,
        read_only: control.read_only,
        default: control.default.clone(),
    };
    let coercion = match &control.constraints {
        Constraints::Text(c) => coercer(label, rules, string::StringCodec::new(c, None)),
        Constraints::String(c) => {
            let length = match storage.engine_type {
                EngineType::VarChar { length } => Some(length),
                _ => None,
            };
            coercer(label, rules, string::StringCodec::new(c, length))
        }
        Constraints::Integer(r) => coercer(label, rules, integer::IntegerCodec::new(r.clone())),
        Constraints::Number(r) => coercer(label, rules, number::NumberCodec::new(r.clone())),
        Constraints::Boolean => coercer(label, rules, boolean::BooleanCodec),
        Constraints::Date(r) => coercer(label, rules, date::DateCodec::new(r.clone())),
        Constraints::DateTime(r) => coercer(label, rules, datetime::DateTimeCodec::new(r.clone())),
        Constraints::Enum { values } => coercer(
            label,
            rules,
            enumeration::EnumCodec::new(values.clone(), control.case_sensitive),
        ),
        Constraints::Uuid => coercer(label, rules, identifier::UuidCodec),
    }?;

    Ok(Finalized {
        control,
        storage,
        coercion,
    })
}

fn coercer<C: Codec + 'static>(
    label: &str,
    rules: Rules,
    codec: C,
) -> Result<Arc<dyn CoercionContract>, SchemaError> {
    let coercer = Coercer::new(rules, codec);
    coercer
        .check_default()
        .map_err(|kind| SchemaError::invalid(label, format!("default value rejected: {kind}")))?;
    Ok(Arc::new(coercer))
}
