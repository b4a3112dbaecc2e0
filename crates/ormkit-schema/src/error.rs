//! Error types.

use crate::attribute::AttributeKind;
use crate::schema::RecordError;
use thiserror::Error;

/// Top-level errors surfaced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The declaration itself is malformed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A value failed validation at one coercion boundary.
    #[error("coercion error: {0}")]
    Coercion(#[from] CoercionError),

    /// A JSON declaration file could not be parsed.
    #[error("declaration error: {0}")]
    Declaration(#[from] serde_json::Error),

    /// A whole record failed coercion.
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Schema-invalid errors raised while building or finalizing declarations.
///
/// These abort assembly; every variant names the offending entity or attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A relationship names an entity that was neither declared nor synthesized.
    #[error("relationship `{entity}.{relationship}` targets unknown entity `{target}`")]
    UnknownTarget {
        /// Entity declaring the relationship.
        entity: String,
        /// Relationship name.
        relationship: String,
        /// The missing entity name.
        target: String,
    },

    /// An entity name that is not present in the entity map.
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),

    /// An enumeration attribute was declared without any allowed values.
    #[error("{attribute}: enumeration declares no values")]
    EmptyEnumeration {
        /// Attribute label.
        attribute: String,
    },

    /// Locally malformed attribute constraints.
    #[error("{attribute}: {reason}")]
    InvalidAttribute {
        /// Attribute label.
        attribute: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two declarations share an entity name.
    #[error("duplicate entity `{0}`")]
    DuplicateEntity(String),

    /// More than one attribute claims to be the primary identifier.
    #[error("entity `{entity}` declares multiple primary keys: `{first}` and `{second}`")]
    MultiplePrimaryKeys {
        /// Entity name.
        entity: String,
        /// First primary attribute.
        first: String,
        /// Second primary attribute.
        second: String,
    },

    /// A name is already taken within an entity.
    #[error("entity `{entity}`: `{name}` {reason}")]
    NameCollision {
        /// Entity name.
        entity: String,
        /// The colliding name.
        name: String,
        /// What it collides with.
        reason: String,
    },

    /// A pre-existing foreign key attribute does not match the referenced key type.
    #[error(
        "`{entity}.{attribute}` is declared as {actual} but references `{target}` whose primary key is {expected}"
    )]
    ForeignKeyMismatch {
        /// Entity holding the foreign key.
        entity: String,
        /// Foreign key attribute.
        attribute: String,
        /// Referenced entity.
        target: String,
        /// Kind of the referenced primary key.
        expected: AttributeKind,
        /// Kind of the declared attribute.
        actual: AttributeKind,
    },

    /// A foreign key would reference an entity identified by a composite key.
    #[error("relationship `{entity}.{relationship}` cannot reference `{target}`: it has a composite primary key")]
    CompositeReference {
        /// Entity declaring the relationship.
        entity: String,
        /// Relationship name.
        relationship: String,
        /// Entity with the composite key.
        target: String,
    },

    /// A join entity is reused for a different pair of endpoints.
    #[error(
        "join entity `{name}` links `{left}` and `{right}` and cannot also link `{requested_left}` and `{requested_right}`"
    )]
    JoinConflict {
        /// Join entity name.
        name: String,
        /// Existing first endpoint.
        left: String,
        /// Existing second endpoint.
        right: String,
        /// Requested first endpoint.
        requested_left: String,
        /// Requested second endpoint.
        requested_right: String,
    },

    /// The UI label attribute does not exist on the entity.
    #[error("entity `{entity}`: label attribute `{attribute}` is not declared")]
    UnknownLabel {
        /// Entity name.
        entity: String,
        /// Missing attribute.
        attribute: String,
    },

    /// A builder error re-raised with its declaration context.
    #[error("entity `{entity}`, attribute `{attribute}`: {source}")]
    InDeclaration {
        /// Entity name.
        entity: String,
        /// Attribute name.
        attribute: String,
        /// The underlying error.
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// Attach entity/attribute context to an error raised by a builder or finalizer.
    pub fn in_declaration(self, entity: &str, attribute: &str) -> Self {
        SchemaError::InDeclaration {
            entity: entity.to_string(),
            attribute: attribute.to_string(),
            source: Box::new(self),
        }
    }

    pub(crate) fn invalid(attribute: &str, reason: impl Into<String>) -> Self {
        SchemaError::InvalidAttribute {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}

/// A value rejected by one coercion function of one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{attribute}`: {kind}")]
pub struct CoercionError {
    /// Attribute name.
    pub attribute: String,
    /// Which check failed.
    pub kind: CoercionErrorKind,
}

impl CoercionError {
    /// Create a new coercion error.
    pub fn new(attribute: impl Into<String>, kind: CoercionErrorKind) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
        }
    }
}

/// Kinds of coercion failures, in the order the checks run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionErrorKind {
    /// No value was supplied and the attribute has neither a default nor nullability.
    #[error("non-undefined value required")]
    Undefined,

    /// `null` was supplied for a non-nullable attribute.
    #[error("non-null value required")]
    Null,

    /// The value has the wrong type or shape.
    #[error("value required {expected}")]
    Shape {
        /// Expected shape, e.g. "as a boolean".
        expected: &'static str,
    },

    /// NaN or an infinity was supplied to a numeric attribute.
    #[error("finite value required")]
    NonFinite,

    /// A numeric value outside +/-(2^53 - 1).
    #[error("value required within the safe integer range")]
    UnsafeInteger,

    /// A range, length, pattern or membership constraint failed.
    #[error("value required {constraint}")]
    Bound {
        /// The violated constraint, e.g. "less than or equal to 1000".
        constraint: String,
    },

    /// The value is not a whole number of steps from its anchor.
    #[error("value required as multiples of {step}{}", anchor_suffix(.anchor))]
    Step {
        /// Step size.
        step: String,
        /// Minimum the steps are counted from, if any.
        anchor: Option<String>,
    },

    /// A read-only attribute was assigned through the storage-write path.
    #[error("read-only attribute cannot be assigned")]
    ReadOnly,
}

fn anchor_suffix(anchor: &Option<String>) -> String {
    match anchor {
        Some(anchor) => format!(" starting from {anchor}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_error_messages() {
        let err = CoercionError::new(
            "age",
            CoercionErrorKind::Bound {
                constraint: "less than or equal to 1000".into(),
            },
        );
        assert_eq!(err.to_string(), "`age`: value required less than or equal to 1000");

        let err = CoercionError::new(
            "age",
            CoercionErrorKind::Step {
                step: "5".into(),
                anchor: Some("3".into()),
            },
        );
        assert_eq!(
            err.to_string(),
            "`age`: value required as multiples of 5 starting from 3"
        );
    }

    #[test]
    fn test_in_declaration_wraps_context() {
        let err = SchemaError::EmptyEnumeration {
            attribute: "enumeration".into(),
        }
        .in_declaration("User", "role");

        let message = err.to_string();
        assert!(message.contains("User"));
        assert!(message.contains("role"));
        assert!(message.contains("enumeration declares no values"));
    }
}
