//! ORMKit Schema - declarative entity schemas and their finalization.
//!
//! Application authors describe entities with partial attribute and
//! relationship declarations. [`finalize`] resolves them into a consistent,
//! cross-referenced [`Schema`] whose attributes carry the coercion functions
//! used by the storage, query and client layers.

pub mod attribute;
pub mod config;
pub mod declaration;
pub mod error;
pub mod naming;
pub mod relationship;
pub mod schema;
pub mod value;

pub use attribute::{
    boolean, date, date_time, enumeration, integer, number, string, text, uuid, Attribute,
    AttributeBuilder, AttributeKind, CoercionContract, Constraints, Control, EngineType, Length,
    PartialAttribute, PartialConstraints, PartialControl, PartialStorage, Storage,
};
pub use config::SchemaConfig;
pub use declaration::SchemaFile;
pub use error::{CoercionError, CoercionErrorKind, Error, SchemaError};
pub use relationship::{PartialJoin, PartialLink, PartialRelationship, Relationship};
pub use schema::{
    finalize, finalize_with, Entity, EntityDecl, EntityMap, Origin, PrimaryKey, Record,
    RecordError, Schema,
};
pub use value::{DefaultValue, Generator, Value};
