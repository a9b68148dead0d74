//! Schemas for data values.
//!
//! A schema is itself a YAML document annotated with `#@data/values-schema`.
//! Its values are the defaults, their shapes are the types:
//!
//! ```yaml
//! #@data/values-schema
//! ---
//! replicas: 1
//! #@schema/nullable
//! owner: ""
//! ports:
//! - 80
//! ```
//!
//! declares an int `replicas` defaulting to 1, a string `owner` defaulting to
//! null and an array of ints `ports` defaulting to `[]`.
//!
//! The merge pipeline talks to schemas through the [`SchemaBinding`] trait and
//! never needs to know which kind of schema is bound.

mod binding;
mod document_schema;
mod error;
mod typing;
mod types;

pub use binding::{MissingSchema, NullSchema, SchemaBinding};
pub use document_schema::DocumentSchema;
pub use error::{InstancePath, PathSegment, SchemaError, TypeCheck, Violation, ViolationKind};
pub use typing::TypedDocument;
pub use types::{ScalarType, SchemaNode, SchemaType};

/// Document tag for schema documents.
pub const SCHEMA_TAG: &str = "data/values-schema";
pub const NULLABLE: &str = "schema/nullable";
pub const TYPE: &str = "schema/type";
pub const DESC: &str = "schema/desc";
