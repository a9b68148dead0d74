//! The capability interface the merge pipeline uses to talk to a schema.

use crate::error::{SchemaError, TypeCheck};
use crate::typing::TypedDocument;
use dv_yaml::ValueDocument;

/// What the merge pipeline needs from a schema.
///
/// Implementations decide whether typing is active and which defaults seed
/// the base document; callers never inspect the concrete schema kind.
pub trait SchemaBinding: std::fmt::Debug {
    /// Defaults for the current library, if the schema declares any.
    fn default_document(&self) -> Option<ValueDocument>;

    /// Fails when `count` explicit root values are not allowed.
    fn validate_root_value_permitted(&self, count: usize) -> Result<(), SchemaError>;

    /// When false, no type assignment or check ever runs.
    fn is_typing_active(&self) -> bool;

    /// Pair the nodes of `doc` with their declared types. Undeclared keys and
    /// structural mismatches are reported here.
    fn assign_types<'a>(&'a self, doc: &'a ValueDocument) -> Result<TypedDocument<'a>, TypeCheck>;
}

/// No schema: values are untyped and always permitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSchema;

impl SchemaBinding for NullSchema {
    fn default_document(&self) -> Option<ValueDocument> {
        None
    }

    fn validate_root_value_permitted(&self, _count: usize) -> Result<(), SchemaError> {
        Ok(())
    }

    fn is_typing_active(&self) -> bool {
        false
    }

    fn assign_types<'a>(&'a self, _doc: &'a ValueDocument) -> Result<TypedDocument<'a>, TypeCheck> {
        Ok(TypedDocument::untyped())
    }
}

/// A schema was required but none was declared.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingSchema;

impl SchemaBinding for MissingSchema {
    fn default_document(&self) -> Option<ValueDocument> {
        None
    }

    fn validate_root_value_permitted(&self, count: usize) -> Result<(), SchemaError> {
        if count > 0 {
            return Err(SchemaError::ValuesNotPermitted {
                reason: "a schema is required and none was declared".to_string(),
            });
        }
        Ok(())
    }

    fn is_typing_active(&self) -> bool {
        false
    }

    fn assign_types<'a>(&'a self, _doc: &'a ValueDocument) -> Result<TypedDocument<'a>, TypeCheck> {
        Ok(TypedDocument::untyped())
    }
}
