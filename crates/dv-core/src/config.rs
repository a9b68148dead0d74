//! Per-invocation options.

/// How the schema for a library is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaMode {
    /// Schema files are ignored; values are untyped.
    Disabled,
    /// Use a schema when one is declared, otherwise values are untyped.
    #[default]
    Optional,
    /// A schema must be declared; without one no data values are accepted.
    Required,
}

/// Options for one resolution. Passed explicitly, never stored globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveOptions {
    /// Ignore annotations this pipeline does not know instead of failing.
    pub ignore_unknown_annotations: bool,
    pub schema: SchemaMode,
}

impl ResolveOptions {
    pub fn with_ignore_unknown_annotations(mut self, ignore: bool) -> Self {
        self.ignore_unknown_annotations = ignore;
        self
    }

    pub fn with_schema_mode(mut self, schema: SchemaMode) -> Self {
        self.schema = schema;
        self
    }
}
