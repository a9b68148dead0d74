// Error types for schemas and type checking

use dv_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use dv_source_map::SourceInfo;
use std::fmt;
use thiserror::Error;

/// Errors raised by schema construction or by the permission check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Data values were supplied but the schema declares no values.
    #[error("data values were given but {reason}")]
    ValuesNotPermitted { reason: String },

    /// The schema document itself is malformed.
    #[error("invalid schema at {path}: {message}")]
    InvalidSchema {
        path: String,
        message: String,
        location: SourceInfo,
    },
}

impl SchemaError {
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            SchemaError::ValuesNotPermitted { reason } => {
                DiagnosticMessageBuilder::error("Data Values Not Permitted")
                    .with_code("DV-4-1")
                    .problem(format!("Data values were given but {}", reason))
                    .add_hint("Declare the values in a `#@data/values-schema` document?")
                    .build()
            }
            SchemaError::InvalidSchema {
                path,
                message,
                location,
            } => DiagnosticMessageBuilder::error("Invalid Schema")
                .with_code("DV-4-4")
                .problem(format!("Schema for `{}` is invalid", path))
                .add_detail(message.clone())
                .with_location(location.clone())
                .build(),
        }
    }
}

/// Path of a value inside a document (e.g., `servers[0].port`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePath {
    segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl InstancePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    /// Key present in the values but not declared in the schema.
    UndeclaredKey { key: String },

    /// Value of the wrong type.
    TypeMismatch { expected: String, found: String },

    /// Null given for a slot that is not `schema/nullable`.
    NullNotAllowed { expected: String },
}

impl ViolationKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            ViolationKind::UndeclaredKey { .. } => "DV-4-2",
            ViolationKind::TypeMismatch { .. } | ViolationKind::NullNotAllowed { .. } => "DV-4-3",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ViolationKind::UndeclaredKey { key } => {
                format!("Key `{}` is not declared in the schema", key)
            }
            ViolationKind::TypeMismatch { expected, found } => {
                format!("Expected {}, got {}", expected, found)
            }
            ViolationKind::NullNotAllowed { expected } => {
                format!("Expected {}, got null (value is not nullable)", expected)
            }
        }
    }
}

/// One type violation, located in the checked document.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub path: InstancePath,
    pub location: SourceInfo,
    /// Where the violated type was declared.
    pub declared_at: Option<SourceInfo>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind.message())
    }
}

impl Violation {
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let title = match self.kind {
            ViolationKind::UndeclaredKey { .. } => "Undeclared Key",
            _ => "Type Mismatch",
        };
        let mut builder = DiagnosticMessageBuilder::error(title)
            .with_code(self.kind.error_code())
            .problem(format!("`{}`: {}", self.path, self.kind.message()))
            .with_location(self.location.clone());
        if let Some(declared_at) = &self.declared_at {
            builder = builder.add_detail_at("declared in the schema here", declared_at.clone());
        }
        builder.build()
    }
}

/// Outcome of a type assignment or check: every violation found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeCheck {
    pub violations: Vec<Violation>,
}

impl TypeCheck {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn to_diagnostics(&self) -> Vec<DiagnosticMessage> {
        self.violations.iter().map(Violation::to_diagnostic).collect()
    }
}

impl fmt::Display for TypeCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_path_display() {
        let mut path = InstancePath::new();
        assert_eq!(path.to_string(), "(root)");
        path.push_key("servers");
        path.push_index(1);
        path.push_key("port");
        assert_eq!(path.to_string(), "servers[1].port");
        path.pop();
        assert_eq!(path.to_string(), "servers[1]");
    }

    #[test]
    fn test_violation_codes() {
        assert_eq!(
            ViolationKind::UndeclaredKey { key: "x".into() }.error_code(),
            "DV-4-2"
        );
        assert_eq!(
            ViolationKind::NullNotAllowed {
                expected: "int".into()
            }
            .error_code(),
            "DV-4-3"
        );
    }
}
