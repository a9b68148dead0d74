//! Error types for data values pre-processing

use crate::render::RenderFailure;
use dv_error_reporting::{DetailItem, DetailKind, DiagnosticMessage, DiagnosticMessageBuilder};
use dv_overlay::OverlayError;
use dv_schema::{SchemaError, TypeCheck};
use dv_source_map::SourceInfo;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ValuesError>;

/// Every error is fatal to the resolution of the current library.
#[derive(Debug, Error)]
pub enum ValuesError {
    /// Rendering a file failed.
    #[error("Templating file '{path}': {source}")]
    Render {
        path: String,
        #[source]
        source: RenderFailure,
    },

    /// A data values file holds a non-empty document that is not data values.
    #[error("Expected data values file '{path}' to only have data values documents")]
    MixedContent { path: String, location: SourceInfo },

    /// An explicit root value was given but the schema forbids root values.
    #[error("{origin}: {source}")]
    SchemaPermission {
        origin: String,
        #[source]
        source: SchemaError,
    },

    /// The schema documents could not be turned into a schema.
    #[error(transparent)]
    InvalidSchema(SchemaError),

    /// The overlay engine could not reconcile two documents.
    #[error("{origin}: {source}")]
    Overlay {
        origin: String,
        #[source]
        source: OverlayError,
    },

    /// Type violations after a merge step; carries all of them.
    #[error("{origin}: type check failed:\n{check}")]
    TypeViolation { origin: String, check: TypeCheck },

    #[error("Unknown annotation '{name}'")]
    UnknownAnnotation { name: String, location: SourceInfo },

    /// A document-level annotation was found on a nested node.
    #[error("Annotation '{name}' is only allowed on documents")]
    MisplacedAnnotation { name: String, location: SourceInfo },

    #[error("Invalid library reference '{value}': {reason}")]
    InvalidLibraryRef {
        value: String,
        reason: String,
        location: SourceInfo,
    },

    /// A malformed `KEY=VALUE` argument.
    #[error("Invalid data value argument '{arg}': {reason}")]
    InvalidKeyValue { arg: String, reason: String },

    #[error("YAML error in {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: dv_yaml::Error,
    },

    #[error("Reading '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Any merge error, with the order in which values were overlaid.
    #[error("Overlaying data values (in following order: {}): {source}", order.join(", "))]
    InOrder {
        order: Vec<String>,
        #[source]
        source: Box<ValuesError>,
    },
}

impl ValuesError {
    /// The innermost error, without ordering context.
    pub fn root_cause(&self) -> &ValuesError {
        match self {
            ValuesError::InOrder { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn to_diagnostics(&self) -> Vec<DiagnosticMessage> {
        match self {
            ValuesError::Render { path, source } => {
                let mut diagnostic = match source {
                    RenderFailure::Yaml(err) => err.to_diagnostic(),
                    RenderFailure::Engine { message } => {
                        DiagnosticMessageBuilder::error("Templating Failed")
                            .with_code("DV-2-1")
                            .problem(message.clone())
                            .build()
                    }
                };
                push_info(&mut diagnostic, format!("while templating '{}'", path));
                vec![diagnostic]
            }
            ValuesError::MixedContent { path, location } => vec![
                DiagnosticMessageBuilder::error("Mixed Content In Data Values File")
                    .with_code("DV-2-2")
                    .problem(format!(
                        "Expected data values file '{}' to only have data values documents",
                        path
                    ))
                    .with_location(location.clone())
                    .add_hint("Annotate the document with `#@data/values` or move it to a template file?")
                    .build(),
            ],
            ValuesError::SchemaPermission { origin, source } => {
                let mut diagnostic = source.to_diagnostic();
                push_info(&mut diagnostic, format!("values given by {}", origin));
                vec![diagnostic]
            }
            ValuesError::InvalidSchema(source) => vec![source.to_diagnostic()],
            ValuesError::Overlay { origin, source } => {
                let mut diagnostic = source.to_diagnostic();
                push_info(&mut diagnostic, format!("while overlaying {}", origin));
                vec![diagnostic]
            }
            ValuesError::TypeViolation { origin, check } => check
                .to_diagnostics()
                .into_iter()
                .map(|mut diagnostic| {
                    push_info(&mut diagnostic, format!("after merging {}", origin));
                    diagnostic
                })
                .collect(),
            ValuesError::UnknownAnnotation { name, location } => vec![
                DiagnosticMessageBuilder::error("Unknown Annotation")
                    .with_code("DV-2-3")
                    .problem(format!("Annotation `{}` is not recognized", name))
                    .with_location(location.clone())
                    .add_hint("Pass --ignore-unknown-comments to skip annotations from other tools?")
                    .build(),
            ],
            ValuesError::MisplacedAnnotation { name, location } => vec![
                DiagnosticMessageBuilder::error("Misplaced Annotation")
                    .with_code("DV-2-4")
                    .problem(format!("Annotation `{}` must annotate a document", name))
                    .with_location(location.clone())
                    .add_hint("Put the annotation right above a `---` line?")
                    .build(),
            ],
            ValuesError::InvalidLibraryRef {
                value,
                reason,
                location,
            } => vec![
                DiagnosticMessageBuilder::error("Invalid Library Reference")
                    .with_code("DV-2-5")
                    .problem(format!("`{}` is not a valid library reference", value))
                    .add_detail(reason.clone())
                    .with_location(location.clone())
                    .build(),
            ],
            ValuesError::Yaml { source, .. } => vec![source.to_diagnostic()],
            ValuesError::InvalidKeyValue { .. } => vec![
                DiagnosticMessageBuilder::error("Invalid Data Value Argument")
                    .with_code("DV-5-1")
                    .problem(self.to_string())
                    .add_hint("Data values are given as `KEY=VALUE`, with nested keys separated by `.`?")
                    .build(),
            ],
            ValuesError::Io { .. } => vec![
                DiagnosticMessageBuilder::error("File Read Error")
                    .with_code("DV-5-2")
                    .problem(self.to_string())
                    .build(),
            ],
            ValuesError::InOrder { order, source } => {
                let mut diagnostics = source.to_diagnostics();
                if let Some(first) = diagnostics.first_mut() {
                    push_info(
                        first,
                        format!("data values were overlaid in this order: {}", order.join(", ")),
                    );
                }
                diagnostics
            }
        }
    }
}

fn push_info(diagnostic: &mut DiagnosticMessage, content: String) {
    diagnostic.details.push(DetailItem {
        kind: DetailKind::Info,
        content,
        location: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_order(source: ValuesError) -> ValuesError {
        ValuesError::InOrder {
            order: vec!["a.yml".to_string(), "b.yml".to_string()],
            source: Box::new(source),
        }
    }

    #[test]
    fn test_root_cause_unwraps_order() {
        let err = in_order(ValuesError::InvalidKeyValue {
            arg: "x".to_string(),
            reason: "expected format key=value".to_string(),
        });
        assert!(matches!(err.root_cause(), ValuesError::InvalidKeyValue { .. }));
        assert_eq!(
            err.to_string(),
            "Overlaying data values (in following order: a.yml, b.yml): \
             Invalid data value argument 'x': expected format key=value"
        );
    }

    #[test]
    fn test_order_is_reported_once() {
        let err = in_order(ValuesError::MixedContent {
            path: "a.yml".to_string(),
            location: SourceInfo::unknown(),
        });
        let diagnostics = err.to_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_deref(), Some("DV-2-2"));
        let info: Vec<_> = diagnostics[0]
            .details
            .iter()
            .filter(|d| d.kind == DetailKind::Info)
            .collect();
        assert_eq!(info.len(), 1);
        assert!(info[0].content.contains("a.yml, b.yml"));
    }

    #[test]
    fn test_empty_type_check_has_no_diagnostics() {
        let err = ValuesError::TypeViolation {
            origin: "b.yml".to_string(),
            check: TypeCheck::ok(),
        };
        assert!(err.to_diagnostics().is_empty());
    }
}
