//! Overlay errors.

use dv_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use dv_source_map::SourceInfo;
use thiserror::Error;

/// Errors raised while overlaying one document set onto another.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverlayError {
    /// A right node found no counterpart and missing matches were not allowed.
    #[error("expected `{path}` to match exactly one node in the base document, but found none")]
    MissingMatch { path: String, location: SourceInfo },

    /// A `by=` match found several candidates.
    #[error("expected `{path}` to match exactly one node in the base document, but found {count}")]
    AmbiguousMatch {
        path: String,
        count: usize,
        location: SourceInfo,
    },

    /// Exact matching was requested but the left set has no documents.
    #[error("there is no document to overlay onto")]
    NoLeftDocument { location: SourceInfo },

    #[error("invalid overlay directive on `{path}`: {message}")]
    InvalidDirective {
        path: String,
        message: String,
        location: SourceInfo,
    },
}

impl OverlayError {
    pub fn location(&self) -> &SourceInfo {
        match self {
            OverlayError::MissingMatch { location, .. }
            | OverlayError::AmbiguousMatch { location, .. }
            | OverlayError::NoLeftDocument { location }
            | OverlayError::InvalidDirective { location, .. } => location,
        }
    }

    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = match self {
            OverlayError::MissingMatch { path, .. } => {
                DiagnosticMessageBuilder::error("Missing Overlay Match")
                    .with_code("DV-3-1")
                    .problem(format!("`{}` does not exist in the values it overrides", path))
                    .add_hint(
                        "Check the key for typos, or annotate it with `#@overlay/match missing_ok=True` to add it?",
                    )
            }
            OverlayError::AmbiguousMatch { path, count, .. } => {
                DiagnosticMessageBuilder::error("Ambiguous Overlay Match")
                    .with_code("DV-3-2")
                    .problem(format!("`{}` matched {} array items", path, count))
                    .add_hint("Make the `by=` key unique among the array items?")
            }
            OverlayError::NoLeftDocument { .. } => {
                DiagnosticMessageBuilder::error("Nothing To Overlay Onto")
                    .with_code("DV-3-3")
                    .problem("There is no base document to apply the overlay to")
            }
            OverlayError::InvalidDirective { path, message, .. } => {
                DiagnosticMessageBuilder::error("Invalid Overlay Directive")
                    .with_code("DV-3-4")
                    .problem(format!("Overlay annotation on `{}` is invalid", path))
                    .add_detail(message.clone())
            }
        };
        builder.with_location(self.location().clone()).build()
    }
}
