//! Error types for annotated YAML parsing.

use dv_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use dv_source_map::SourceInfo;

/// Result type alias for dv-yaml operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The scanner rejected the input.
    #[error("YAML syntax error: {message}")]
    Syntax {
        message: String,
        location: SourceInfo,
    },

    /// Valid YAML that data values cannot represent (aliases, complex keys,
    /// template code).
    #[error("unsupported YAML: {message}")]
    Unsupported {
        message: String,
        location: SourceInfo,
    },

    #[error("invalid annotation `{name}`: {message}")]
    InvalidAnnotation {
        name: String,
        message: String,
        location: SourceInfo,
    },
}

impl Error {
    pub fn location(&self) -> &SourceInfo {
        match self {
            Error::Syntax { location, .. }
            | Error::Unsupported { location, .. }
            | Error::InvalidAnnotation { location, .. } => location,
        }
    }

    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = match self {
            Error::Syntax { message, .. } => DiagnosticMessageBuilder::error("YAML Syntax Error")
                .with_code("DV-1-1")
                .problem(message.clone()),
            Error::Unsupported { message, .. } => {
                DiagnosticMessageBuilder::error("Unsupported YAML Structure")
                    .with_code("DV-1-2")
                    .problem(message.clone())
            }
            Error::InvalidAnnotation { name, message, .. } => {
                DiagnosticMessageBuilder::error("Invalid Annotation")
                    .with_code("DV-1-3")
                    .problem(format!("Annotation `{}` could not be read", name))
                    .add_detail(message.clone())
            }
        };
        builder.with_location(self.location().clone()).build()
    }
}
