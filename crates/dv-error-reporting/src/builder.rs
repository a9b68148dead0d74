//! Builder API for diagnostic messages.

use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage};
use dv_source_map::SourceInfo;

/// Builder for creating diagnostic messages.
///
/// ```
/// use dv_error_reporting::DiagnosticMessageBuilder;
///
/// let error = DiagnosticMessageBuilder::error("Type Mismatch")
///     .with_code("DV-4-3")
///     .problem("`replicas` must be an int")
///     .add_detail("`replicas` is a string in `prod.yml`")
///     .add_hint("Remove the quotes around the number?")
///     .build();
///
/// assert_eq!(error.details.len(), 1);
/// assert_eq!(error.hints.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    kind: DiagnosticKind,
    title: String,
    code: Option<String>,
    problem: Option<String>,
    details: Vec<DetailItem>,
    hints: Vec<String>,
    location: Option<SourceInfo>,
}

impl DiagnosticMessageBuilder {
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            code: None,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    /// Set the error code (`DV-<subsystem>-<number>`).
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the problem statement.
    pub fn problem(mut self, stmt: impl Into<String>) -> Self {
        self.problem = Some(stmt.into());
        self
    }

    /// Add an error detail without a location.
    pub fn add_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(DetailItem {
            kind: DetailKind::Error,
            content: detail.into(),
            location: None,
        });
        self
    }

    /// Add an error detail pointing at a source location.
    pub fn add_detail_at(mut self, detail: impl Into<String>, location: SourceInfo) -> Self {
        self.details.push(DetailItem {
            kind: DetailKind::Error,
            content: detail.into(),
            location: Some(location),
        });
        self
    }

    /// Add an info detail.
    pub fn add_info(mut self, info: impl Into<String>) -> Self {
        self.details.push(DetailItem {
            kind: DetailKind::Info,
            content: info.into(),
            location: None,
        });
        self
    }

    pub fn add_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn with_location(mut self, location: SourceInfo) -> Self {
        self.location = Some(location);
        self
    }

    pub fn build(self) -> DiagnosticMessage {
        DiagnosticMessage {
            code: self.code,
            title: self.title,
            kind: self.kind,
            problem: self.problem,
            details: self.details,
            hints: self.hints,
            location: self.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_everything() {
        let msg = DiagnosticMessageBuilder::warning("Unknown Annotation")
            .with_code("DV-2-3")
            .problem("Annotation `foo/bar` is not recognized")
            .add_detail("on the first document of `values.yml`")
            .add_info("Unknown annotations are ignored with --ignore-unknown-comments")
            .with_location(SourceInfo::generated("test"))
            .build();

        assert_eq!(msg.kind, DiagnosticKind::Warning);
        assert_eq!(msg.code.as_deref(), Some("DV-2-3"));
        assert_eq!(msg.details.len(), 2);
        assert_eq!(msg.details[1].kind, DetailKind::Info);
        assert!(msg.location.is_some());
    }
}
