//! Core diagnostic message types.

use dv_source_map::{FileId, SourceContext, SourceInfo};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// The kind of diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// An error that prevents completion
    Error,
    /// A problem that doesn't prevent completion
    Warning,
    /// Informational message
    Info,
}

/// How detail items should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailKind {
    /// Error detail (✖ bullet)
    Error,
    /// Info detail (ℹ bullet)
    Info,
}

/// A detail item in a diagnostic message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    pub kind: DetailKind,
    pub content: String,
    /// Where in the source this detail applies, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

/// A diagnostic message.
///
/// Structure:
/// 1. **Code**: optional error code (e.g., "DV-3-1") listed in the catalog
/// 2. **Title**: brief error message
/// 3. **Problem**: what went wrong
/// 4. **Details**: specific information, optionally located
/// 5. **Hints**: optional guidance for fixing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    pub title: String,

    pub kind: DiagnosticKind,

    pub problem: Option<String>,

    pub details: Vec<DetailItem>,

    pub hints: Vec<String>,

    /// Source location for this diagnostic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

impl DiagnosticMessage {
    /// Create a new diagnostic message with just a title and kind.
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
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

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }

    /// Render this diagnostic message as text.
    ///
    /// When the diagnostic (or one of its details) is located in a file whose
    /// content is available from `ctx`, the output starts with an ariadne
    /// source snippet. Otherwise the plain form is used:
    ///
    /// ```text
    /// Error [DV-3-1]: title
    /// Problem statement here
    /// ✖ Error detail
    /// ℹ Info detail
    /// ? Hint
    /// ```
    ///
    /// ```
    /// use dv_error_reporting::DiagnosticMessageBuilder;
    ///
    /// let msg = DiagnosticMessageBuilder::error("Undeclared Key")
    ///     .problem("Key `port` is not declared in the schema")
    ///     .add_hint("Declare `port` in the schema file?")
    ///     .build();
    /// let text = msg.to_text(None);
    /// assert!(text.contains("Error: Undeclared Key"));
    /// assert!(text.contains("? Declare `port` in the schema file?"));
    /// ```
    pub fn to_text(&self, ctx: Option<&SourceContext>) -> String {
        let mut result = String::new();

        let location = self
            .location
            .as_ref()
            .or_else(|| self.details.iter().find_map(|d| d.location.as_ref()));

        let snippet = match (location, ctx) {
            (Some(loc), Some(ctx)) => self.render_ariadne_source_context(loc, ctx),
            _ => None,
        };

        match snippet {
            Some(snippet) => {
                // ariadne already shows title, code, problem and located details
                result.push_str(&snippet);
                for detail in self.details.iter().filter(|d| d.location.is_none()) {
                    let _ = writeln!(result, "{} {}", bullet(detail.kind), detail.content);
                }
            }
            None => {
                let kind_str = match self.kind {
                    DiagnosticKind::Error => "Error",
                    DiagnosticKind::Warning => "Warning",
                    DiagnosticKind::Info => "Info",
                };
                match &self.code {
                    Some(code) => {
                        let _ = writeln!(result, "{} [{}]: {}", kind_str, code, self.title);
                    }
                    None => {
                        let _ = writeln!(result, "{}: {}", kind_str, self.title);
                    }
                }
                if let Some(problem) = &self.problem {
                    let _ = writeln!(result, "{}", problem);
                }
                for detail in &self.details {
                    match (&detail.location, ctx) {
                        (Some(loc), Some(ctx)) => {
                            let _ = writeln!(
                                result,
                                "{} {} (at {})",
                                bullet(detail.kind),
                                detail.content,
                                ctx.describe(loc)
                            );
                        }
                        _ => {
                            let _ = writeln!(result, "{} {}", bullet(detail.kind), detail.content);
                        }
                    }
                }
            }
        }

        for hint in &self.hints {
            let _ = writeln!(result, "? {}", hint);
        }

        result
    }

    /// Render this diagnostic message as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let kind_str = match self.kind {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Info => "info",
        };

        let mut obj = json!({
            "kind": kind_str,
            "title": self.title,
        });

        if let Some(code) = &self.code {
            obj["code"] = json!(code);
        }
        if let Some(problem) = &self.problem {
            obj["problem"] = json!(problem);
        }
        if !self.details.is_empty() {
            let details: Vec<_> = self
                .details
                .iter()
                .map(|d| {
                    let mut detail = json!({
                        "kind": match d.kind {
                            DetailKind::Error => "error",
                            DetailKind::Info => "info",
                        },
                        "content": d.content,
                    });
                    if let Some(location) = &d.location {
                        detail["location"] = json!(location);
                    }
                    detail
                })
                .collect();
            obj["details"] = json!(details);
        }
        if !self.hints.is_empty() {
            obj["hints"] = json!(self.hints);
        }
        if let Some(location) = &self.location {
            obj["location"] = json!(location);
        }

        obj
    }

    fn render_ariadne_source_context(
        &self,
        main_location: &SourceInfo,
        ctx: &SourceContext,
    ) -> Option<String> {
        use ariadne::{Color, Config, Label, Report, ReportKind, Source};

        let file_id: FileId = main_location.file_id()?;
        let file = ctx.get_file(file_id)?;
        let content = ctx.content(file_id)?;

        let report_kind = match self.kind {
            DiagnosticKind::Error => ReportKind::Error,
            DiagnosticKind::Warning => ReportKind::Warning,
            DiagnosticKind::Info => ReportKind::Advice,
        };

        let start = main_location.range.start.offset;
        let end = main_location.range.end.offset.max(start + 1);

        let mut report = Report::build(report_kind, file.path.clone(), start)
            .with_config(Config::default().with_color(false));

        match &self.code {
            Some(code) => report = report.with_message(format!("[{}] {}", code, self.title)),
            None => report = report.with_message(&self.title),
        }

        let main_message = self.problem.as_deref().unwrap_or(&self.title);
        report = report.with_label(
            Label::new((file.path.clone(), start..end))
                .with_message(main_message)
                .with_color(Color::Red),
        );

        for detail in &self.details {
            let Some(detail_loc) = &detail.location else {
                continue;
            };
            if detail_loc.file_id() != Some(file_id) {
                continue;
            }
            let detail_start = detail_loc.range.start.offset;
            let detail_end = detail_loc.range.end.offset.max(detail_start + 1);
            let color = match detail.kind {
                DetailKind::Error => Color::Red,
                DetailKind::Info => Color::Cyan,
            };
            report = report.with_label(
                Label::new((file.path.clone(), detail_start..detail_end))
                    .with_message(&detail.content)
                    .with_color(color),
            );
        }

        let mut output = Vec::new();
        report
            .finish()
            .write((file.path.clone(), Source::from(content.as_str())), &mut output)
            .ok()?;

        String::from_utf8(output).ok()
    }
}

fn bullet(kind: DetailKind) -> &'static str {
    match kind {
        DetailKind::Error => "✖",
        DetailKind::Info => "ℹ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticMessageBuilder;
    use dv_source_map::{Location, Range};

    #[test]
    fn test_diagnostic_message_new() {
        let msg = DiagnosticMessage::new(DiagnosticKind::Error, "Test error");
        assert_eq!(msg.title, "Test error");
        assert!(msg.is_error());
        assert!(msg.code.is_none());
        assert!(msg.details.is_empty());
    }

    #[test]
    fn test_plain_text_rendering() {
        let msg = DiagnosticMessageBuilder::error("Missing Overlay Match")
            .with_code("DV-3-1")
            .problem("Key `db.port` has no counterpart in the base document")
            .add_detail("Overlaid from `prod.yml`")
            .add_hint("Annotate the key with `#@overlay/match missing_ok=True`?")
            .build();

        insta::assert_snapshot!(msg.to_text(None), @r"
        Error [DV-3-1]: Missing Overlay Match
        Key `db.port` has no counterpart in the base document
        ✖ Overlaid from `prod.yml`
        ? Annotate the key with `#@overlay/match missing_ok=True`?
        ");
    }

    #[test]
    fn test_located_detail_without_content_uses_describe() {
        let mut ctx = SourceContext::new();
        // No content and no file on disk: ariadne cannot render a snippet
        let file_id = ctx.add_file("does/not/exist.yml".to_string(), None);
        let location = SourceInfo::original(
            file_id,
            Range::point(Location { offset: 0, row: 1, column: 2 }),
        );

        let msg = DiagnosticMessageBuilder::error("Undeclared Key")
            .add_detail_at("Key `extra` is not declared", location)
            .build();

        let text = msg.to_text(Some(&ctx));
        assert!(text.contains("✖ Key `extra` is not declared (at does/not/exist.yml:2:3)"));
    }

    #[test]
    fn test_ariadne_rendering_includes_title_and_path() {
        let mut ctx = SourceContext::new();
        let content = "port: 8080\nhost: example\n";
        let file_id = ctx.add_file("values.yml".to_string(), Some(content.to_string()));
        let location = SourceInfo::original(
            file_id,
            Range {
                start: Location { offset: 11, row: 1, column: 0 },
                end: Location { offset: 15, row: 1, column: 4 },
            },
        );

        let msg = DiagnosticMessageBuilder::error("Undeclared Key")
            .with_code("DV-4-2")
            .problem("Key `host` is not declared in the schema")
            .with_location(location)
            .build();

        let text = msg.to_text(Some(&ctx));
        assert!(text.contains("[DV-4-2] Undeclared Key"));
        assert!(text.contains("values.yml"));
        assert!(text.contains("Key `host` is not declared in the schema"));
    }

    #[test]
    fn test_to_json() {
        let msg = DiagnosticMessageBuilder::error("Type Mismatch")
            .with_code("DV-4-3")
            .problem("Expected int, got string")
            .build();

        let json = msg.to_json();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["code"], "DV-4-3");
        assert_eq!(json["problem"], "Expected int, got string");
        assert!(json.get("details").is_none());
    }
}
