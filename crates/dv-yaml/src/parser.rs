//! Multi-document YAML parser that builds [`DocumentSet`]s.
//!
//! yaml-rust2 drops comments, so annotation comments are collected in a
//! line pre-scan and handed out while events stream in: every document start
//! (explicit `---` only), map entry and array item claims the annotation lines
//! that appear before it and were not claimed yet.

use crate::annotations::{Annotation, Annotations, parse_annotation_line};
use crate::document::{DocumentSet, ValueDocument};
use crate::error::{Error, Result};
use crate::node::{ArrayItem, MapEntry, ValueNode};
use dv_source_map::{FileId, FileInformation, Location, Range, SourceInfo};
use once_cell::sync::Lazy;
use regex::Regex;
use yaml_rust2::Yaml;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?$").expect("valid regex")
});

/// Parse a YAML stream that does not come from a registered file.
///
/// ```rust
/// use dv_yaml::parse_stream;
///
/// let docs = parse_stream("a: 1\n---\nb: 2\n").unwrap();
/// assert_eq!(docs.len(), 2);
/// ```
pub fn parse_stream(content: &str) -> Result<DocumentSet> {
    parse_stream_with_origin(content, "string")
}

/// Parse a YAML stream whose positions are reported as synthesized from
/// `origin` (for instance a command line flag).
pub fn parse_stream_with_origin(content: &str, origin: &str) -> Result<DocumentSet> {
    parse_impl(content, Anchor::Generated(origin.to_string()))
}

/// Parse the content of a file registered in a `SourceContext`.
pub fn parse_stream_in_file(content: &str, file_id: FileId) -> Result<DocumentSet> {
    parse_impl(content, Anchor::File(file_id))
}

fn parse_impl(content: &str, anchor: Anchor) -> Result<DocumentSet> {
    let file_info = FileInformation::new(content);
    let comments = scan_annotation_comments(content, &anchor)?;

    let mut builder = StreamBuilder {
        lines: content.split('\n').collect(),
        file_info,
        anchor,
        comments,
        cursor: 0,
        stack: Vec::new(),
        current: None,
        documents: Vec::new(),
        error: None,
    };

    let mut parser = Parser::new_from_str(content);
    if let Err(err) = parser.load(&mut builder, true) {
        let location = builder.source_info_at(err.marker(), 0);
        return Err(Error::Syntax {
            message: err.info().to_string(),
            location,
        });
    }

    builder.finish()
}

#[derive(Debug, Clone)]
enum Anchor {
    File(FileId),
    Generated(String),
}

struct AnnotationComment {
    row: usize,
    name: String,
    annotation: Annotation,
}

fn scan_annotation_comments(content: &str, anchor: &Anchor) -> Result<Vec<AnnotationComment>> {
    let mut comments = Vec::new();
    let mut line_start = 0;

    for (row, line) in content.split('\n').enumerate() {
        let indent = line.chars().take_while(|c| c.is_whitespace()).count();
        let len = line.chars().count();
        let trimmed = line.trim();

        if trimmed.starts_with("#@") {
            let range = Range {
                start: Location {
                    offset: line_start + indent,
                    row,
                    column: indent,
                },
                end: Location {
                    offset: line_start + len,
                    row,
                    column: len,
                },
            };
            if let Some((name, annotation)) =
                parse_annotation_line(trimmed, anchor.source_info(range))?
            {
                comments.push(AnnotationComment {
                    row,
                    name,
                    annotation,
                });
            }
        }

        line_start += len + 1;
    }

    Ok(comments)
}

impl Anchor {
    fn source_info(&self, range: Range) -> SourceInfo {
        match self {
            Anchor::File(file_id) => SourceInfo::original(*file_id, range),
            Anchor::Generated(origin) => SourceInfo::generated(origin.clone()).with_range(range),
        }
    }
}

struct StreamBuilder<'a> {
    lines: Vec<&'a str>,
    file_info: FileInformation,
    anchor: Anchor,
    comments: Vec<AnnotationComment>,
    cursor: usize,
    stack: Vec<Frame>,
    current: Option<OpenDocument>,
    documents: Vec<ValueDocument>,
    /// First error; later events are ignored once set.
    error: Option<Error>,
}

struct OpenDocument {
    start: Location,
    annotations: Annotations,
    root: Option<ValueNode>,
}

enum Frame {
    Sequence {
        start: Location,
        items: Vec<ArrayItem>,
        next_annotations: Annotations,
    },
    Mapping {
        start: Location,
        entries: Vec<MapEntry>,
        key: Option<PendingKey>,
    },
}

struct PendingKey {
    key: String,
    source: SourceInfo,
    annotations: Annotations,
}

/// Where the node that is about to start sits in its parent.
enum Slot {
    Key,
    Value,
}

impl<'a> StreamBuilder<'a> {
    fn finish(self) -> Result<DocumentSet> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if let Some(orphan) = self.comments.get(self.cursor) {
            return Err(Error::InvalidAnnotation {
                name: orphan.name.clone(),
                message: "annotation is not followed by a document, map item or array item"
                    .to_string(),
                location: orphan.annotation.source_info.clone(),
            });
        }
        Ok(DocumentSet::new(self.documents))
    }

    fn location(&self, marker: &Marker) -> Location {
        self.file_info
            .offset_to_location(marker.index())
            .unwrap_or(Location {
                offset: marker.index(),
                row: marker.line().saturating_sub(1),
                column: marker.col(),
            })
    }

    fn location_at_offset(&self, offset: usize) -> Location {
        let clamped = offset.min(self.file_info.total_length());
        self.file_info.offset_to_location(clamped).unwrap_or_default()
    }

    fn source_info_at(&self, marker: &Marker, len: usize) -> SourceInfo {
        let start = self.location(marker);
        let end = self.location_at_offset(start.offset + len);
        self.anchor.source_info(Range { start, end })
    }

    fn source_info_between(&self, start: Location, end: Location) -> SourceInfo {
        self.anchor.source_info(Range { start, end })
    }

    /// Hand out the unclaimed annotation comments above `row`.
    fn claim(&mut self, row: usize) -> Result<Annotations> {
        let mut annotations = Annotations::new();
        while let Some(comment) = self.comments.get(self.cursor) {
            if comment.row >= row {
                break;
            }
            if annotations.has(&comment.name) {
                return Err(Error::InvalidAnnotation {
                    name: comment.name.clone(),
                    message: "annotation is given more than once on the same node".to_string(),
                    location: comment.annotation.source_info.clone(),
                });
            }
            annotations.set(comment.name.clone(), comment.annotation.clone());
            self.cursor += 1;
        }
        Ok(annotations)
    }

    /// Claim annotations for a node starting at `start` and report its slot.
    fn begin_node(&mut self, start: Location) -> Result<Slot> {
        match self.stack.last() {
            Some(Frame::Mapping { key: None, .. }) => {
                let annotations = self.claim(start.row)?;
                if let Some(Frame::Mapping { key, .. }) = self.stack.last_mut() {
                    *key = Some(PendingKey {
                        key: String::new(),
                        source: SourceInfo::default(),
                        annotations,
                    });
                }
                Ok(Slot::Key)
            }
            Some(Frame::Sequence { .. }) => {
                let annotations = self.claim(start.row)?;
                if let Some(Frame::Sequence {
                    next_annotations, ..
                }) = self.stack.last_mut()
                {
                    *next_annotations = annotations;
                }
                Ok(Slot::Value)
            }
            Some(Frame::Mapping { key: Some(_), .. }) | None => Ok(Slot::Value),
        }
    }

    fn push_complete(&mut self, node: ValueNode) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                if let Some(doc) = self.current.as_mut() {
                    doc.root = Some(node);
                }
                Ok(())
            }
            Some(Frame::Sequence {
                items,
                next_annotations,
                ..
            }) => {
                items.push(ArrayItem {
                    value: node,
                    annotations: std::mem::take(next_annotations),
                });
                Ok(())
            }
            Some(Frame::Mapping { entries, key, .. }) => {
                let Some(pending) = key.take() else {
                    return Err(Error::Unsupported {
                        message: "map value without a key".to_string(),
                        location: node.source_info,
                    });
                };
                if entries.iter().any(|e| e.key == pending.key) {
                    return Err(Error::Unsupported {
                        message: format!("duplicate map key `{}`", pending.key),
                        location: pending.source,
                    });
                }
                entries.push(MapEntry {
                    key: pending.key,
                    key_source: pending.source,
                    value: node,
                    annotations: pending.annotations,
                });
                Ok(())
            }
        }
    }

    fn handle(&mut self, ev: Event, marker: Marker) -> Result<()> {
        let here = self.location(&marker);
        match ev {
            Event::Nothing | Event::StreamStart | Event::StreamEnd => {}

            Event::DocumentStart => {
                let explicit = self
                    .lines
                    .get(here.row)
                    .is_some_and(|line| line.trim_start().starts_with("---"));
                let annotations = if explicit {
                    self.claim(here.row)?
                } else {
                    Annotations::new()
                };
                self.current = Some(OpenDocument {
                    start: here,
                    annotations,
                    root: None,
                });
            }

            Event::DocumentEnd => {
                if let Some(doc) = self.current.take() {
                    let source_info = self.source_info_between(doc.start, here);
                    self.documents.push(ValueDocument {
                        root: doc.root,
                        annotations: doc.annotations,
                        source_info,
                    });
                }
            }

            Event::Scalar(value, style, _anchor_id, _tag) => {
                let quoted = matches!(
                    style,
                    TScalarStyle::SingleQuoted | TScalarStyle::DoubleQuoted
                );
                let len = value.chars().count() + if quoted { 2 } else { 0 };
                let source_info = self.source_info_at(&marker, len);

                match self.begin_node(here)? {
                    Slot::Key => {
                        if let Some(Frame::Mapping {
                            key: Some(pending), ..
                        }) = self.stack.last_mut()
                        {
                            pending.key = value;
                            pending.source = source_info;
                        }
                    }
                    Slot::Value => {
                        let yaml = if matches!(style, TScalarStyle::Plain) {
                            parse_plain_scalar(&value)
                        } else {
                            Yaml::String(value)
                        };
                        self.push_complete(ValueNode::scalar(yaml, source_info))?;
                    }
                }
            }

            Event::SequenceStart(_anchor_id, _tag) => {
                self.reject_complex_key(here)?;
                self.stack.push(Frame::Sequence {
                    start: here,
                    items: Vec::new(),
                    next_annotations: Annotations::new(),
                });
            }

            Event::SequenceEnd => {
                if let Some(Frame::Sequence { start, items, .. }) = self.stack.pop() {
                    let source_info = self.source_info_between(start, here);
                    self.push_complete(ValueNode::array(items, source_info))?;
                }
            }

            Event::MappingStart(_anchor_id, _tag) => {
                self.reject_complex_key(here)?;
                self.stack.push(Frame::Mapping {
                    start: here,
                    entries: Vec::new(),
                    key: None,
                });
            }

            Event::MappingEnd => {
                if let Some(Frame::Mapping { start, entries, .. }) = self.stack.pop() {
                    let source_info = self.source_info_between(start, here);
                    self.push_complete(ValueNode::map(entries, source_info))?;
                }
            }

            Event::Alias(_anchor_id) => {
                return Err(Error::Unsupported {
                    message: "YAML aliases are not supported in data values".to_string(),
                    location: self.source_info_at(&marker, 1),
                });
            }
        }
        Ok(())
    }

    fn reject_complex_key(&mut self, here: Location) -> Result<()> {
        match self.begin_node(here)? {
            Slot::Key => Err(Error::Unsupported {
                message: "map keys must be scalars".to_string(),
                location: self.source_info_between(here, here),
            }),
            Slot::Value => Ok(()),
        }
    }
}

impl<'a> MarkedEventReceiver for StreamBuilder<'a> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.handle(ev, marker) {
            self.error = Some(err);
        }
    }
}

/// Type a plain scalar following the YAML 1.2 core schema.
fn parse_plain_scalar(value: &str) -> Yaml {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => return Yaml::Null,
        "true" | "True" | "TRUE" => return Yaml::Boolean(true),
        "false" | "False" | "FALSE" => return Yaml::Boolean(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" | "-.inf" | "-.Inf" | "-.INF"
        | ".nan" | ".NaN" | ".NAN" => return Yaml::Real(value.to_string()),
        _ => {}
    }

    let digits = value.strip_prefix('+').unwrap_or(value);
    if !digits.is_empty()
        && digits
            .strip_prefix('-')
            .unwrap_or(digits)
            .chars()
            .all(|c| c.is_ascii_digit())
    {
        if let Ok(i) = digits.parse::<i64>() {
            return Yaml::Integer(i);
        }
    }
    if let Some(hex) = value.strip_prefix("0x") {
        if let Ok(i) = i64::from_str_radix(hex, 16) {
            return Yaml::Integer(i);
        }
    }
    if let Some(oct) = value.strip_prefix("0o") {
        if let Ok(i) = i64::from_str_radix(oct, 8) {
            return Yaml::Integer(i);
        }
    }
    if FLOAT.is_match(value) {
        return Yaml::Real(value.to_string());
    }

    Yaml::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationValue;

    #[test]
    fn test_plain_scalar_typing() {
        assert_eq!(parse_plain_scalar("42"), Yaml::Integer(42));
        assert_eq!(parse_plain_scalar("-7"), Yaml::Integer(-7));
        assert_eq!(parse_plain_scalar("0x1F"), Yaml::Integer(31));
        assert_eq!(parse_plain_scalar("1.5"), Yaml::Real("1.5".into()));
        assert_eq!(parse_plain_scalar("1e3"), Yaml::Real("1e3".into()));
        assert_eq!(parse_plain_scalar("true"), Yaml::Boolean(true));
        assert_eq!(parse_plain_scalar("~"), Yaml::Null);
        // YAML 1.1 booleans are plain strings
        assert_eq!(parse_plain_scalar("yes"), Yaml::String("yes".into()));
        assert_eq!(parse_plain_scalar("1.2.3"), Yaml::String("1.2.3".into()));
    }

    #[test]
    fn test_quoted_scalars_stay_strings() {
        let docs = parse_stream("a: \"42\"\nb: 'true'\nc: 42\n").unwrap();
        let root = docs.documents[0].root.as_ref().unwrap();
        assert_eq!(root.get("a").unwrap().as_str(), Some("42"));
        assert_eq!(root.get("b").unwrap().as_str(), Some("true"));
        assert_eq!(root.get("c").unwrap().as_i64(), Some(42));
    }

    #[test]
    fn test_document_annotations_need_explicit_start() {
        let docs = parse_stream("#@data/values\n---\na: 1\n").unwrap();
        assert!(docs.documents[0].has_annotation("data/values"));
        let entry = docs.documents[0].root.as_ref().unwrap().get_entry("a").unwrap();
        assert!(entry.annotations.is_empty());

        // Without `---` the annotation belongs to the first map item
        let docs = parse_stream("#@overlay/match missing_ok=True\na: 1\n").unwrap();
        assert!(docs.documents[0].annotations.is_empty());
        let entry = docs.documents[0].root.as_ref().unwrap().get_entry("a").unwrap();
        assert_eq!(
            entry
                .annotations
                .get("overlay/match")
                .and_then(|a| a.kwarg("missing_ok")),
            Some(&AnnotationValue::Bool(true))
        );
    }

    #[test]
    fn test_annotations_on_nested_entries_and_items() {
        let src = "\
#@data/values
---
servers:
#@overlay/match by=\"name\"
- name: a
  #@overlay/replace
  ports: [1, 2]
- name: b
";
        let docs = parse_stream(src).unwrap();
        let servers = docs.documents[0].get("servers").unwrap().as_array().unwrap();
        assert_eq!(servers.len(), 2);
        assert!(servers[0].annotations.has("overlay/match"));
        assert!(servers[1].annotations.is_empty());
        let ports = servers[0].value.get_entry("ports").unwrap();
        assert!(ports.annotations.has("overlay/replace"));
    }

    #[test]
    fn test_multiple_documents_and_empty_documents() {
        let docs = parse_stream("---\n---\na: 1\n---\n").unwrap();
        assert!(docs.len() >= 2);
        assert!(docs.documents[0].is_empty());
        assert_eq!(docs.documents[1].get("a").unwrap().as_i64(), Some(1));
    }

    #[test]
    fn test_empty_stream_has_no_documents() {
        assert!(parse_stream("").unwrap().is_empty());
        assert!(parse_stream("# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn test_alias_is_rejected() {
        let err = parse_stream("a: &x 1\nb: *x\n").unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }

    #[test]
    fn test_complex_key_is_rejected() {
        let err = parse_stream("? [a, b]\n: 1\n").unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let err = parse_stream("a: 1\na: 2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate map key `a`"));
    }

    #[test]
    fn test_orphan_annotation_is_rejected() {
        let err = parse_stream("a: 1\n#@overlay/remove\n").unwrap_err();
        assert!(matches!(err, Error::InvalidAnnotation { .. }));
    }

    #[test]
    fn test_syntax_error_has_location() {
        let err = parse_stream_in_file("a: [1, 2\n", FileId(3)).unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
        assert_eq!(err.location().file_id(), Some(FileId(3)));
    }

    #[test]
    fn test_positions_are_tracked() {
        let docs = parse_stream_in_file("a: 1\nb:\n  c: hello\n", FileId(0)).unwrap();
        let c = docs.documents[0].get_path(&["b", "c"]).unwrap();
        assert_eq!(c.source_info.range.start.row, 2);
        assert_eq!(c.source_info.range.start.column, 5);
        assert_eq!(c.source_info.range.len(), 5);
    }
}
