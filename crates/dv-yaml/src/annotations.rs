//! Annotations attached to documents, map entries and array items.
//!
//! An annotation is a full-line comment of the form
//!
//! ```text
//! #@overlay/match by="name", missing_ok=True
//! ```
//!
//! Arguments are literals only: `True`, `False`, `None`, integers, floats and
//! quoted strings. Positional arguments come before keyword arguments.

use crate::error::{Error, Result};
use dv_source_map::SourceInfo;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static ANNOTATION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#@([A-Za-z_][\w\-]*(?:/[\w\-]+)*)(?:\s+(.*?))?\s*$").expect("valid regex")
});

static KWARG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_]\w*)\s*=\s*(.+)$").expect("valid regex"));

/// A literal annotation argument.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Null,
}

impl AnnotationValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Str(s) => write!(f, "{:?}", s),
            AnnotationValue::Bool(true) => write!(f, "True"),
            AnnotationValue::Bool(false) => write!(f, "False"),
            AnnotationValue::Int(i) => write!(f, "{}", i),
            AnnotationValue::Float(x) => write!(f, "{}", x),
            AnnotationValue::Null => write!(f, "None"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub args: Vec<AnnotationValue>,
    pub kwargs: Vec<(String, AnnotationValue)>,
    pub source_info: SourceInfo,
}

impl Annotation {
    pub fn new(source_info: SourceInfo) -> Self {
        Annotation {
            args: Vec::new(),
            kwargs: Vec::new(),
            source_info,
        }
    }

    pub fn with_arg(mut self, value: AnnotationValue) -> Self {
        self.args.push(value);
        self
    }

    /// Sets a keyword argument, replacing an earlier value for the same key.
    pub fn with_kwarg(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        let key = key.into();
        match self.kwargs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.kwargs.push((key, value)),
        }
        self
    }

    pub fn kwarg(&self, key: &str) -> Option<&AnnotationValue> {
        self.kwargs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Annotations on one node, in source order. Names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    entries: Vec<(String, Annotation)>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Annotation> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Adds or replaces an annotation.
    pub fn set(&mut self, name: impl Into<String>, annotation: Annotation) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = annotation,
            None => self.entries.push((name, annotation)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Annotation> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Drops every annotation whose name starts with `prefix`.
    pub fn remove_prefixed(&mut self, prefix: &str) {
        self.entries.retain(|(n, _)| !n.starts_with(prefix));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Annotation)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse one comment line. Returns `Ok(None)` for ordinary comments.
///
/// ```
/// use dv_yaml::{AnnotationValue, SourceInfo, parse_annotation_line};
///
/// let (name, ann) = parse_annotation_line(
///     "#@overlay/match missing_ok=True",
///     SourceInfo::unknown(),
/// )
/// .unwrap()
/// .unwrap();
/// assert_eq!(name, "overlay/match");
/// assert_eq!(ann.kwarg("missing_ok"), Some(&AnnotationValue::Bool(true)));
/// ```
pub fn parse_annotation_line(
    line: &str,
    source_info: SourceInfo,
) -> Result<Option<(String, Annotation)>> {
    let line = line.trim();
    if !line.starts_with("#@") {
        return Ok(None);
    }

    let Some(caps) = ANNOTATION_LINE.captures(line) else {
        // `#@ expr`, `#@if ...:` and friends
        return Err(Error::Unsupported {
            message: format!(
                "template code `{}` is not supported in data values files",
                line
            ),
            location: source_info,
        });
    };

    let name = caps[1].to_string();
    let mut annotation = Annotation::new(source_info.clone());
    let Some(rest) = caps.get(2) else {
        return Ok(Some((name, annotation)));
    };

    for piece in split_args(rest.as_str()).map_err(|message| Error::InvalidAnnotation {
        name: name.clone(),
        message,
        location: source_info.clone(),
    })? {
        let invalid = |message: String| Error::InvalidAnnotation {
            name: name.clone(),
            message,
            location: source_info.clone(),
        };

        let is_quoted = piece.starts_with('"') || piece.starts_with('\'');
        match KWARG.captures(&piece) {
            Some(kw) if !is_quoted => {
                let value = parse_literal(&kw[2]).map_err(invalid)?;
                annotation = annotation.with_kwarg(&kw[1], value);
            }
            _ => {
                if !annotation.kwargs.is_empty() {
                    return Err(invalid(format!(
                        "positional argument `{}` follows a keyword argument",
                        piece
                    )));
                }
                let value = parse_literal(&piece).map_err(invalid)?;
                annotation.args.push(value);
            }
        }
    }

    Ok(Some((name, annotation)))
}

/// Split on commas that are outside of quotes.
fn split_args(input: &str) -> std::result::Result<Vec<String>, String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in input.chars() {
        match quote {
            Some(q) => {
                current.push(ch);
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    current.push(ch);
                }
                ',' => {
                    pieces.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(ch),
            },
        }
    }

    if quote.is_some() {
        return Err("unterminated string".to_string());
    }
    let last = current.trim();
    if !last.is_empty() || !pieces.is_empty() {
        pieces.push(last.to_string());
    }
    if pieces.iter().any(|p| p.is_empty()) {
        return Err("empty argument".to_string());
    }
    Ok(pieces)
}

fn parse_literal(raw: &str) -> std::result::Result<AnnotationValue, String> {
    let raw = raw.trim();
    match raw {
        "True" => return Ok(AnnotationValue::Bool(true)),
        "False" => return Ok(AnnotationValue::Bool(false)),
        "None" => return Ok(AnnotationValue::Null),
        _ => {}
    }

    if let Some(q) = raw.chars().next().filter(|c| *c == '"' || *c == '\'') {
        if raw.len() < 2 || !raw.ends_with(q) {
            return Err(format!("malformed string `{}`", raw));
        }
        return Ok(AnnotationValue::Str(unescape(&raw[1..raw.len() - 1])));
    }

    if let Ok(i) = raw.parse::<i64>() {
        return Ok(AnnotationValue::Int(i));
    }
    if raw.contains('.') {
        if let Ok(x) = raw.parse::<f64>() {
            return Ok(AnnotationValue::Float(x));
        }
    }

    Err(format!(
        "unsupported argument `{}` (only literals are allowed)",
        raw
    ))
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
