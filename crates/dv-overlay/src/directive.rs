//! Typed view of the `overlay/*` annotations on one node.

use crate::error::OverlayError;
use dv_source_map::SourceInfo;
use dv_yaml::{Annotation, AnnotationValue, Annotations};

pub const OVERLAY_PREFIX: &str = "overlay/";
pub const MATCH: &str = "overlay/match";
pub const MATCH_CHILD_DEFAULTS: &str = "overlay/match-child-defaults";
pub const MERGE: &str = "overlay/merge";
pub const REPLACE: &str = "overlay/replace";
pub const REMOVE: &str = "overlay/remove";
pub const APPEND: &str = "overlay/append";

/// What to do with the matched left node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditKind {
    #[default]
    Merge,
    Replace,
    Remove,
    Append,
}

/// Overlay directives read from a node's annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDirective {
    pub edit: EditKind,
    /// `overlay/match missing_ok=`
    pub missing_ok: Option<bool>,
    /// `overlay/match by=`
    pub by: Option<String>,
    /// `overlay/match-child-defaults missing_ok=`
    pub child_missing_ok: Option<bool>,
}

impl NodeDirective {
    /// Read the overlay annotations of a node. `path` and `location` are
    /// only used for error reporting.
    pub fn from_annotations(
        annotations: &Annotations,
        path: &str,
        location: &SourceInfo,
    ) -> Result<Self, OverlayError> {
        let invalid = |message: String| OverlayError::InvalidDirective {
            path: path.to_string(),
            message,
            location: location.clone(),
        };

        let mut directive = NodeDirective::default();
        let mut edits = Vec::new();

        for (name, annotation) in annotations.iter() {
            if !name.starts_with(OVERLAY_PREFIX) {
                continue;
            }
            match name {
                MATCH => {
                    expect_no_args(name, annotation).map_err(&invalid)?;
                    for (key, value) in &annotation.kwargs {
                        match key.as_str() {
                            "missing_ok" => {
                                directive.missing_ok = Some(expect_bool(name, key, value).map_err(&invalid)?)
                            }
                            "by" => match value {
                                AnnotationValue::Str(field) => directive.by = Some(field.clone()),
                                other => {
                                    return Err(invalid(format!(
                                        "`by` must be a map key given as a string, got {}",
                                        other
                                    )));
                                }
                            },
                            other => {
                                return Err(invalid(format!(
                                    "unknown keyword argument `{}` for `{}`",
                                    other, name
                                )));
                            }
                        }
                    }
                }
                MATCH_CHILD_DEFAULTS => {
                    expect_no_args(name, annotation).map_err(&invalid)?;
                    for (key, value) in &annotation.kwargs {
                        if key != "missing_ok" {
                            return Err(invalid(format!(
                                "unknown keyword argument `{}` for `{}`",
                                key, name
                            )));
                        }
                        directive.child_missing_ok = Some(expect_bool(name, key, value).map_err(&invalid)?);
                    }
                }
                MERGE | REPLACE | REMOVE | APPEND => {
                    expect_no_args(name, annotation).map_err(&invalid)?;
                    if !annotation.kwargs.is_empty() {
                        return Err(invalid(format!("`{}` takes no arguments", name)));
                    }
                    edits.push(name);
                }
                other => return Err(invalid(format!("unknown overlay annotation `{}`", other))),
            }
        }

        directive.edit = match edits.as_slice() {
            [] | [MERGE] => EditKind::Merge,
            [REPLACE] => EditKind::Replace,
            [REMOVE] => EditKind::Remove,
            [APPEND] => EditKind::Append,
            _ => {
                return Err(invalid(format!(
                    "only one of overlay/merge, overlay/replace, overlay/remove and overlay/append may be given, found {}",
                    edits.join(", ")
                )));
            }
        };

        Ok(directive)
    }
}

fn expect_no_args(name: &str, annotation: &Annotation) -> Result<(), String> {
    if annotation.args.is_empty() {
        Ok(())
    } else {
        Err(format!("`{}` takes keyword arguments only", name))
    }
}

fn expect_bool(name: &str, key: &str, value: &AnnotationValue) -> Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("`{}` of `{}` must be True or False, got {}", key, name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(lines: &[&str]) -> Result<NodeDirective, OverlayError> {
        let mut anns = Annotations::new();
        for line in lines {
            let (name, ann) = dv_yaml::parse_annotation_line(line, SourceInfo::unknown())
                .unwrap()
                .unwrap();
            anns.set(name, ann);
        }
        NodeDirective::from_annotations(&anns, "a.b", &SourceInfo::unknown())
    }

    #[test]
    fn test_defaults() {
        let d = directive(&[]).unwrap();
        assert_eq!(d, NodeDirective::default());
        assert_eq!(d.edit, EditKind::Merge);
    }

    #[test]
    fn test_match_arguments() {
        let d = directive(&[
            r#"#@overlay/match by="name", missing_ok=True"#,
            "#@overlay/replace",
        ])
        .unwrap();
        assert_eq!(d.by.as_deref(), Some("name"));
        assert_eq!(d.missing_ok, Some(true));
        assert_eq!(d.edit, EditKind::Replace);
    }

    #[test]
    fn test_non_overlay_annotations_are_ignored() {
        let d = directive(&["#@schema/nullable", "#@overlay/match-child-defaults missing_ok=False"])
            .unwrap();
        assert_eq!(d.child_missing_ok, Some(false));
    }

    #[test]
    fn test_conflicting_edits() {
        let err = directive(&["#@overlay/replace", "#@overlay/remove"]).unwrap_err();
        assert!(matches!(err, OverlayError::InvalidDirective { .. }));
    }

    #[test]
    fn test_unknown_overlay_annotation() {
        let err = directive(&["#@overlay/insert before=True"]).unwrap_err();
        assert!(err.to_string().contains("unknown overlay annotation `overlay/insert`"));
    }

    #[test]
    fn test_missing_ok_must_be_bool() {
        let err = directive(&[r#"#@overlay/match missing_ok="yes""#]).unwrap_err();
        assert!(matches!(err, OverlayError::InvalidDirective { .. }));
    }
}
