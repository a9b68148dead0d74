//! Builders for externally supplied overlays, such as command line values.

use crate::error::{Result, ValuesError};
use dv_overlay::MATCH;
use dv_source_map::{FileId, SourceContext, SourceInfo};
use dv_yaml::{
    Annotation, AnnotationValue, Annotations, MapEntry, ValueDocument, ValueNode, Yaml,
    parse_stream_in_file, parse_stream_with_origin,
};
use std::path::Path;

/// Split `key=value` at the first `=`.
pub fn parse_key_value(arg: &str) -> Result<(&str, &str)> {
    let invalid = |reason: &str| ValuesError::InvalidKeyValue {
        arg: arg.to_string(),
        reason: reason.to_string(),
    };
    let (key, value) = arg.split_once('=').ok_or_else(|| invalid("expected format key=value"))?;
    if key.trim().is_empty() {
        return Err(invalid("key must not be empty"));
    }
    Ok((key.trim(), value))
}

/// An overlay setting the dotted `key_path` to `value`.
///
/// Every key along the path is allowed to be missing, so the overlay can
/// introduce keys as well as change them.
pub fn overlay_from_key_value(key_path: &str, value: ValueNode, origin: &str) -> Result<ValueDocument> {
    let segments: Vec<&str> = key_path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ValuesError::InvalidKeyValue {
            arg: key_path.to_string(),
            reason: "key path must not contain empty segments".to_string(),
        });
    }

    let source_info = SourceInfo::generated(origin);
    let mut node = value;
    for key in segments.iter().rev() {
        let entry = MapEntry::new(*key, node).with_annotations(missing_ok(&source_info));
        node = ValueNode::map(vec![entry], source_info.clone());
    }
    Ok(ValueDocument::new(node, source_info))
}

/// `key=value` where the value is taken as a plain string.
pub fn overlay_from_string_arg(arg: &str) -> Result<ValueDocument> {
    let (key, value) = parse_key_value(arg)?;
    let origin = format!("data value '{}'", key);
    let node = ValueNode::scalar(Yaml::String(value.to_string()), SourceInfo::generated(&origin));
    overlay_from_key_value(key, node, &origin)
}

/// `key=value` where the value is parsed as YAML.
pub fn overlay_from_yaml_arg(arg: &str) -> Result<ValueDocument> {
    let (key, value) = parse_key_value(arg)?;
    let origin = format!("data value '{}'", key);
    let docs = parse_stream_with_origin(value, &origin).map_err(|source| ValuesError::Yaml {
        origin: origin.clone(),
        source,
    })?;
    if docs.len() > 1 {
        return Err(ValuesError::InvalidKeyValue {
            arg: arg.to_string(),
            reason: "value must be a single YAML document".to_string(),
        });
    }
    let node = docs
        .into_iter()
        .next()
        .and_then(|doc| doc.root)
        .unwrap_or_else(|| ValueNode::null(SourceInfo::generated(&origin)));
    overlay_from_key_value(key, node, &origin)
}

/// Every non-empty document of `content` as an overlay.
pub fn overlays_from_str(content: &str, origin: &str, file_id: Option<FileId>) -> Result<Vec<ValueDocument>> {
    let parsed = match file_id {
        Some(id) => parse_stream_in_file(content, id),
        None => parse_stream_with_origin(content, origin),
    };
    let docs = parsed.map_err(|source| ValuesError::Yaml {
        origin: origin.to_string(),
        source,
    })?;
    Ok(docs.into_iter().filter(|doc| !doc.is_empty()).collect())
}

/// Read a values file and register it with `ctx` for error reporting.
pub fn overlays_from_file(path: &Path, ctx: &mut SourceContext) -> Result<Vec<ValueDocument>> {
    let shown = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| ValuesError::Io {
        path: shown.clone(),
        source,
    })?;
    let file_id = ctx.add_file(shown.clone(), Some(content.clone()));
    tracing::debug!(path = %shown, "Loaded data values file");
    overlays_from_str(&content, &shown, Some(file_id))
}

fn missing_ok(source_info: &SourceInfo) -> Annotations {
    let mut annotations = Annotations::new();
    annotations.set(
        MATCH,
        Annotation::new(source_info.clone()).with_kwarg("missing_ok", AnnotationValue::Bool(true)),
    );
    annotations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::overlay;
    use dv_yaml::parse_stream;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("a.b=c=d").unwrap(), ("a.b", "c=d"));
        assert_eq!(parse_key_value("a=").unwrap(), ("a", ""));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_string_arg_is_not_typed() {
        let doc = overlay_from_string_arg("server.port=8080").unwrap();
        assert_eq!(doc.to_json(), json!({"server": {"port": "8080"}}));
    }

    #[test]
    fn test_yaml_arg_is_typed() {
        let doc = overlay_from_yaml_arg("server.port=8080").unwrap();
        assert_eq!(doc.to_json(), json!({"server": {"port": 8080}}));
        let doc = overlay_from_yaml_arg("list=[1, 2]").unwrap();
        assert_eq!(doc.to_json(), json!({"list": [1, 2]}));
    }

    #[test]
    fn test_empty_segments_are_rejected() {
        assert!(overlay_from_string_arg("a..b=1").is_err());
    }

    #[test]
    fn test_key_value_overlay_adds_missing_keys() {
        let base = parse_stream("server:\n  host: a\n").unwrap().documents.remove(0);
        let patch = overlay_from_yaml_arg("server.port=80").unwrap();
        let merged = overlay(&base, &patch).unwrap();
        assert_eq!(merged.to_json(), json!({"server": {"host": "a", "port": 80}}));
    }

    #[test]
    fn test_overlays_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "a: 1\n---\n---\nb: 2\n").unwrap();
        let mut ctx = SourceContext::new();
        let docs = overlays_from_file(file.path(), &mut ctx).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let mut ctx = SourceContext::new();
        let err = overlays_from_file(Path::new("/nonexistent/values.yml"), &mut ctx).unwrap_err();
        assert!(matches!(err, ValuesError::Io { .. }));
    }
}
