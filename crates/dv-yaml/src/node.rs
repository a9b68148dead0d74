//! Value nodes: the tree inside a data values document.

use crate::annotations::Annotations;
use dv_source_map::SourceInfo;
use yaml_rust2::Yaml;

/// A node of a data values tree.
///
/// Scalars keep their `yaml_rust2::Yaml` value. Maps and arrays own their
/// children, and the annotations sit on the [`MapEntry`] / [`ArrayItem`] that
/// holds a child, not on the child itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode {
    pub kind: NodeKind,
    pub source_info: SourceInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar(Yaml),
    Array(Vec<ArrayItem>),
    Map(Vec<MapEntry>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: String,
    pub key_source: SourceInfo,
    pub value: ValueNode,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayItem {
    pub value: ValueNode,
    pub annotations: Annotations,
}

impl MapEntry {
    pub fn new(key: impl Into<String>, value: ValueNode) -> Self {
        let key_source = value.source_info.clone();
        MapEntry {
            key: key.into(),
            key_source,
            value,
            annotations: Annotations::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }
}

impl ArrayItem {
    pub fn new(value: ValueNode) -> Self {
        ArrayItem {
            value,
            annotations: Annotations::new(),
        }
    }
}

impl ValueNode {
    pub fn scalar(yaml: Yaml, source_info: SourceInfo) -> Self {
        ValueNode {
            kind: NodeKind::Scalar(yaml),
            source_info,
        }
    }

    pub fn null(source_info: SourceInfo) -> Self {
        Self::scalar(Yaml::Null, source_info)
    }

    pub fn map(entries: Vec<MapEntry>, source_info: SourceInfo) -> Self {
        ValueNode {
            kind: NodeKind::Map(entries),
            source_info,
        }
    }

    pub fn array(items: Vec<ArrayItem>, source_info: SourceInfo) -> Self {
        ValueNode {
            kind: NodeKind::Array(items),
            source_info,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, NodeKind::Scalar(Yaml::Null))
    }

    /// Null, or a map or array without items.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            NodeKind::Scalar(yaml) => matches!(yaml, Yaml::Null),
            NodeKind::Map(entries) => entries.is_empty(),
            NodeKind::Array(items) => items.is_empty(),
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self.kind, NodeKind::Map(_))
    }

    pub fn as_map(&self) -> Option<&[MapEntry]> {
        match &self.kind {
            NodeKind::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ArrayItem]> {
        match &self.kind {
            NodeKind::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Yaml> {
        match &self.kind {
            NodeKind::Scalar(yaml) => Some(yaml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(|y| y.as_str())
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(|y| y.as_i64())
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(|y| y.as_bool())
    }

    pub fn get_entry(&self, key: &str) -> Option<&MapEntry> {
        self.as_map()?.iter().find(|e| e.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&ValueNode> {
        self.get_entry(key).map(|e| &e.value)
    }

    /// Follow a path of map keys.
    pub fn get_path(&self, path: &[&str]) -> Option<&ValueNode> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Map(_) => "map",
            NodeKind::Array(_) => "array",
            NodeKind::Scalar(yaml) => scalar_type_name(yaml),
        }
    }

    /// Remove annotations starting with `prefix` from this subtree.
    pub fn strip_annotations(&mut self, prefix: &str) {
        match &mut self.kind {
            NodeKind::Scalar(_) => {}
            NodeKind::Array(items) => {
                for item in items {
                    item.annotations.remove_prefixed(prefix);
                    item.value.strip_annotations(prefix);
                }
            }
            NodeKind::Map(entries) => {
                for entry in entries {
                    entry.annotations.remove_prefixed(prefix);
                    entry.value.strip_annotations(prefix);
                }
            }
        }
    }

    /// Convert to a plain `Yaml` value, dropping annotations and positions.
    pub fn to_yaml(&self) -> Yaml {
        match &self.kind {
            NodeKind::Scalar(yaml) => yaml.clone(),
            NodeKind::Array(items) => Yaml::Array(items.iter().map(|i| i.value.to_yaml()).collect()),
            NodeKind::Map(entries) => Yaml::Hash(
                entries
                    .iter()
                    .map(|e| (Yaml::String(e.key.clone()), e.value.to_yaml()))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match &self.kind {
            NodeKind::Scalar(yaml) => match yaml {
                Yaml::String(s) => Value::String(s.clone()),
                Yaml::Integer(i) => Value::from(*i),
                Yaml::Real(r) => r
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map_or_else(|| Value::String(r.clone()), Value::Number),
                Yaml::Boolean(b) => Value::Bool(*b),
                _ => Value::Null,
            },
            NodeKind::Array(items) => Value::Array(items.iter().map(|i| i.value.to_json()).collect()),
            NodeKind::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|e| (e.key.clone(), e.value.to_json()))
                    .collect(),
            ),
        }
    }
}

pub(crate) fn scalar_type_name(yaml: &Yaml) -> &'static str {
    match yaml {
        Yaml::String(_) => "string",
        Yaml::Integer(_) => "int",
        Yaml::Real(_) => "float",
        Yaml::Boolean(_) => "bool",
        Yaml::Null => "null",
        _ => "unknown",
    }
}
