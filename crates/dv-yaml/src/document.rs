//! Documents and document sets.

use crate::annotations::{Annotation, Annotations};
use crate::node::{MapEntry, ValueNode};
use dv_source_map::SourceInfo;
use yaml_rust2::Yaml;

/// One YAML document of a stream, with its document-level annotations.
///
/// Documents are never changed in place by the pipeline; operations such as
/// [`ValueDocument::with_annotation`] return a new document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDocument {
    pub root: Option<ValueNode>,
    pub annotations: Annotations,
    pub source_info: SourceInfo,
}

impl ValueDocument {
    pub fn new(root: ValueNode, source_info: SourceInfo) -> Self {
        ValueDocument {
            root: Some(root),
            annotations: Annotations::new(),
            source_info,
        }
    }

    /// A document without content.
    pub fn empty(source_info: SourceInfo) -> Self {
        ValueDocument {
            root: None,
            annotations: Annotations::new(),
            source_info,
        }
    }

    /// A document whose root is an empty map.
    pub fn empty_map(source_info: SourceInfo) -> Self {
        Self::new(ValueNode::map(Vec::new(), source_info.clone()), source_info)
    }

    /// A document from root map entries.
    pub fn from_entries(entries: Vec<MapEntry>, source_info: SourceInfo) -> Self {
        Self::new(ValueNode::map(entries, source_info.clone()), source_info)
    }

    /// True when the document holds no values: no root, a null root, or a
    /// map or array root without items.
    pub fn is_empty(&self) -> bool {
        self.root.as_ref().is_none_or(ValueNode::is_empty)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.has(name)
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.get(name)
    }

    /// A copy of this document carrying `annotation` under `name`.
    pub fn with_annotation(&self, name: &str, annotation: Annotation) -> Self {
        let mut doc = self.clone();
        doc.annotations.set(name, annotation);
        doc
    }

    /// A copy of this document without the annotation `name`.
    pub fn without_annotation(&self, name: &str) -> Self {
        let mut doc = self.clone();
        doc.annotations.remove(name);
        doc
    }

    pub fn get(&self, key: &str) -> Option<&ValueNode> {
        self.root.as_ref()?.get(key)
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&ValueNode> {
        self.root.as_ref()?.get_path(path)
    }

    pub fn to_yaml(&self) -> Yaml {
        self.root.as_ref().map_or(Yaml::Null, ValueNode::to_yaml)
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.root.as_ref().map_or(serde_json::Value::Null, ValueNode::to_json)
    }
}

/// The documents of one YAML stream, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSet {
    pub documents: Vec<ValueDocument>,
}

impl DocumentSet {
    pub fn new(documents: Vec<ValueDocument>) -> Self {
        DocumentSet { documents }
    }

    pub fn single(document: ValueDocument) -> Self {
        DocumentSet {
            documents: vec![document],
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValueDocument> {
        self.documents.iter()
    }
}

impl From<Vec<ValueDocument>> for DocumentSet {
    fn from(documents: Vec<ValueDocument>) -> Self {
        DocumentSet { documents }
    }
}

impl IntoIterator for DocumentSet {
    type Item = ValueDocument;
    type IntoIter = std::vec::IntoIter<ValueDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}
