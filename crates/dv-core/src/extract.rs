//! Extraction of tagged documents from a rendered document set.

use crate::error::{Result, ValuesError};
use crate::{DATA_VALUES_TAG, LIBRARY_REF};
use dv_schema::SCHEMA_TAG;
use dv_yaml::{Annotations, DocumentSet, NodeKind, ValueDocument, ValueNode};

/// Annotations only allowed on documents.
const DOCUMENT_ANNOTATIONS: &[&str] = &[DATA_VALUES_TAG, SCHEMA_TAG, LIBRARY_REF];
/// Namespaces of annotations understood on any node.
const NODE_NAMESPACES: &[&str] = &["overlay/", "schema/"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub ignore_unknown_annotations: bool,
}

/// Documents split by whether they carry the tag.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub tagged: Vec<ValueDocument>,
    pub untagged: Vec<ValueDocument>,
}

/// Split `docs` into documents annotated with `tag` and the rest, keeping
/// document order.
///
/// Unknown annotations fail unless `ignore_unknown_annotations` is set.
/// Document annotations (such as the tag itself) on nested nodes always fail.
pub fn extract_tagged(docs: DocumentSet, tag: &str, options: ExtractOptions) -> Result<Extracted> {
    let mut extracted = Extracted::default();

    for doc in docs {
        for (name, annotation) in doc.annotations.iter() {
            let known = DOCUMENT_ANNOTATIONS.contains(&name)
                || NODE_NAMESPACES.iter().any(|ns| name.starts_with(ns));
            if !known {
                unknown(name, &annotation.source_info, options)?;
            }
        }
        if let Some(root) = &doc.root {
            check_node(root, options)?;
        }

        if doc.has_annotation(tag) {
            extracted.tagged.push(doc);
        } else {
            extracted.untagged.push(doc);
        }
    }

    Ok(extracted)
}

fn unknown(name: &str, location: &dv_source_map::SourceInfo, options: ExtractOptions) -> Result<()> {
    if options.ignore_unknown_annotations {
        tracing::debug!(annotation = name, "Ignoring unknown annotation");
        return Ok(());
    }
    Err(ValuesError::UnknownAnnotation {
        name: name.to_string(),
        location: location.clone(),
    })
}

fn check_annotations(annotations: &Annotations, options: ExtractOptions) -> Result<()> {
    for (name, annotation) in annotations.iter() {
        if DOCUMENT_ANNOTATIONS.contains(&name) {
            return Err(ValuesError::MisplacedAnnotation {
                name: name.to_string(),
                location: annotation.source_info.clone(),
            });
        }
        if !NODE_NAMESPACES.iter().any(|ns| name.starts_with(ns)) {
            unknown(name, &annotation.source_info, options)?;
        }
    }
    Ok(())
}

fn check_node(node: &ValueNode, options: ExtractOptions) -> Result<()> {
    match &node.kind {
        NodeKind::Scalar(_) => Ok(()),
        NodeKind::Map(entries) => entries.iter().try_for_each(|entry| {
            check_annotations(&entry.annotations, options)?;
            check_node(&entry.value, options)
        }),
        NodeKind::Array(items) => items.iter().try_for_each(|item| {
            check_annotations(&item.annotations, options)?;
            check_node(&item.value, options)
        }),
    }
}
