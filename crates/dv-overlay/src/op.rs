//! The overlay operation.

use crate::directive::{EditKind, MATCH_CHILD_DEFAULTS, NodeDirective, OVERLAY_PREFIX};
use crate::error::OverlayError;
use dv_yaml::{ArrayItem, DocumentSet, MapEntry, NodeKind, ValueDocument, ValueNode};

/// Overlay `right` onto `left`.
///
/// With `exact_match`, every right node must find its counterpart unless it
/// (or an ancestor, via `overlay/match-child-defaults`) says `missing_ok=True`.
/// Without it, missing nodes are inserted.
#[derive(Debug, Clone)]
pub struct OverlayOp {
    pub left: DocumentSet,
    pub right: DocumentSet,
    pub exact_match: bool,
}

impl OverlayOp {
    pub fn apply(mut self) -> Result<DocumentSet, OverlayError> {
        let mut result = std::mem::take(&mut self.left.documents);

        for right in &self.right.documents {
            if right.is_empty() {
                continue;
            }
            if result.is_empty() {
                if self.exact_match {
                    return Err(OverlayError::NoLeftDocument {
                        location: right.source_info.clone(),
                    });
                }
                result.push(inserted_document(right));
                continue;
            }
            for left in result.iter_mut() {
                *left = self.overlay_document(left, right)?;
            }
        }

        Ok(DocumentSet::new(result))
    }

    fn overlay_document(
        &self,
        left: &ValueDocument,
        right: &ValueDocument,
    ) -> Result<ValueDocument, OverlayError> {
        let directive = NodeDirective::from_annotations(&right.annotations, "<document>", &right.source_info)?;
        if directive.edit != EditKind::Merge || directive.by.is_some() {
            return Err(OverlayError::InvalidDirective {
                path: "<document>".to_string(),
                message: format!(
                    "documents of data values only accept `{}`",
                    MATCH_CHILD_DEFAULTS
                ),
                location: right.source_info.clone(),
            });
        }

        let Some(right_root) = right.root.as_ref() else {
            return Ok(left.clone());
        };

        let root = match left.root.as_ref() {
            Some(left_root) if !left_root.is_null() => {
                self.overlay_node(left_root, right_root, directive.child_missing_ok, "")?
            }
            _ => stripped(right_root),
        };

        Ok(ValueDocument {
            root: Some(root),
            annotations: left.annotations.clone(),
            source_info: left.source_info.clone(),
        })
    }

    fn overlay_node(
        &self,
        left: &ValueNode,
        right: &ValueNode,
        inherited_missing_ok: Option<bool>,
        path: &str,
    ) -> Result<ValueNode, OverlayError> {
        match (&left.kind, &right.kind) {
            (NodeKind::Map(left_entries), NodeKind::Map(right_entries)) => {
                let entries = self.overlay_map(left_entries, right_entries, inherited_missing_ok, path)?;
                Ok(ValueNode::map(entries, left.source_info.clone()))
            }
            (NodeKind::Array(left_items), NodeKind::Array(right_items)) => {
                let items = self.overlay_array(left_items, right_items, inherited_missing_ok, path)?;
                Ok(ValueNode::array(items, left.source_info.clone()))
            }
            _ => Ok(stripped(right)),
        }
    }

    fn missing_ok(&self, directive: &NodeDirective, inherited: Option<bool>) -> bool {
        directive.missing_ok.or(inherited).unwrap_or(!self.exact_match)
    }

    fn overlay_map(
        &self,
        left: &[MapEntry],
        right: &[MapEntry],
        inherited_missing_ok: Option<bool>,
        path: &str,
    ) -> Result<Vec<MapEntry>, OverlayError> {
        let mut result = left.to_vec();

        for entry in right {
            let entry_path = join_key(path, &entry.key);
            let directive = NodeDirective::from_annotations(&entry.annotations, &entry_path, &entry.key_source)?;
            if directive.by.is_some() || directive.edit == EditKind::Append {
                return Err(OverlayError::InvalidDirective {
                    path: entry_path,
                    message: "`by=` and `overlay/append` only apply to array items".to_string(),
                    location: entry.key_source.clone(),
                });
            }
            let missing_ok = self.missing_ok(&directive, inherited_missing_ok);
            let child_defaults = directive.child_missing_ok.or(inherited_missing_ok);

            match result.iter().position(|e| e.key == entry.key) {
                Some(idx) => match directive.edit {
                    EditKind::Remove => {
                        result.remove(idx);
                    }
                    EditKind::Replace => {
                        result[idx].value = stripped(&entry.value);
                    }
                    EditKind::Merge | EditKind::Append => {
                        result[idx].value =
                            self.overlay_node(&result[idx].value, &entry.value, child_defaults, &entry_path)?;
                    }
                },
                None if !missing_ok => {
                    return Err(OverlayError::MissingMatch {
                        path: entry_path,
                        location: entry.key_source.clone(),
                    });
                }
                None => {
                    if directive.edit != EditKind::Remove {
                        result.push(stripped_entry(entry));
                    }
                }
            }
        }

        Ok(result)
    }

    fn overlay_array(
        &self,
        left: &[ArrayItem],
        right: &[ArrayItem],
        inherited_missing_ok: Option<bool>,
        path: &str,
    ) -> Result<Vec<ArrayItem>, OverlayError> {
        let mut result = left.to_vec();

        for (position, item) in right.iter().enumerate() {
            let item_path = format!("{}[{}]", path, position);
            let directive =
                NodeDirective::from_annotations(&item.annotations, &item_path, &item.value.source_info)?;
            let child_defaults = directive.child_missing_ok.or(inherited_missing_ok);

            if directive.edit == EditKind::Append {
                result.push(stripped_item(item));
                continue;
            }

            let matches: Vec<usize> = match &directive.by {
                Some(field) => {
                    let Some(wanted) = item.value.get(field) else {
                        return Err(OverlayError::InvalidDirective {
                            path: item_path,
                            message: format!("array item has no `{}` key to match by", field),
                            location: item.value.source_info.clone(),
                        });
                    };
                    let wanted = wanted.to_yaml();
                    result
                        .iter()
                        .enumerate()
                        .filter(|(_, candidate)| {
                            candidate.value.get(field).map(ValueNode::to_yaml).as_ref() == Some(&wanted)
                        })
                        .map(|(idx, _)| idx)
                        .collect()
                }
                None => Vec::new(),
            };

            match matches.as_slice() {
                [] => {
                    if !self.missing_ok(&directive, inherited_missing_ok) {
                        return Err(OverlayError::MissingMatch {
                            path: item_path,
                            location: item.value.source_info.clone(),
                        });
                    }
                    if directive.edit != EditKind::Remove {
                        result.push(stripped_item(item));
                    }
                }
                [idx] => {
                    let idx = *idx;
                    match directive.edit {
                        EditKind::Remove => {
                            result.remove(idx);
                        }
                        EditKind::Replace => result[idx].value = stripped(&item.value),
                        EditKind::Merge | EditKind::Append => {
                            result[idx].value =
                                self.overlay_node(&result[idx].value, &item.value, child_defaults, &item_path)?;
                        }
                    }
                }
                many => {
                    return Err(OverlayError::AmbiguousMatch {
                        path: item_path,
                        count: many.len(),
                        location: item.value.source_info.clone(),
                    });
                }
            }
        }

        Ok(result)
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn stripped(node: &ValueNode) -> ValueNode {
    let mut node = node.clone();
    node.strip_annotations(OVERLAY_PREFIX);
    node
}

fn stripped_entry(entry: &MapEntry) -> MapEntry {
    let mut entry = entry.clone();
    entry.annotations.remove_prefixed(OVERLAY_PREFIX);
    entry.value.strip_annotations(OVERLAY_PREFIX);
    entry
}

fn stripped_item(item: &ArrayItem) -> ArrayItem {
    let mut item = item.clone();
    item.annotations.remove_prefixed(OVERLAY_PREFIX);
    item.value.strip_annotations(OVERLAY_PREFIX);
    item
}

fn inserted_document(doc: &ValueDocument) -> ValueDocument {
    let mut doc = doc.clone();
    doc.annotations.remove_prefixed(OVERLAY_PREFIX);
    if let Some(root) = doc.root.as_mut() {
        root.strip_annotations(OVERLAY_PREFIX);
    }
    doc
}
