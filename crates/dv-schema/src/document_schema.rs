//! Schema built from a `data/values-schema` document.

use crate::binding::SchemaBinding;
use crate::error::{InstancePath, SchemaError, TypeCheck};
use crate::types::{ScalarType, SchemaNode, SchemaType};
use crate::typing::{Assigner, TypedDocument};
use crate::{DESC, NULLABLE, TYPE};
use dv_source_map::SourceInfo;
use dv_yaml::{Annotations, ArrayItem, MapEntry, NodeKind, ValueDocument, ValueNode};
use yaml_rust2::Yaml;

/// A schema declared by a document.
///
/// ```rust
/// use dv_schema::{DocumentSchema, SchemaBinding};
/// use dv_yaml::parse_stream;
///
/// let docs = parse_stream("#@data/values-schema\n---\nport: 80\nhosts:\n- \"\"\n").unwrap();
/// let schema = DocumentSchema::from_document(&docs.documents[0]).unwrap();
///
/// let defaults = schema.default_document().unwrap();
/// assert_eq!(defaults.get("port").unwrap().as_i64(), Some(80));
/// assert_eq!(defaults.get("hosts").unwrap().as_array().unwrap().len(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct DocumentSchema {
    /// `None` when the schema document declares no values at all.
    root: Option<SchemaNode>,
    source_info: SourceInfo,
}

impl DocumentSchema {
    pub fn from_document(doc: &ValueDocument) -> Result<Self, SchemaError> {
        let root = match &doc.root {
            Some(node) if !node.is_null() => {
                let mut path = InstancePath::new();
                Some(build_node(node, &Annotations::new(), &mut path)?)
            }
            _ => None,
        };
        Ok(DocumentSchema {
            root,
            source_info: doc.source_info.clone(),
        })
    }

    pub fn root(&self) -> Option<&SchemaNode> {
        self.root.as_ref()
    }
}

impl SchemaBinding for DocumentSchema {
    fn default_document(&self) -> Option<ValueDocument> {
        self.root
            .as_ref()
            .map(|root| ValueDocument::new(root.default.clone(), self.source_info.clone()))
    }

    fn validate_root_value_permitted(&self, count: usize) -> Result<(), SchemaError> {
        if self.root.is_none() && count > 0 {
            return Err(SchemaError::ValuesNotPermitted {
                reason: "the schema does not declare any values".to_string(),
            });
        }
        Ok(())
    }

    fn is_typing_active(&self) -> bool {
        true
    }

    fn assign_types<'a>(&'a self, doc: &'a ValueDocument) -> Result<TypedDocument<'a>, TypeCheck> {
        let (Some(schema), Some(value)) = (self.root.as_ref(), doc.root.as_ref()) else {
            return Ok(TypedDocument::untyped());
        };
        if value.is_null() {
            return Ok(TypedDocument::untyped());
        }
        Assigner::new().assign(value, schema)
    }
}

fn build_node(
    node: &ValueNode,
    annotations: &Annotations,
    path: &mut InstancePath,
) -> Result<SchemaNode, SchemaError> {
    let invalid = |path: &InstancePath, message: String| SchemaError::InvalidSchema {
        path: path.to_string(),
        message,
        location: node.source_info.clone(),
    };

    let mut nullable = false;
    let mut any = false;
    let mut description = None;

    for (name, annotation) in annotations.iter() {
        match name {
            NULLABLE => nullable = true,
            TYPE => match annotation.kwarg("any").and_then(|v| v.as_bool()) {
                Some(flag) if annotation.kwargs.len() == 1 && annotation.args.is_empty() => {
                    any = flag
                }
                _ => {
                    return Err(invalid(
                        path,
                        "`schema/type` expects exactly `any=True` or `any=False`".to_string(),
                    ));
                }
            },
            DESC => match annotation.args.first().and_then(|v| v.as_str()) {
                Some(text) => description = Some(text.to_string()),
                None => {
                    return Err(invalid(
                        path,
                        "`schema/desc` expects a string argument".to_string(),
                    ));
                }
            },
            other if other.starts_with("schema/") => {
                return Err(invalid(path, format!("unknown schema annotation `{}`", other)));
            }
            _ => {}
        }
    }

    let default_of = |value: ValueNode| {
        if nullable {
            ValueNode::null(node.source_info.clone())
        } else {
            value
        }
    };

    if any {
        return Ok(SchemaNode {
            ty: SchemaType::Any,
            nullable,
            default: default_of(stripped(node)),
            description,
            source_info: node.source_info.clone(),
        });
    }

    let (ty, default) = match &node.kind {
        NodeKind::Map(entries) => {
            let mut fields = Vec::with_capacity(entries.len());
            let mut defaults = Vec::with_capacity(entries.len());
            for entry in entries {
                path.push_key(entry.key.clone());
                let field = build_node(&entry.value, &entry.annotations, path)?;
                path.pop();
                defaults.push(MapEntry {
                    key: entry.key.clone(),
                    key_source: entry.key_source.clone(),
                    value: field.default.clone(),
                    annotations: Annotations::new(),
                });
                fields.push((entry.key.clone(), field));
            }
            (
                SchemaType::Map(fields),
                ValueNode::map(defaults, node.source_info.clone()),
            )
        }
        NodeKind::Array(items) => {
            let [item] = items.as_slice() else {
                return Err(invalid(
                    path,
                    format!(
                        "an array must have exactly one item describing its items, found {}",
                        items.len()
                    ),
                ));
            };
            path.push_index(0);
            let item_schema = build_node(&item.value, &item.annotations, path)?;
            path.pop();
            (
                SchemaType::Array(Box::new(item_schema)),
                ValueNode::array(Vec::new(), node.source_info.clone()),
            )
        }
        NodeKind::Scalar(yaml) => match ScalarType::of(yaml) {
            Some(scalar) => (SchemaType::Scalar(scalar), node.clone()),
            None if matches!(yaml, Yaml::Null) => {
                return Err(invalid(
                    path,
                    "cannot infer a type from null; give an example value and annotate it with `#@schema/nullable`, or use `#@schema/type any=True`".to_string(),
                ));
            }
            None => {
                return Err(invalid(path, "unsupported scalar value".to_string()));
            }
        },
    };

    Ok(SchemaNode {
        ty,
        nullable,
        default: default_of(default),
        description,
        source_info: node.source_info.clone(),
    })
}

/// Defaults carry no annotations.
fn stripped(node: &ValueNode) -> ValueNode {
    let mut node = node.clone();
    match &mut node.kind {
        NodeKind::Map(entries) => {
            for entry in entries.iter_mut() {
                entry.annotations = Annotations::new();
                entry.value = stripped(&entry.value);
            }
        }
        NodeKind::Array(items) => {
            *items = items
                .iter()
                .map(|item| ArrayItem::new(stripped(&item.value)))
                .collect();
        }
        NodeKind::Scalar(_) => {}
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_yaml::parse_stream;
    use serde_json::json;

    fn schema(src: &str) -> Result<DocumentSchema, SchemaError> {
        let docs = parse_stream(src).unwrap();
        DocumentSchema::from_document(&docs.documents[0])
    }

    #[test]
    fn test_defaults_from_schema() {
        let s = schema(
            "\
#@data/values-schema
---
name: app
replicas: 2
ratio: 0.5
#@schema/nullable
owner: \"\"
db:
  host: localhost
ports:
- 80
#@schema/type any=True
extra:
  free: [1, \"two\"]
",
        )
        .unwrap();

        let defaults = s.default_document().unwrap();
        assert_eq!(
            defaults.to_json(),
            json!({
                "name": "app",
                "replicas": 2,
                "ratio": 0.5,
                "owner": null,
                "db": {"host": "localhost"},
                "ports": [],
                "extra": {"free": [1, "two"]},
            })
        );
        assert!(s.is_typing_active());
    }

    #[test]
    fn test_field_types() {
        let s = schema("---\na: 1\nb: [\"\"]\n#@schema/nullable\nc: true\n").unwrap();
        let root = s.root().unwrap();
        assert_eq!(root.field("a").unwrap().type_name(), "int");
        assert_eq!(root.field("b").unwrap().type_name(), "array");
        assert_eq!(root.field("c").unwrap().type_name(), "bool or null");
    }

    #[test]
    fn test_description_is_kept() {
        let s = schema("---\n#@schema/desc \"Listening port\"\nport: 80\n").unwrap();
        assert_eq!(
            s.root().unwrap().field("port").unwrap().description.as_deref(),
            Some("Listening port")
        );
    }

    #[test]
    fn test_null_without_annotation_is_rejected() {
        let err = schema("---\nowner: null\n").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema { ref path, .. } if path == "owner"));
    }

    #[test]
    fn test_array_needs_exactly_one_item() {
        assert!(schema("---\nl: []\n").is_err());
        assert!(schema("---\nl: [1, 2]\n").is_err());
    }

    #[test]
    fn test_unknown_schema_annotation() {
        let err = schema("---\n#@schema/default 3\nx: 1\n").unwrap_err();
        assert!(err.to_string().contains("unknown schema annotation"));
    }

    #[test]
    fn test_empty_schema_forbids_values() {
        let s = schema("#@data/values-schema\n---\n").unwrap();
        assert!(s.default_document().is_none());
        assert!(s.validate_root_value_permitted(0).is_ok());
        assert!(matches!(
            s.validate_root_value_permitted(1),
            Err(SchemaError::ValuesNotPermitted { .. })
        ));
    }
}
