// Type assignment and checking of data values against a schema

use crate::error::{InstancePath, TypeCheck, Violation, ViolationKind};
use crate::types::{SchemaNode, SchemaType};
use dv_yaml::{NodeKind, ValueNode};

/// A document whose nodes have been paired with their declared types.
///
/// Produced by [`crate::SchemaBinding::assign_types`]; [`TypedDocument::check`]
/// then verifies every scalar against its type.
#[derive(Debug, Clone, Default)]
pub struct TypedDocument<'a> {
    assignments: Vec<Assignment<'a>>,
}

#[derive(Debug, Clone)]
struct Assignment<'a> {
    path: InstancePath,
    node: &'a ValueNode,
    schema: &'a SchemaNode,
}

impl<'a> TypedDocument<'a> {
    /// A document with no type information; checking it always succeeds.
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn assigned_count(&self) -> usize {
        self.assignments.len()
    }

    /// Check every typed value, collecting all violations.
    pub fn check(&self) -> TypeCheck {
        let mut result = TypeCheck::ok();
        for assignment in &self.assignments {
            let schema = assignment.schema;
            let node = assignment.node;
            let kind = match &node.kind {
                NodeKind::Scalar(_) if node.is_null() => {
                    if schema.nullable || matches!(schema.ty, SchemaType::Any) {
                        continue;
                    }
                    ViolationKind::NullNotAllowed {
                        expected: schema.type_name(),
                    }
                }
                NodeKind::Scalar(yaml) => match &schema.ty {
                    SchemaType::Scalar(scalar) if scalar.accepts(yaml) => continue,
                    SchemaType::Any => continue,
                    _ => ViolationKind::TypeMismatch {
                        expected: schema.type_name(),
                        found: node.type_name().to_string(),
                    },
                },
                // containers were checked structurally during assignment
                _ => continue,
            };
            result.violations.push(Violation {
                kind,
                path: assignment.path.clone(),
                location: node.source_info.clone(),
                declared_at: Some(schema.source_info.clone()),
            });
        }
        result
    }
}

/// Walks a value tree alongside a schema tree.
pub(crate) struct Assigner<'a> {
    path: InstancePath,
    assignments: Vec<Assignment<'a>>,
    violations: TypeCheck,
}

impl<'a> Assigner<'a> {
    pub(crate) fn new() -> Self {
        Assigner {
            path: InstancePath::new(),
            assignments: Vec::new(),
            violations: TypeCheck::ok(),
        }
    }

    pub(crate) fn assign(
        mut self,
        value: &'a ValueNode,
        schema: &'a SchemaNode,
    ) -> Result<TypedDocument<'a>, TypeCheck> {
        self.visit(value, schema);
        if self.violations.has_violations() {
            return Err(self.violations);
        }
        Ok(TypedDocument {
            assignments: self.assignments,
        })
    }

    fn visit(&mut self, value: &'a ValueNode, schema: &'a SchemaNode) {
        match (&schema.ty, &value.kind) {
            (SchemaType::Any, _) => {}
            (_, NodeKind::Scalar(_)) if value.is_null() => self.record(value, schema),
            (SchemaType::Map(_), NodeKind::Map(entries)) => {
                for entry in entries {
                    self.path.push_key(entry.key.clone());
                    match schema.field(&entry.key) {
                        Some(field) => self.visit(&entry.value, field),
                        None => self.violations.violations.push(Violation {
                            kind: ViolationKind::UndeclaredKey {
                                key: entry.key.clone(),
                            },
                            path: self.path.clone(),
                            location: entry.key_source.clone(),
                            declared_at: Some(schema.source_info.clone()),
                        }),
                    }
                    self.path.pop();
                }
            }
            (SchemaType::Array(item_schema), NodeKind::Array(items)) => {
                for (idx, item) in items.iter().enumerate() {
                    self.path.push_index(idx);
                    self.visit(&item.value, item_schema);
                    self.path.pop();
                }
            }
            (SchemaType::Scalar(_), NodeKind::Scalar(_)) => self.record(value, schema),
            _ => self.violations.violations.push(Violation {
                kind: ViolationKind::TypeMismatch {
                    expected: schema.type_name(),
                    found: value.type_name().to_string(),
                },
                path: self.path.clone(),
                location: value.source_info.clone(),
                declared_at: Some(schema.source_info.clone()),
            }),
        }
    }

    fn record(&mut self, node: &'a ValueNode, schema: &'a SchemaNode) {
        self.assignments.push(Assignment {
            path: self.path.clone(),
            node,
            schema,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::{DocumentSchema, SchemaBinding, ViolationKind};
    use dv_yaml::{ValueDocument, parse_stream};

    fn schema() -> DocumentSchema {
        let docs = parse_stream(
            "\
---
port: 80
ratio: 1.0
#@schema/nullable
owner: \"\"
servers:
- name: \"\"
  tls: false
",
        )
        .unwrap();
        DocumentSchema::from_document(&docs.documents[0]).unwrap()
    }

    fn values(src: &str) -> ValueDocument {
        parse_stream(src).unwrap().documents.remove(0)
    }

    #[test]
    fn test_valid_values() {
        let schema = schema();
        let doc = values("port: 8080\nratio: 2\nowner: ~\nservers:\n- {name: a, tls: true}\n");
        let typed = schema.assign_types(&doc).unwrap();
        assert!(typed.assigned_count() > 0);
        assert!(typed.check().is_ok());
    }

    #[test]
    fn test_undeclared_keys_are_reported_during_assignment() {
        let schema = schema();
        let doc = values("port: 1\nextra: 2\nservers:\n- {name: a, nope: 1}\n");
        let check = schema.assign_types(&doc).unwrap_err();
        let paths: Vec<String> = check.violations.iter().map(|v| v.path.to_string()).collect();
        assert_eq!(paths, vec!["extra", "servers[0].nope"]);
        assert!(matches!(
            check.violations[0].kind,
            ViolationKind::UndeclaredKey { .. }
        ));
    }

    #[test]
    fn test_structural_mismatch_is_reported_during_assignment() {
        let schema = schema();
        let doc = values("servers: {name: a}\n");
        let check = schema.assign_types(&doc).unwrap_err();
        assert_eq!(
            check.violations[0].kind,
            ViolationKind::TypeMismatch {
                expected: "array".into(),
                found: "map".into()
            }
        );
    }

    #[test]
    fn test_scalar_mismatches_are_all_collected() {
        let schema = schema();
        let doc = values("port: \"80\"\nratio: fast\nservers:\n- {name: 1, tls: ~}\n");
        let check = schema.assign_types(&doc).unwrap().check();
        let messages: Vec<String> = check.violations.iter().map(|v| v.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "port: Expected int, got string",
                "ratio: Expected float, got string",
                "servers[0].name: Expected string, got int",
                "servers[0].tls: Expected bool, got null (value is not nullable)",
            ]
        );
    }

    #[test]
    fn test_empty_values_document() {
        let schema = schema();
        let doc = values("---\n");
        assert!(schema.assign_types(&doc).unwrap().check().is_ok());
    }
}
