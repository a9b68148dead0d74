//! Schema types inferred from a schema document.

use dv_source_map::SourceInfo;
use dv_yaml::ValueNode;
use std::fmt;
use yaml_rust2::Yaml;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Bool,
}

impl ScalarType {
    pub fn of(yaml: &Yaml) -> Option<Self> {
        match yaml {
            Yaml::String(_) => Some(ScalarType::String),
            Yaml::Integer(_) => Some(ScalarType::Int),
            Yaml::Real(_) => Some(ScalarType::Float),
            Yaml::Boolean(_) => Some(ScalarType::Bool),
            _ => None,
        }
    }

    /// Ints are accepted where floats are declared.
    pub fn accepts(&self, yaml: &Yaml) -> bool {
        matches!(
            (self, yaml),
            (ScalarType::String, Yaml::String(_))
                | (ScalarType::Int, Yaml::Integer(_))
                | (ScalarType::Float, Yaml::Real(_) | Yaml::Integer(_))
                | (ScalarType::Bool, Yaml::Boolean(_))
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::String => "string",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    Map(Vec<(String, SchemaNode)>),
    Array(Box<SchemaNode>),
    Scalar(ScalarType),
    /// `schema/type any=True`: anything goes.
    Any,
}

/// A declared slot: its type, default value and documentation.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub ty: SchemaType,
    pub nullable: bool,
    pub default: ValueNode,
    pub description: Option<String>,
    pub source_info: SourceInfo,
}

impl SchemaNode {
    pub fn field(&self, key: &str) -> Option<&SchemaNode> {
        match &self.ty {
            SchemaType::Map(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, n)| n),
            _ => None,
        }
    }

    /// Type name as shown in violations.
    pub fn type_name(&self) -> String {
        let base = match &self.ty {
            SchemaType::Map(_) => "map".to_string(),
            SchemaType::Array(_) => "array".to_string(),
            SchemaType::Scalar(scalar) => scalar.to_string(),
            SchemaType::Any => "any".to_string(),
        };
        if self.nullable {
            format!("{} or null", base)
        } else {
            base
        }
    }
}
