//! # dv-yaml
//!
//! Data values documents: YAML trees where every node keeps its source
//! location and every map entry, array item and document can carry
//! annotations written as `#@name args` comments.
//!
//! ```rust
//! use dv_yaml::parse_stream;
//!
//! let docs = parse_stream("#@data/values\n---\nport: 8080\n").unwrap();
//! let doc = &docs.documents[0];
//!
//! assert!(doc.has_annotation("data/values"));
//! let port = doc.root.as_ref().and_then(|r| r.get("port")).unwrap();
//! assert_eq!(port.as_i64(), Some(8080));
//! ```

mod annotations;
mod document;
mod error;
mod node;
mod parser;

pub use annotations::{Annotation, AnnotationValue, Annotations, parse_annotation_line};
pub use document::{DocumentSet, ValueDocument};
pub use dv_source_map::SourceInfo;
pub use error::{Error, Result};
pub use node::{ArrayItem, MapEntry, NodeKind, ValueNode};
pub use parser::{parse_stream, parse_stream_in_file, parse_stream_with_origin};
pub use yaml_rust2::Yaml;
