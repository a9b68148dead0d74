//! Data values pre-processing for a library.
//!
//! Given the data values files of one library, external overlays and a schema,
//! produce the library's effective data values:
//!
//! 1. files are sorted by relative path and rendered;
//! 2. every `#@data/values` document is extracted ([`extract_tagged`]);
//! 3. each document is classified as targeting the current library or a
//!    descendant one ([`classify`]);
//! 4. current-library documents are overlaid in order onto a base that the
//!    schema may pre-seed with defaults, type checking after every step;
//! 5. external overlays are folded in last.
//!
//! ```rust
//! use dv_core::{DataValuesPreProcessing, LibraryFile, PlainYamlRenderer, ResolveOptions};
//! use dv_schema::NullSchema;
//!
//! let files = vec![
//!     LibraryFile::in_memory("20-prod.yml", "#@data/values\n---\nport: 443\n"),
//!     LibraryFile::in_memory("10-defaults.yml", "#@data/values\n---\nport: 80\nhost: a\n"),
//! ];
//! let result = DataValuesPreProcessing::new(files, &PlainYamlRenderer, &NullSchema)
//!     .with_options(ResolveOptions::default())
//!     .apply()
//!     .unwrap();
//!
//! assert_eq!(result.values.get("port").unwrap().as_i64(), Some(443));
//! assert_eq!(result.values.get("host").unwrap().as_str(), Some("a"));
//! ```

mod config;
mod error;
mod external;
mod extract;
mod library;
mod merge;
mod overlay;
mod preprocess;
mod render;
mod schema_loader;
mod source;

pub use config::{ResolveOptions, SchemaMode};
pub use error::{Result, ValuesError};
pub use external::{
    overlay_from_key_value, overlay_from_string_arg, overlay_from_yaml_arg, overlays_from_file,
    overlays_from_str, parse_key_value,
};
pub use extract::{ExtractOptions, Extracted, extract_tagged};
pub use library::{LibraryContext, LibraryFile, LibraryRef, sort_files};
pub use merge::{MergeResult, resolve};
pub use overlay::{overlay, with_default_match_policy};
pub use preprocess::DataValuesPreProcessing;
pub use render::{PlainYamlRenderer, RenderFailure, TemplateRenderer};
pub use schema_loader::{LibrarySchema, load_library_schema, load_schema};
pub use source::{MatchPolicy, TargetScope, ValueSource, classify};

/// Document tag for data values documents.
pub const DATA_VALUES_TAG: &str = "data/values";
/// Document annotation naming the library a data values document targets.
pub const LIBRARY_REF: &str = "library/ref";
/// Description used for external overlays in error messages.
pub const ADDITIONAL_VALUES: &str = "additional data values";
