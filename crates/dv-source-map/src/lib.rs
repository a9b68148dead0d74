//! Source positions for data values documents.
//!
//! Every node produced by the `dv-yaml` parser carries a [`SourceInfo`] so that
//! overlay failures and schema violations can point back at the file and line
//! that introduced the offending value.
//!
//! - [`SourceInfo`]: a range plus where that range came from
//! - [`SourceMapping`]: an original file, or a value synthesized by the pipeline
//! - [`SourceContext`]: registry of files, used when rendering diagnostics
//!
//! # Example
//!
//! ```rust
//! use dv_source_map::*;
//!
//! let mut ctx = SourceContext::new();
//! let file_id = ctx.add_file("values.yml".into(), Some("port: 8080".into()));
//!
//! let range = Range {
//!     start: Location { offset: 6, row: 0, column: 6 },
//!     end: Location { offset: 10, row: 0, column: 10 },
//! };
//! let info = SourceInfo::original(file_id, range);
//!
//! assert_eq!(ctx.describe(&info), "values.yml:1:7");
//! ```

pub mod context;
pub mod file_info;
pub mod source_info;
pub mod types;

pub use context::{SourceContext, SourceFile};
pub use file_info::FileInformation;
pub use source_info::{SourceInfo, SourceMapping};
pub use types::{FileId, Location, Range};
