//! Diagnostic messages for the data values pipeline.
//!
//! Every error kind produced while extracting, overlaying or type checking data
//! values can be turned into a [`DiagnosticMessage`]. Messages follow a
//! tidyverse-like structure (title, problem, details, hints) and render either
//! as plain text or, when the file content is known, as an ariadne source
//! snippet.
//!
//! ```
//! use dv_error_reporting::DiagnosticMessageBuilder;
//!
//! let error = DiagnosticMessageBuilder::error("Mixed Content In Data Values File")
//!     .with_code("DV-2-2")
//!     .problem("`values.yml` must only contain data values documents")
//!     .add_hint("Move the template document into its own file?")
//!     .build();
//!
//! assert_eq!(error.code.as_deref(), Some("DV-2-2"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info, get_subsystem};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage};
