//! Overlay engine for data values documents.
//!
//! An overlay patches a *left* document set with a *right* one. Maps merge
//! key by key, scalars are replaced, and `#@overlay/...` annotations on the
//! right side control matching and editing:
//!
//! | Annotation | Effect |
//! |---|---|
//! | `overlay/match missing_ok=True, by="name"` | missing counterpart allowed; array items matched by key |
//! | `overlay/match-child-defaults missing_ok=True` | default `missing_ok` for all descendants |
//! | `overlay/replace` | replace the matched node instead of merging |
//! | `overlay/remove` | remove the matched node |
//! | `overlay/append` | append an array item without matching |
//!
//! ```rust
//! use dv_overlay::OverlayOp;
//! use dv_yaml::parse_stream;
//!
//! let left = parse_stream("db:\n  host: localhost\n  port: 5432\n").unwrap();
//! let right = parse_stream("db:\n  port: 6543\n").unwrap();
//!
//! let result = OverlayOp { left, right, exact_match: true }.apply().unwrap();
//! let doc = &result.documents[0];
//! assert_eq!(doc.get_path(&["db", "port"]).unwrap().as_i64(), Some(6543));
//! assert_eq!(doc.get_path(&["db", "host"]).unwrap().as_str(), Some("localhost"));
//! ```

mod directive;
mod error;
mod op;

pub use directive::{
    APPEND, EditKind, MATCH, MATCH_CHILD_DEFAULTS, MERGE, NodeDirective, OVERLAY_PREFIX, REMOVE,
    REPLACE,
};
pub use error::OverlayError;
pub use op::OverlayOp;
