//! Error code catalog and lookup.
//!
//! Maps codes like `DV-3-1` to their subsystem and default wording.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for an error code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCodeInfo {
    /// Subsystem name (e.g., "yaml", "overlay", "schema")
    pub subsystem: String,

    /// Short title for the error
    pub title: String,

    /// Default message
    pub message_template: String,

    /// URL to documentation (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,

    /// When this error was introduced (version)
    pub since_version: String,
}

/// Global error catalog, embedded at compile time.
///
/// # Panics
///
/// Panics if the embedded JSON is invalid, which can only happen when the
/// catalog file is edited by hand incorrectly.
pub static ERROR_CATALOG: Lazy<HashMap<String, ErrorCodeInfo>> = Lazy::new(|| {
    let json_data = include_str!("../error_catalog.json");
    serde_json::from_str(json_data).expect("Invalid error catalog JSON")
});

/// Look up error code information.
pub fn get_error_info(code: &str) -> Option<&ErrorCodeInfo> {
    ERROR_CATALOG.get(code)
}

/// Get the subsystem name for an error code.
///
/// ```
/// use dv_error_reporting::catalog::get_subsystem;
///
/// assert_eq!(get_subsystem("DV-3-1"), Some("overlay"));
/// ```
pub fn get_subsystem(code: &str) -> Option<&str> {
    ERROR_CATALOG.get(code).map(|info| info.subsystem.as_str())
}
