//! Source context for managing files

use crate::source_info::{SourceInfo, SourceMapping};
use crate::types::FileId;
use serde::{Deserialize, Serialize};

/// Registry of the files a merge run has read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: Vec<SourceFile>,
}

/// A source file with optional in-memory content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// File path, relative to the library root where possible
    pub path: String,
    /// File content. When None, content is read from disk on demand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SourceContext {
    pub fn new() -> Self {
        SourceContext { files: Vec::new() }
    }

    /// Add a file to the context and return its ID
    pub fn add_file(&mut self, path: String, content: Option<String>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile { path, content });
        id
    }

    /// Get a file by ID
    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Content of a file, reading from disk for disk-backed entries.
    pub fn content(&self, id: FileId) -> Option<String> {
        let file = self.get_file(id)?;
        match &file.content {
            Some(content) => Some(content.clone()),
            None => std::fs::read_to_string(&file.path).ok(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Human-readable `path:line:column` (1-based) for a source location.
    pub fn describe(&self, info: &SourceInfo) -> String {
        match &info.mapping {
            SourceMapping::Original { file_id } => {
                let path = self
                    .get_file(*file_id)
                    .map_or("<unknown file>", |f| f.path.as_str());
                format!(
                    "{}:{}:{}",
                    path,
                    info.range.start.row + 1,
                    info.range.start.column + 1
                )
            }
            SourceMapping::Generated { origin } => format!("<{}>", origin),
        }
    }
}
