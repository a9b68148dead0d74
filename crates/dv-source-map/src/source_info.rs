//! Source information attached to every value node

use crate::types::{FileId, Location, Range};
use serde::{Deserialize, Serialize};

/// Where a value came from: a range plus the origin of that range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// The range in the originating text
    pub range: Range,
    /// What the range refers to
    pub mapping: SourceMapping,
}

/// Describes the origin of a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceMapping {
    /// Direct position in a registered file
    Original { file_id: FileId },
    /// Value synthesized by the pipeline or supplied outside any file
    /// (command-line overrides, generated schema defaults, empty fallbacks)
    Generated { origin: String },
}

impl Default for SourceInfo {
    fn default() -> Self {
        SourceInfo::unknown()
    }
}

impl SourceInfo {
    /// Create source info for a position in an original file
    pub fn original(file_id: FileId, range: Range) -> Self {
        SourceInfo {
            range,
            mapping: SourceMapping::Original { file_id },
        }
    }

    /// Create source info for a value that did not come from a file
    pub fn generated(origin: impl Into<String>) -> Self {
        SourceInfo {
            range: Range::default(),
            mapping: SourceMapping::Generated {
                origin: origin.into(),
            },
        }
    }

    /// Position is not known at all
    pub fn unknown() -> Self {
        SourceInfo::generated("unknown")
    }

    /// File this value was read from, if any
    pub fn file_id(&self) -> Option<FileId> {
        match &self.mapping {
            SourceMapping::Original { file_id } => Some(*file_id),
            SourceMapping::Generated { .. } => None,
        }
    }

    pub fn start(&self) -> Location {
        self.range.start
    }

    /// Same origin, different range.
    pub fn with_range(&self, range: Range) -> Self {
        SourceInfo {
            range,
            mapping: self.mapping.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_source_info() {
        let range = Range {
            start: Location { offset: 0, row: 0, column: 0 },
            end: Location { offset: 10, row: 0, column: 10 },
        };

        let info = SourceInfo::original(FileId(3), range);

        assert_eq!(info.range, range);
        assert_eq!(info.file_id(), Some(FileId(3)));
    }

    #[test]
    fn test_generated_has_no_file() {
        let info = SourceInfo::generated("command line");
        assert_eq!(info.file_id(), None);
        match info.mapping {
            SourceMapping::Generated { origin } => assert_eq!(origin, "command line"),
            _ => panic!("Expected Generated mapping"),
        }
    }

    #[test]
    fn test_with_range_keeps_origin() {
        let info = SourceInfo::original(FileId(1), Range::default());
        let moved = info.with_range(Range::point(Location { offset: 4, row: 1, column: 2 }));
        assert_eq!(moved.file_id(), Some(FileId(1)));
        assert_eq!(moved.start().row, 1);
    }
}
