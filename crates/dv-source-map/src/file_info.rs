//! Offset to row/column lookups

use crate::types::Location;
use serde::{Deserialize, Serialize};

/// Line index of a file, for converting character offsets into locations.
///
/// Offsets are counted in characters, which is what the YAML scanner reports
/// and what ariadne expects for its spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInformation {
    /// Character offsets of each `\n`
    line_breaks: Vec<usize>,

    /// Length of the file in characters
    total_length: usize,
}

impl FileInformation {
    /// ```
    /// use dv_source_map::FileInformation;
    ///
    /// let info = FileInformation::new("a: 1\nb: 2");
    /// let loc = info.offset_to_location(5).unwrap();
    /// assert_eq!((loc.row, loc.column), (1, 0));
    /// ```
    pub fn new(content: &str) -> Self {
        let mut line_breaks = Vec::new();
        let mut total_length = 0;
        for (idx, ch) in content.chars().enumerate() {
            if ch == '\n' {
                line_breaks.push(idx);
            }
            total_length = idx + 1;
        }

        FileInformation {
            line_breaks,
            total_length,
        }
    }

    /// Returns None if the offset is past the end of the file.
    pub fn offset_to_location(&self, offset: usize) -> Option<Location> {
        if offset > self.total_length {
            return None;
        }

        // A newline belongs to the line it terminates
        let row = match self.line_breaks.binary_search(&offset) {
            Ok(idx) | Err(idx) => idx,
        };
        let line_start = if row == 0 {
            0
        } else {
            self.line_breaks[row - 1] + 1
        };

        Some(Location {
            offset,
            row,
            column: offset - line_start,
        })
    }

    pub fn line_count(&self) -> usize {
        self.line_breaks.len() + 1
    }

    pub fn total_length(&self) -> usize {
        self.total_length
    }
}
