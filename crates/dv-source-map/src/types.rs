//! Core types for source positions

use serde::{Deserialize, Serialize};

/// A unique identifier for a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub usize);

/// A location in source text (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Location {
    /// Character offset from start of source
    pub offset: usize,
    /// Row number (0-indexed)
    pub row: usize,
    /// Column number (0-indexed, in characters)
    pub column: usize,
}

/// A range in source text from start to end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    /// Start location (inclusive)
    pub start: Location,
    /// End location (exclusive)
    pub end: Location,
}

impl Range {
    /// A zero-width range at `location`.
    pub fn point(location: Location) -> Self {
        Range {
            start: location,
            end: location,
        }
    }

    /// Number of characters covered by the range.
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_ordering() {
        let loc1 = Location { offset: 0, row: 0, column: 0 };
        let loc2 = Location { offset: 5, row: 0, column: 5 };
        let loc3 = Location { offset: 10, row: 1, column: 0 };

        assert!(loc1 < loc2);
        assert!(loc2 < loc3);
    }

    #[test]
    fn test_range_len() {
        let range = Range {
            start: Location { offset: 4, row: 0, column: 4 },
            end: Location { offset: 9, row: 0, column: 9 },
        };
        assert_eq!(range.len(), 5);
        assert!(!range.is_empty());
        assert!(Range::point(range.start).is_empty());
    }

    #[test]
    fn test_serialization_range() {
        let range = Range {
            start: Location { offset: 0, row: 0, column: 0 },
            end: Location { offset: 50, row: 2, column: 10 },
        };
        let json = serde_json::to_string(&range).unwrap();
        let deserialized: Range = serde_json::from_str(&json).unwrap();
        assert_eq!(range, deserialized);
    }
}
