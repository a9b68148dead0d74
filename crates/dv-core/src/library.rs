//! Library files and library references.

use crate::error::{Result, ValuesError};
use dv_source_map::{FileId, SourceContext, SourceInfo};
use std::fmt;

/// A file belonging to the library being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFile {
    /// Path relative to the library root; determines processing order.
    pub relative_path: String,
    pub content: String,
    /// Id of the file in the caller's `SourceContext`, for diagnostics.
    pub file_id: Option<FileId>,
}

impl LibraryFile {
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>, file_id: FileId) -> Self {
        LibraryFile {
            relative_path: relative_path.into(),
            content: content.into(),
            file_id: Some(file_id),
        }
    }

    /// A file that is not registered in any `SourceContext`.
    pub fn in_memory(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        LibraryFile {
            relative_path: relative_path.into(),
            content: content.into(),
            file_id: None,
        }
    }

    /// Register the file's content in `ctx` and remember its id.
    pub fn registered(relative_path: impl Into<String>, content: impl Into<String>, ctx: &mut SourceContext) -> Self {
        let relative_path = relative_path.into();
        let content = content.into();
        let file_id = ctx.add_file(relative_path.clone(), Some(content.clone()));
        LibraryFile {
            relative_path,
            content,
            file_id: Some(file_id),
        }
    }
}

/// Sort files into processing order: lexical by relative path.
///
/// Overlaying is order sensitive, so this order is part of the result.
pub fn sort_files(files: &mut [LibraryFile]) {
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
}

/// Reference to a library relative to the current one, e.g. `@app@db`.
///
/// The empty reference is the current library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LibraryRef {
    segments: Vec<String>,
}

impl LibraryRef {
    pub fn current() -> Self {
        Self::default()
    }

    /// ```
    /// use dv_core::LibraryRef;
    /// use dv_source_map::SourceInfo;
    ///
    /// let r = LibraryRef::parse("@app@db", &SourceInfo::unknown()).unwrap();
    /// assert_eq!(r.segments(), ["app", "db"]);
    /// assert!(LibraryRef::parse("", &SourceInfo::unknown()).unwrap().is_current());
    /// assert!(LibraryRef::parse("app", &SourceInfo::unknown()).is_err());
    /// ```
    pub fn parse(value: &str, location: &SourceInfo) -> Result<Self> {
        if value.is_empty() {
            return Ok(Self::current());
        }
        let invalid = |reason: &str| ValuesError::InvalidLibraryRef {
            value: value.to_string(),
            reason: reason.to_string(),
            location: location.clone(),
        };
        let Some(rest) = value.strip_prefix('@') else {
            return Err(invalid("library references start with `@`"));
        };
        let segments: Vec<String> = rest.split('@').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid("library names must not be empty"));
        }
        Ok(LibraryRef { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_current(&self) -> bool {
        self.segments.is_empty()
    }

    /// The reference seen from the first segment's library.
    pub fn descend(&self) -> Option<(String, LibraryRef)> {
        let (first, rest) = self.segments.split_first()?;
        Some((
            first.clone(),
            LibraryRef {
                segments: rest.to_vec(),
            },
        ))
    }
}

impl fmt::Display for LibraryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "@{}", segment)?;
        }
        Ok(())
    }
}

/// Where rendering happens: the library being resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryContext {
    pub current: LibraryRef,
}

impl LibraryContext {
    pub fn root() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_files_is_lexical() {
        let mut files = vec![
            LibraryFile::in_memory("values/b.yml", ""),
            LibraryFile::in_memory("a.yml", ""),
            LibraryFile::in_memory("values/a.yml", ""),
            LibraryFile::in_memory("B.yml", ""),
        ];
        sort_files(&mut files);
        let order: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(order, vec!["B.yml", "a.yml", "values/a.yml", "values/b.yml"]);
    }

    #[test]
    fn test_library_ref_round_trip_display() {
        let r = LibraryRef::parse("@app@db", &SourceInfo::unknown()).unwrap();
        assert_eq!(r.to_string(), "@app@db");
        let (first, rest) = r.descend().unwrap();
        assert_eq!(first, "app");
        assert_eq!(rest.to_string(), "@db");
    }

    #[test]
    fn test_library_ref_rejects_empty_segments() {
        for bad in ["@", "@app@", "@@db"] {
            let err = LibraryRef::parse(bad, &SourceInfo::unknown()).unwrap_err();
            assert!(matches!(err, ValuesError::InvalidLibraryRef { .. }), "{}", bad);
        }
    }

    #[test]
    fn test_registered_file_gets_an_id() {
        let mut ctx = SourceContext::new();
        let file = LibraryFile::registered("values.yml", "a: 1", &mut ctx);
        assert_eq!(file.file_id, Some(FileId(0)));
        assert_eq!(ctx.content(FileId(0)).as_deref(), Some("a: 1"));
    }
}
