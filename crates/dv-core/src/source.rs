//! Classified data values sources.

use crate::LIBRARY_REF;
use crate::error::{Result, ValuesError};
use crate::library::LibraryRef;
use dv_overlay::MATCH_CHILD_DEFAULTS;
use dv_yaml::ValueDocument;

/// Which library a source's values are for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetScope {
    Current,
    Library(LibraryRef),
}

/// The `overlay/match-child-defaults` a document declares for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    pub missing_ok: Option<bool>,
}

/// A data values document with its directives read once, up front.
#[derive(Debug, Clone)]
pub struct ValueSource {
    pub document: ValueDocument,
    pub target: TargetScope,
    pub match_policy: Option<MatchPolicy>,
    /// Where the document came from, for error messages.
    pub origin: String,
}

impl ValueSource {
    pub fn is_current_scope(&self) -> bool {
        self.target == TargetScope::Current
    }
}

/// Read the library target and match policy of `document`.
///
/// A `library/ref` with an empty name targets the current library.
pub fn classify(document: ValueDocument, origin: impl Into<String>) -> Result<ValueSource> {
    let target = match document.annotation(LIBRARY_REF) {
        None => TargetScope::Current,
        Some(annotation) => {
            let name = match annotation.args.as_slice() {
                [value] => value.as_str().ok_or_else(|| ValuesError::InvalidLibraryRef {
                    value: value.to_string(),
                    reason: "expected a string such as \"@name\"".to_string(),
                    location: annotation.source_info.clone(),
                })?,
                _ => {
                    return Err(ValuesError::InvalidLibraryRef {
                        value: String::new(),
                        reason: "expected exactly one library name".to_string(),
                        location: annotation.source_info.clone(),
                    });
                }
            };
            let library = LibraryRef::parse(name, &annotation.source_info)?;
            if library.is_current() {
                TargetScope::Current
            } else {
                TargetScope::Library(library)
            }
        }
    };

    let match_policy = document.annotation(MATCH_CHILD_DEFAULTS).map(|annotation| MatchPolicy {
        missing_ok: annotation.kwarg("missing_ok").and_then(|v| v.as_bool()),
    });

    Ok(ValueSource {
        document,
        target,
        match_policy,
        origin: origin.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_yaml::parse_stream;

    fn first(src: &str) -> ValueDocument {
        parse_stream(src).unwrap().documents.remove(0)
    }

    #[test]
    fn test_current_scope_by_default() {
        let source = classify(first("#@data/values\n---\na: 1\n"), "values.yml").unwrap();
        assert!(source.is_current_scope());
        assert_eq!(source.match_policy, None);
        assert_eq!(source.origin, "values.yml");
    }

    #[test]
    fn test_library_target() {
        let source = classify(
            first("#@data/values\n#@library/ref \"@app@db\"\n---\na: 1\n"),
            "values.yml",
        )
        .unwrap();
        match &source.target {
            TargetScope::Library(r) => assert_eq!(r.to_string(), "@app@db"),
            other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn test_empty_library_name_is_current_scope() {
        let source = classify(first("#@library/ref \"\"\n---\na: 1\n"), "x").unwrap();
        assert!(source.is_current_scope());
    }

    #[test]
    fn test_invalid_library_refs() {
        assert!(classify(first("#@library/ref 3\n---\na: 1\n"), "x").is_err());
        assert!(classify(first("#@library/ref\n---\na: 1\n"), "x").is_err());
        assert!(classify(first("#@library/ref \"app\"\n---\na: 1\n"), "x").is_err());
    }

    #[test]
    fn test_declared_match_policy() {
        let source = classify(
            first("#@overlay/match-child-defaults missing_ok=False\n---\na: 1\n"),
            "x",
        )
        .unwrap();
        assert_eq!(
            source.match_policy,
            Some(MatchPolicy {
                missing_ok: Some(false)
            })
        );
    }
}
