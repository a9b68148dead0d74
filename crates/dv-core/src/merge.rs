//! The merge engine: folds classified sources into one document.

use crate::ADDITIONAL_VALUES;
use crate::error::{Result, ValuesError};
use crate::overlay::{overlay, with_default_match_policy};
use crate::source::{ValueSource, classify};
use dv_schema::SchemaBinding;
use dv_source_map::SourceInfo;
use dv_yaml::ValueDocument;

/// The outcome of resolving one library's data values.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Merged values of the current library.
    pub values: ValueDocument,
    /// Sources addressed to descendant libraries, untouched and in order.
    pub library_values: Vec<ValueSource>,
}

#[derive(Debug)]
enum MergeState {
    /// No root-scope document observed yet.
    Empty,
    HasBase(ValueDocument),
}

struct MergeEngine<'a> {
    schema: &'a dyn SchemaBinding,
    state: MergeState,
    /// Whether an explicit root value has already been validated against
    /// the schema. Schema defaults do not count.
    root_value_permitted: bool,
    library_values: Vec<ValueSource>,
}

impl<'a> MergeEngine<'a> {
    fn new(schema: &'a dyn SchemaBinding) -> Self {
        MergeEngine {
            schema,
            state: MergeState::Empty,
            root_value_permitted: false,
            library_values: Vec::new(),
        }
    }

    fn seed_defaults(&mut self) -> Result<()> {
        if let Some(defaults) = self.schema.default_document() {
            tracing::debug!("Seeding data values with schema defaults");
            self.type_check(&defaults, "schema defaults")?;
            self.state = MergeState::HasBase(defaults);
        }
        Ok(())
    }

    fn permit_root_value(&mut self, origin: &str) -> Result<()> {
        if self.root_value_permitted {
            return Ok(());
        }
        self.schema
            .validate_root_value_permitted(1)
            .map_err(|source| ValuesError::SchemaPermission {
                origin: origin.to_string(),
                source,
            })?;
        self.root_value_permitted = true;
        Ok(())
    }

    /// Fold one file-provided source.
    fn add_source(&mut self, source: ValueSource) -> Result<()> {
        if !source.is_current_scope() {
            tracing::debug!(origin = %source.origin, "Deferring data values to library");
            self.library_values.push(source);
            return Ok(());
        }
        self.permit_root_value(&source.origin)?;
        let typing = self.schema.is_typing_active();
        let next = match &self.state {
            MergeState::Empty => {
                tracing::debug!(origin = %source.origin, "Using data values as base");
                source.document.clone()
            }
            MergeState::HasBase(base) => {
                tracing::debug!(origin = %source.origin, "Overlaying data values");
                let patch = with_default_match_policy(&source, typing);
                overlay(base, &patch).map_err(|err| ValuesError::Overlay {
                    origin: source.origin.clone(),
                    source: err,
                })?
            }
        };
        self.type_check(&next, &source.origin)?;
        self.state = MergeState::HasBase(next);
        Ok(())
    }

    /// Fold one externally supplied overlay.
    fn add_external(&mut self, document: ValueDocument) -> Result<()> {
        let source = classify(document, ADDITIONAL_VALUES)?;
        if !source.is_current_scope() {
            tracing::debug!("Deferring additional data values to library");
            self.library_values.push(source);
            return Ok(());
        }
        self.permit_root_value(ADDITIONAL_VALUES)?;
        self.type_check(&source.document, ADDITIONAL_VALUES)?;
        let next = match &self.state {
            MergeState::Empty => source.document,
            MergeState::HasBase(base) => {
                tracing::debug!("Overlaying additional data values");
                overlay(base, &source.document).map_err(|err| ValuesError::Overlay {
                    origin: ADDITIONAL_VALUES.to_string(),
                    source: err,
                })?
            }
        };
        self.type_check(&next, ADDITIONAL_VALUES)?;
        self.state = MergeState::HasBase(next);
        Ok(())
    }

    fn type_check(&self, document: &ValueDocument, origin: &str) -> Result<()> {
        if !self.schema.is_typing_active() {
            return Ok(());
        }
        let check = match self.schema.assign_types(document) {
            Ok(typed) => typed.check(),
            Err(check) => check,
        };
        if check.has_violations() {
            tracing::debug!(origin = %origin, violations = check.len(), "Type check failed");
            return Err(ValuesError::TypeViolation {
                origin: origin.to_string(),
                check,
            });
        }
        Ok(())
    }

    fn finish(self) -> MergeResult {
        let values = match self.state {
            MergeState::HasBase(doc) => doc,
            MergeState::Empty => ValueDocument::empty_map(SourceInfo::generated("no data values")),
        };
        MergeResult {
            values,
            library_values: self.library_values,
        }
    }
}

/// Merge `sources` in order, then `external_overlays` in order.
///
/// Fails at the first source whose merge produces an overlay error or a
/// type violation; nothing is returned on failure.
pub fn resolve(
    sources: Vec<ValueSource>,
    external_overlays: Vec<ValueDocument>,
    schema: &dyn SchemaBinding,
) -> Result<MergeResult> {
    let mut engine = MergeEngine::new(schema);
    engine.seed_defaults()?;
    for source in sources {
        engine.add_source(source)?;
    }
    for document in external_overlays {
        engine.add_external(document)?;
    }
    let result = engine.finish();
    tracing::debug!(
        library_values = result.library_values.len(),
        "Resolved data values"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_schema::{DocumentSchema, MissingSchema, NullSchema};
    use dv_yaml::parse_stream;
    use serde_json::json;

    fn doc(src: &str) -> ValueDocument {
        parse_stream(src).unwrap().documents.remove(0)
    }

    fn source(src: &str, origin: &str) -> ValueSource {
        classify(doc(src), origin).unwrap()
    }

    fn schema(src: &str) -> DocumentSchema {
        DocumentSchema::from_document(&doc(src)).unwrap()
    }

    #[test]
    fn test_first_source_becomes_base() {
        let result = resolve(vec![source("a: 1\n", "a.yml")], vec![], &NullSchema).unwrap();
        assert_eq!(result.values.to_json(), json!({"a": 1}));
        assert!(result.library_values.is_empty());
    }

    #[test]
    fn test_later_sources_win() {
        let result = resolve(
            vec![source("a: 1\nb: 1\n", "a.yml"), source("a: 2\n", "b.yml")],
            vec![],
            &NullSchema,
        )
        .unwrap();
        assert_eq!(result.values.to_json(), json!({"a": 2, "b": 1}));
    }

    #[test]
    fn test_no_sources_gives_empty_map() {
        let result = resolve(vec![], vec![], &NullSchema).unwrap();
        assert!(result.values.root.as_ref().unwrap().is_map());
        assert_eq!(result.values.to_json(), json!({}));
    }

    #[test]
    fn test_library_sources_are_set_aside() {
        let lib = source("#@library/ref \"@app\"\n---\nx: 1\n", "lib.yml");
        let result = resolve(vec![lib, source("a: 1\n", "a.yml")], vec![], &NullSchema).unwrap();
        assert_eq!(result.values.to_json(), json!({"a": 1}));
        assert_eq!(result.library_values.len(), 1);
        assert_eq!(result.library_values[0].document.to_json(), json!({"x": 1}));
    }

    #[test]
    fn test_unmatched_key_without_schema_fails() {
        let err = resolve(
            vec![source("a: 1\n", "a.yml"), source("b: 2\n", "b.yml")],
            vec![],
            &NullSchema,
        )
        .unwrap_err();
        match err {
            ValuesError::Overlay { origin, .. } => assert_eq!(origin, "b.yml"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_schema_defaults_seed_base() {
        let schema = schema("port: 80\nhost: localhost\n");
        let result = resolve(vec![source("port: 8080\n", "a.yml")], vec![], &schema).unwrap();
        assert_eq!(result.values.to_json(), json!({"port": 8080, "host": "localhost"}));
    }

    #[test]
    fn test_schema_defaults_without_sources() {
        let schema = schema("port: 80\n");
        let result = resolve(vec![], vec![], &schema).unwrap();
        assert_eq!(result.values.to_json(), json!({"port": 80}));
    }

    #[test]
    fn test_type_violation_names_offending_source() {
        let schema = schema("port: 80\n");
        let err = resolve(
            vec![
                source("port: 81\n", "a.yml"),
                source("port: not-a-number\n", "b.yml"),
                source("port: 82\n", "c.yml"),
            ],
            vec![],
            &schema,
        )
        .unwrap_err();
        match err {
            ValuesError::TypeViolation { origin, check } => {
                assert_eq!(origin, "b.yml");
                assert_eq!(check.len(), 1);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_missing_schema_forbids_values() {
        let err = resolve(vec![source("a: 1\n", "a.yml")], vec![], &MissingSchema).unwrap_err();
        assert!(matches!(err, ValuesError::SchemaPermission { .. }));
        // no values at all is fine
        assert!(resolve(vec![], vec![], &MissingSchema).is_ok());
    }

    #[test]
    fn test_external_overlays_apply_last_in_order() {
        let result = resolve(
            vec![source("a: 1\n", "a.yml")],
            vec![doc("a: 2\n"), doc("a: 3\n")],
            &NullSchema,
        )
        .unwrap();
        assert_eq!(result.values.to_json(), json!({"a": 3}));
    }

    #[test]
    fn test_external_overlay_is_type_checked() {
        let schema = schema("port: 80\n");
        let err = resolve(vec![], vec![doc("port: \"x\"\n")], &schema).unwrap_err();
        match err {
            ValuesError::TypeViolation { origin, .. } => assert_eq!(origin, ADDITIONAL_VALUES),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_external_overlay_gets_no_default_match_policy() {
        let schema = schema("#@schema/type any=True\nextra: {}\n");
        let patch = "extra:\n  k: 1\n";

        // as a file, the missing key is allowed by the injected policy
        let result = resolve(vec![source(patch, "a.yml")], vec![], &schema).unwrap();
        assert_eq!(result.values.to_json(), json!({"extra": {"k": 1}}));

        // as an external overlay, it has to match exactly
        let err = resolve(vec![], vec![doc(patch)], &schema).unwrap_err();
        match err {
            ValuesError::Overlay { origin, source } => {
                assert_eq!(origin, ADDITIONAL_VALUES);
                assert!(matches!(source, dv_overlay::OverlayError::MissingMatch { ref path, .. } if path == "extra.k"));
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
