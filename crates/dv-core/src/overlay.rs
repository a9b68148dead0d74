//! Call boundary to the overlay engine.

use crate::source::ValueSource;
use dv_overlay::{MATCH_CHILD_DEFAULTS, OverlayError, OverlayOp};
use dv_source_map::SourceInfo;
use dv_yaml::{Annotation, AnnotationValue, DocumentSet, ValueDocument};

/// Overlay `patch` onto `base` in exact match mode.
pub fn overlay(base: &ValueDocument, patch: &ValueDocument) -> Result<ValueDocument, OverlayError> {
    let op = OverlayOp {
        left: DocumentSet::single(base.clone()),
        right: DocumentSet::single(patch.clone()),
        exact_match: true,
    };
    let mut result = op.apply()?;
    match result.documents.pop() {
        Some(doc) => Ok(doc),
        None => Err(OverlayError::NoLeftDocument {
            location: patch.source_info.clone(),
        }),
    }
}

/// The document to overlay for `source`.
///
/// With typing active, a document that declares no
/// `overlay/match-child-defaults` of its own gets `missing_ok=True`, so sparse
/// documents may omit structure supplied by schema defaults. The source is
/// never modified.
pub fn with_default_match_policy(source: &ValueSource, typing_active: bool) -> ValueDocument {
    if !typing_active || source.match_policy.is_some() {
        return source.document.clone();
    }
    let annotation = Annotation::new(SourceInfo::generated("schema defaults"))
        .with_kwarg("missing_ok", AnnotationValue::Bool(true));
    source.document.with_annotation(MATCH_CHILD_DEFAULTS, annotation)
}
