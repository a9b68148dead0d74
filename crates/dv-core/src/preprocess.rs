//! Entry point for resolving one library's data values.

use crate::config::ResolveOptions;
use crate::error::{Result, ValuesError};
use crate::extract::{ExtractOptions, extract_tagged};
use crate::library::{LibraryContext, LibraryFile, LibraryRef, sort_files};
use crate::merge::{MergeResult, resolve};
use crate::render::TemplateRenderer;
use crate::source::{ValueSource, classify};
use crate::{ADDITIONAL_VALUES, DATA_VALUES_TAG};
use dv_schema::SchemaBinding;
use dv_yaml::ValueDocument;

/// Resolves the data values of a library from its files, external
/// overlays and schema.
pub struct DataValuesPreProcessing<'a> {
    files: Vec<LibraryFile>,
    overlays: Vec<ValueDocument>,
    renderer: &'a dyn TemplateRenderer,
    schema: &'a dyn SchemaBinding,
    options: ResolveOptions,
    library: LibraryRef,
}

impl<'a> DataValuesPreProcessing<'a> {
    pub fn new(
        files: Vec<LibraryFile>,
        renderer: &'a dyn TemplateRenderer,
        schema: &'a dyn SchemaBinding,
    ) -> Self {
        DataValuesPreProcessing {
            files,
            overlays: Vec::new(),
            renderer,
            schema,
            options: ResolveOptions::default(),
            library: LibraryRef::current(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Overlays applied after every file, in the given order.
    pub fn with_overlays(mut self, overlays: Vec<ValueDocument>) -> Self {
        self.overlays = overlays;
        self
    }

    /// The library whose files are being resolved.
    pub fn with_library(mut self, library: LibraryRef) -> Self {
        self.library = library;
        self
    }

    /// Sort, render, extract and merge.
    ///
    /// Any failure is reported together with the order in which values
    /// were being overlaid.
    pub fn apply(mut self) -> Result<MergeResult> {
        let mut files = std::mem::take(&mut self.files);
        sort_files(&mut files);

        let mut order: Vec<String> = files.iter().map(|f| f.relative_path.clone()).collect();
        if !self.overlays.is_empty() {
            order.push(ADDITIONAL_VALUES.to_string());
        }
        tracing::debug!(library = %self.library, files = files.len(), "Pre-processing data values");

        self.resolve_sorted(&files)
            .map_err(|source| ValuesError::InOrder {
                order,
                source: Box::new(source),
            })
    }

    fn resolve_sorted(&self, files: &[LibraryFile]) -> Result<MergeResult> {
        let mut sources = Vec::new();
        for file in files {
            sources.extend(self.collect_file(file)?);
        }
        resolve(sources, self.overlays.clone(), self.schema)
    }

    fn collect_file(&self, file: &LibraryFile) -> Result<Vec<ValueSource>> {
        let ctx = LibraryContext {
            current: self.library.clone(),
        };
        let docs = self
            .renderer
            .render(&ctx, file)
            .map_err(|source| ValuesError::Render {
                path: file.relative_path.clone(),
                source,
            })?;

        let options = ExtractOptions {
            ignore_unknown_annotations: self.options.ignore_unknown_annotations,
        };
        let extracted = extract_tagged(docs, DATA_VALUES_TAG, options)?;

        if let Some(doc) = extracted.untagged.iter().find(|doc| !doc.is_empty()) {
            return Err(ValuesError::MixedContent {
                path: file.relative_path.clone(),
                location: doc.source_info.clone(),
            });
        }

        tracing::trace!(path = %file.relative_path, documents = extracted.tagged.len(), "Extracted data values");
        extracted
            .tagged
            .into_iter()
            .map(|doc| classify(doc, file.relative_path.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{PlainYamlRenderer, RenderFailure};
    use dv_schema::NullSchema;
    use dv_yaml::DocumentSet;
    use serde_json::json;

    fn file(path: &str, content: &str) -> LibraryFile {
        LibraryFile::in_memory(path, content)
    }

    #[test]
    fn test_files_are_sorted_before_merge() {
        let files = vec![
            file("b.yml", "#@data/values\n---\na: 2\n"),
            file("a.yml", "#@data/values\n---\na: 1\n"),
        ];
        let result = DataValuesPreProcessing::new(files, &PlainYamlRenderer, &NullSchema)
            .apply()
            .unwrap();
        assert_eq!(result.values.to_json(), json!({"a": 2}));
    }

    #[test]
    fn test_mixed_content_is_rejected() {
        let files = vec![file("a.yml", "#@data/values\n---\na: 1\n---\nkind: Pod\n")];
        let err = DataValuesPreProcessing::new(files, &PlainYamlRenderer, &NullSchema)
            .apply()
            .unwrap_err();
        assert!(matches!(err.root_cause(), ValuesError::MixedContent { path, .. } if path == "a.yml"));
    }

    #[test]
    fn test_empty_untagged_documents_are_allowed() {
        let files = vec![file("a.yml", "---\n#@data/values\n---\na: 1\n")];
        let result = DataValuesPreProcessing::new(files, &PlainYamlRenderer, &NullSchema)
            .apply()
            .unwrap();
        assert_eq!(result.values.to_json(), json!({"a": 1}));
    }

    #[test]
    fn test_error_lists_order() {
        let files = vec![
            file("b.yml", "#@data/values\n---\nb: 1\n"),
            file("a.yml", "#@data/values\n---\na: 1\n"),
        ];
        let err = DataValuesPreProcessing::new(files, &PlainYamlRenderer, &NullSchema)
            .with_overlays(vec![ValueDocument::empty_map(dv_source_map::SourceInfo::unknown())])
            .apply()
            .unwrap_err();
        let message = err.to_string();
        assert!(
            message.starts_with(
                "Overlaying data values (in following order: a.yml, b.yml, additional data values): "
            ),
            "{message}"
        );
    }

    struct FailingRenderer;

    impl TemplateRenderer for FailingRenderer {
        fn render(&self, _ctx: &LibraryContext, _file: &LibraryFile) -> std::result::Result<DocumentSet, RenderFailure> {
            Err(RenderFailure::Engine {
                message: "boom".to_string(),
            })
        }
    }

    #[test]
    fn test_render_failure_names_file() {
        let files = vec![file("a.yml", "")];
        let err = DataValuesPreProcessing::new(files, &FailingRenderer, &NullSchema)
            .apply()
            .unwrap_err();
        assert_eq!(err.root_cause().to_string(), "Templating file 'a.yml': boom");
    }
}
