//! Rendering files into document sets.

use crate::library::{LibraryContext, LibraryFile};
use dv_yaml::{DocumentSet, parse_stream_in_file, parse_stream_with_origin};
use thiserror::Error;

/// Failure reported by a [`TemplateRenderer`].
#[derive(Debug, Error)]
pub enum RenderFailure {
    #[error(transparent)]
    Yaml(#[from] dv_yaml::Error),

    /// A failure of the template engine itself.
    #[error("{message}")]
    Engine { message: String },
}

/// Turns one library file into a sequence of documents.
pub trait TemplateRenderer {
    fn render(&self, ctx: &LibraryContext, file: &LibraryFile) -> Result<DocumentSet, RenderFailure>;
}

/// Renderer for files that contain plain annotated YAML and no template code.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainYamlRenderer;

impl TemplateRenderer for PlainYamlRenderer {
    fn render(&self, ctx: &LibraryContext, file: &LibraryFile) -> Result<DocumentSet, RenderFailure> {
        tracing::trace!(
            file = %file.relative_path,
            library = %ctx.current,
            "Rendering plain YAML"
        );
        let docs = match file.file_id {
            Some(file_id) => parse_stream_in_file(&file.content, file_id)?,
            None => parse_stream_with_origin(&file.content, &file.relative_path)?,
        };
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_source_map::FileId;

    #[test]
    fn test_plain_yaml_renderer() {
        let file = LibraryFile::new("values.yml", "a: 1\n---\nb: 2\n", FileId(4));
        let docs = PlainYamlRenderer.render(&LibraryContext::root(), &file).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs.documents[1].source_info.file_id(), Some(FileId(4)));
    }

    #[test]
    fn test_plain_yaml_renderer_rejects_template_code() {
        let file = LibraryFile::in_memory("values.yml", "#@ x = 1\na: 1\n");
        let err = PlainYamlRenderer.render(&LibraryContext::root(), &file).unwrap_err();
        assert!(matches!(err, RenderFailure::Yaml(dv_yaml::Error::Unsupported { .. })));
    }
}
