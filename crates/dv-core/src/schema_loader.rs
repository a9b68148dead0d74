//! Builds the schema binding of a library from its schema documents.

use crate::config::{ResolveOptions, SchemaMode};
use crate::error::{Result, ValuesError};
use crate::extract::{ExtractOptions, Extracted, extract_tagged};
use crate::library::{LibraryContext, LibraryFile};
use crate::render::TemplateRenderer;
use dv_overlay::OverlayOp;
use dv_schema::{DocumentSchema, MissingSchema, NullSchema, SCHEMA_TAG, SchemaBinding};
use dv_yaml::{DocumentSet, ValueDocument};

/// A library's schema and the files that hold its data values.
#[derive(Debug)]
pub struct LibrarySchema {
    pub schema: Box<dyn SchemaBinding>,
    /// Every file that is not made only of schema documents, in the given order.
    pub values_files: Vec<LibraryFile>,
}

/// Collect every `#@data/values-schema` document of `files` into one schema.
///
/// Several schema documents are combined in file order, later documents
/// extending earlier ones. Files may mix schema and other documents.
pub fn load_schema(
    files: &[LibraryFile],
    renderer: &dyn TemplateRenderer,
    options: ResolveOptions,
) -> Result<Box<dyn SchemaBinding>> {
    if options.schema == SchemaMode::Disabled {
        return Ok(Box::new(NullSchema));
    }
    let mut schema_docs = Vec::new();
    for file in files {
        schema_docs.extend(render_schema_documents(file, renderer, options)?.tagged);
    }
    build_schema(schema_docs, options.schema)
}

/// Split `files` into schema files and data values files, then load the
/// schema from the former.
///
/// A schema file renders to at least one schema document and nothing else
/// but empty documents. Schema files are set aside even when the schema is
/// disabled.
pub fn load_library_schema(
    files: Vec<LibraryFile>,
    renderer: &dyn TemplateRenderer,
    options: ResolveOptions,
) -> Result<LibrarySchema> {
    let mut schema_docs = Vec::new();
    let mut values_files = Vec::new();
    for file in files {
        let extracted = render_schema_documents(&file, renderer, options)?;
        let schema_only =
            !extracted.tagged.is_empty() && extracted.untagged.iter().all(ValueDocument::is_empty);
        if schema_only {
            tracing::debug!(path = %file.relative_path, "Schema file");
            schema_docs.extend(extracted.tagged);
        } else {
            values_files.push(file);
        }
    }

    let schema: Box<dyn SchemaBinding> = if options.schema == SchemaMode::Disabled {
        Box::new(NullSchema)
    } else {
        build_schema(schema_docs, options.schema)?
    };
    Ok(LibrarySchema {
        schema,
        values_files,
    })
}

fn render_schema_documents(
    file: &LibraryFile,
    renderer: &dyn TemplateRenderer,
    options: ResolveOptions,
) -> Result<Extracted> {
    let docs = renderer
        .render(&LibraryContext::root(), file)
        .map_err(|source| ValuesError::Render {
            path: file.relative_path.clone(),
            source,
        })?;
    let extract_options = ExtractOptions {
        ignore_unknown_annotations: options.ignore_unknown_annotations,
    };
    extract_tagged(docs, SCHEMA_TAG, extract_options)
}

fn build_schema(schema_docs: Vec<ValueDocument>, mode: SchemaMode) -> Result<Box<dyn SchemaBinding>> {
    let mut docs = schema_docs.into_iter();
    let Some(first) = docs.next() else {
        tracing::debug!(mode = ?mode, "No schema documents");
        let schema: Box<dyn SchemaBinding> = match mode {
            SchemaMode::Required => Box::new(MissingSchema),
            _ => Box::new(NullSchema),
        };
        return Ok(schema);
    };

    let mut combined = first;
    let mut count = 1;
    for doc in docs {
        count += 1;
        let op = OverlayOp {
            left: DocumentSet::single(combined.clone()),
            right: DocumentSet::single(doc),
            exact_match: false,
        };
        let origin = combined.source_info.clone();
        combined = op
            .apply()
            .map_err(|source| ValuesError::Overlay {
                origin: "schema".to_string(),
                source,
            })?
            .documents
            .pop()
            .unwrap_or_else(|| ValueDocument::empty(origin));
    }
    tracing::debug!(documents = count, "Loading schema");

    let schema = DocumentSchema::from_document(&combined).map_err(ValuesError::InvalidSchema)?;
    Ok(Box::new(schema))
}
