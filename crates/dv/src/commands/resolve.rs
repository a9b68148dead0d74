//! Resolve command implementation.
//!
//! `dv resolve` reads the data values and schema files of one library,
//! folds in values given on the command line, and prints the merged
//! values.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};
use walkdir::WalkDir;
use yaml_rust2::YamlEmitter;

use dv_core::{
    DataValuesPreProcessing, LibraryFile, LibrarySchema, PlainYamlRenderer, ResolveOptions,
    SchemaMode, TargetScope, ValuesError, load_library_schema, overlay_from_string_arg,
    overlay_from_yaml_arg, overlays_from_file,
};
use dv_source_map::SourceContext;
use dv_yaml::ValueDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Arguments for the resolve command
#[derive(Debug)]
pub struct ResolveArgs {
    /// Files or directories holding the library's files
    pub paths: Vec<String>,
    pub require_schema: bool,
    pub no_schema: bool,
    /// `KEY=VALUE`, value taken as a string
    pub data_value: Vec<String>,
    /// `KEY=YAML`
    pub data_value_yaml: Vec<String>,
    pub data_values_file: Vec<String>,
    pub ignore_unknown_comments: bool,
    pub output: OutputFormat,
    pub json_errors: bool,
}

/// Execute the resolve command
pub fn execute(args: ResolveArgs) -> Result<()> {
    let mut ctx = SourceContext::new();
    match run(&args, &mut ctx) {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(err) => match err.downcast_ref::<ValuesError>() {
            Some(values_err) => {
                report(values_err, &ctx, args.json_errors);
                anyhow::bail!("could not resolve data values")
            }
            None => Err(err),
        },
    }
}

/// Resolve and format the values; diagnostics are left to the caller.
pub(crate) fn run(args: &ResolveArgs, ctx: &mut SourceContext) -> Result<String> {
    let options = ResolveOptions::default()
        .with_ignore_unknown_annotations(args.ignore_unknown_comments)
        .with_schema_mode(schema_mode(args));

    let files = collect_files(&args.paths, ctx)?;
    let total = files.len();
    let LibrarySchema {
        schema,
        values_files,
    } = load_library_schema(files, &PlainYamlRenderer, options)?;
    info!(
        values = values_files.len(),
        schema = total - values_files.len(),
        "Resolving data values"
    );

    let overlays = external_overlays(args, ctx)?;

    let result = DataValuesPreProcessing::new(values_files, &PlainYamlRenderer, schema.as_ref())
        .with_options(options)
        .with_overlays(overlays)
        .apply()?;

    for source in &result.library_values {
        if let TargetScope::Library(library) = &source.target {
            info!(library = %library, origin = %source.origin, "Data values for library");
        }
    }

    format_values(&result.values, args.output)
}

fn schema_mode(args: &ResolveArgs) -> SchemaMode {
    if args.no_schema {
        SchemaMode::Disabled
    } else if args.require_schema {
        SchemaMode::Required
    } else {
        SchemaMode::Optional
    }
}

/// External overlays in the order: values files, YAML values, string values.
fn external_overlays(args: &ResolveArgs, ctx: &mut SourceContext) -> Result<Vec<ValueDocument>> {
    let mut overlays = Vec::new();
    for path in &args.data_values_file {
        overlays.extend(overlays_from_file(Path::new(path), ctx)?);
    }
    for arg in &args.data_value_yaml {
        overlays.push(overlay_from_yaml_arg(arg)?);
    }
    for arg in &args.data_value {
        overlays.push(overlay_from_string_arg(arg)?);
    }
    debug!(count = overlays.len(), "Collected external overlays");
    Ok(overlays)
}

fn collect_files(paths: &[String], ctx: &mut SourceContext) -> Result<Vec<LibraryFile>> {
    let mut files = Vec::new();
    for path in paths {
        let root = Path::new(path);
        if root.is_dir() {
            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry.with_context(|| format!("Failed to list {}", root.display()))?;
                if entry.file_type().is_file() && is_yaml(entry.path()) {
                    let relative = relative_path(entry.path(), root);
                    files.push(read_file(entry.path(), relative, ctx)?);
                }
            }
        } else {
            // named like a file at the root of a directory argument
            let relative = root
                .file_name()
                .map_or_else(|| path.clone(), |name| name.to_string_lossy().into_owned());
            files.push(read_file(root, relative, ctx)?);
        }
    }
    Ok(files)
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yml" | "yaml"))
}

/// `/`-joined path of `file` below `root`.
fn relative_path(file: &Path, root: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_file(path: &Path, relative: String, ctx: &mut SourceContext) -> Result<LibraryFile> {
    let content = std::fs::read_to_string(path).map_err(|source| ValuesError::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %relative, "Read library file");
    let file_id = ctx.add_file(path.display().to_string(), Some(content.clone()));
    Ok(LibraryFile::new(relative, content, file_id))
}

fn format_values(values: &ValueDocument, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(&values.to_json())?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Yaml => {
            let mut out = String::new();
            let mut emitter = YamlEmitter::new(&mut out);
            emitter
                .dump(&values.to_yaml())
                .map_err(|e| anyhow::anyhow!("Failed to write YAML: {:?}", e))?;
            out.push('\n');
            Ok(out)
        }
    }
}

fn report(err: &ValuesError, ctx: &SourceContext, json: bool) {
    let diagnostics = err.to_diagnostics();
    if json {
        let items: Vec<serde_json::Value> = diagnostics.iter().map(|d| d.to_json()).collect();
        eprintln!("{}", serde_json::Value::Array(items));
        return;
    }
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic.to_text(Some(ctx)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(paths: Vec<String>) -> ResolveArgs {
        ResolveArgs {
            paths,
            require_schema: false,
            no_schema: false,
            data_value: vec![],
            data_value_yaml: vec![],
            data_values_file: vec![],
            ignore_unknown_comments: false,
            output: OutputFormat::Json,
            json_errors: false,
        }
    }

    fn library() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("schema.yml"),
            "#@data/values-schema\n---\nport: 80\nhost: localhost\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("values")).unwrap();
        fs::write(
            dir.path().join("values/10-base.yml"),
            "#@data/values\n---\nport: 8080\n",
        )
        .unwrap();
        dir
    }

    fn parse(output: &str) -> serde_json::Value {
        serde_json::from_str(output).unwrap()
    }

    #[test]
    fn resolves_directory() {
        let dir = library();
        let mut ctx = SourceContext::new();
        let out = run(&args(vec![dir.path().display().to_string()]), &mut ctx).unwrap();
        assert_eq!(
            parse(&out),
            serde_json::json!({"port": 8080, "host": "localhost"})
        );
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn command_line_values_apply_last() {
        let dir = library();
        let mut a = args(vec![dir.path().display().to_string()]);
        a.data_value_yaml = vec!["port=9000".to_string()];
        a.data_value = vec!["host=example.com".to_string()];
        let out = run(&a, &mut SourceContext::new()).unwrap();
        assert_eq!(
            parse(&out),
            serde_json::json!({"port": 9000, "host": "example.com"})
        );
    }

    #[test]
    fn string_value_fails_type_check() {
        let dir = library();
        let mut a = args(vec![dir.path().display().to_string()]);
        a.data_value = vec!["port=9000".to_string()];
        let err = run(&a, &mut SourceContext::new()).unwrap_err();
        let values_err = err.downcast_ref::<ValuesError>().unwrap();
        assert!(matches!(values_err.root_cause(), ValuesError::TypeViolation { .. }));
    }

    #[test]
    fn values_file_overlay() {
        let dir = library();
        let extra = dir.path().join("extra.yaml.txt");
        fs::write(&extra, "port: 1\n").unwrap();
        let mut a = args(vec![dir.path().join("values").display().to_string()]);
        a.data_values_file = vec![extra.display().to_string()];
        a.no_schema = true;
        let out = run(&a, &mut SourceContext::new()).unwrap();
        assert_eq!(parse(&out), serde_json::json!({"port": 1}));
    }

    #[test]
    fn yaml_output() {
        let dir = library();
        let mut a = args(vec![dir.path().display().to_string()]);
        a.output = OutputFormat::Yaml;
        let out = run(&a, &mut SourceContext::new()).unwrap();
        assert!(out.starts_with("---\n"), "{out}");
        assert!(out.contains("port: 8080"), "{out}");
    }

    #[test]
    fn required_schema_without_schema_fails() {
        let dir = library();
        let mut a = args(vec![dir.path().join("values").display().to_string()]);
        a.require_schema = true;
        let err = run(&a, &mut SourceContext::new()).unwrap_err();
        assert!(err.downcast_ref::<ValuesError>().is_some());
    }

    #[test]
    fn file_paths_do_not_depend_on_spelling() {
        let dir = library();
        let values_dir = dir.path().join("values");
        let direct = values_dir.join("10-base.yml");

        let by_file = collect_files(&[direct.display().to_string()], &mut SourceContext::new()).unwrap();
        let by_dir = collect_files(&[values_dir.display().to_string()], &mut SourceContext::new()).unwrap();
        assert_eq!(by_file[0].relative_path, "10-base.yml");
        assert_eq!(by_dir[0].relative_path, "10-base.yml");

        let nested = collect_files(&[dir.path().display().to_string()], &mut SourceContext::new()).unwrap();
        let paths: Vec<_> = nested.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["schema.yml", "values/10-base.yml"]);
    }

    #[test]
    fn directory_walk_skips_other_files() {
        let dir = library();
        fs::write(dir.path().join("README.md"), "# values\n").unwrap();
        fs::write(dir.path().join("values/20-more.yaml"), "#@data/values\n---\nport: 1\n").unwrap();
        let files = collect_files(&[dir.path().display().to_string()], &mut SourceContext::new()).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["schema.yml", "values/10-base.yml", "values/20-more.yaml"]);
    }
}
