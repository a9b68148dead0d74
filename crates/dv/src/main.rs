//! dv CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::resolve::{OutputFormat, ResolveArgs};

#[derive(Parser)]
#[command(name = "dv")]
#[command(version)]
#[command(about = "Resolve the data values of a library", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge data values files and print the result
    Resolve {
        /// Files or directories of the library (.yml/.yaml)
        #[arg(required = true)]
        paths: Vec<String>,

        /// Fail if values are given without a schema
        #[arg(long, conflicts_with = "no_schema")]
        require_schema: bool,

        /// Ignore `#@data/values-schema` documents
        #[arg(long)]
        no_schema: bool,

        /// Set a data value as a string (KEY=VALUE)
        #[arg(short = 'v', long = "data-value")]
        data_value: Vec<String>,

        /// Set a data value parsed as YAML (KEY=YAML)
        #[arg(long)]
        data_value_yaml: Vec<String>,

        /// Overlay a plain YAML file of data values
        #[arg(long)]
        data_values_file: Vec<String>,

        /// Skip annotations this tool does not know
        #[arg(long)]
        ignore_unknown_comments: bool,

        /// Output format
        #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Yaml)]
        output: OutputFormat,

        /// Print diagnostics as JSON
        #[arg(long)]
        json_errors: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            paths,
            require_schema,
            no_schema,
            data_value,
            data_value_yaml,
            data_values_file,
            ignore_unknown_comments,
            output,
            json_errors,
        } => commands::resolve::execute(ResolveArgs {
            paths,
            require_schema,
            no_schema,
            data_value,
            data_value_yaml,
            data_values_file,
            ignore_unknown_comments,
            output,
            json_errors,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_resolve_flags() {
        let cli = Cli::try_parse_from([
            "dv",
            "resolve",
            "values",
            "-v",
            "a=1",
            "--data-value-yaml",
            "b=[1]",
            "-o",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve {
                paths,
                data_value,
                data_value_yaml,
                output,
                ..
            } => {
                assert_eq!(paths, vec!["values"]);
                assert_eq!(data_value, vec!["a=1"]);
                assert_eq!(data_value_yaml, vec!["b=[1]"]);
                assert_eq!(output, OutputFormat::Json);
            }
        }
    }

    #[test]
    fn schema_flags_conflict() {
        assert!(Cli::try_parse_from(["dv", "resolve", "x", "--require-schema", "--no-schema"]).is_err());
    }
}
