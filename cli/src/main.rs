use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use concise_schema_core::{Json, ParseError, Reader, Schema};
use tracing::level_filters::LevelFilter;

/// Exit codes: 0 match, 1 mismatch, 2 parse or I/O failure.
const EXIT_MISMATCH: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "concise-schema")]
#[command(about = "Validate JSON documents against concise schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a JSON document against a schema
    ///
    /// Without file arguments both inputs come from stdin, schema
    /// first. Prints `match` on success; on mismatch prints the error
    /// tree and the annotated document.
    Check {
        /// Concise schema file (stdin if not specified)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// JSON document file (stdin if not specified)
        #[arg(short, long)]
        json: Option<PathBuf>,

        /// Indent width for the annotated report
        #[arg(long, default_value_t = 2)]
        tab_size: usize,
    },

    /// Convert a concise schema to a standard JSON-Schema document
    Export {
        /// Concise schema file (stdin if not specified)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Emit the document on a single line
        #[arg(long, default_value_t = false)]
        compact: bool,
    },

    /// Reformat a concise schema
    Fmt {
        /// Concise schema file (stdin if not specified)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Emit the one-line compact form instead of the pretty form
        #[arg(long, default_value_t = false)]
        compact: bool,

        /// Indent width for the pretty form
        #[arg(long, default_value_t = 2)]
        tab_size: usize,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for results.
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            schema,
            json,
            tab_size,
        } => check(schema.as_deref(), json.as_deref(), tab_size),
        Commands::Export { schema, compact } => {
            let source = read_source(schema.as_deref())?;
            let schema = match source.parse::<Schema>() {
                Ok(schema) => schema,
                Err(e) => return parse_failure(e),
            };
            let exported = schema.as_json_schema();
            if compact {
                println!("{exported}");
            } else {
                let text = serde_json::to_string_pretty(&exported)
                    .context("failed to serialize JSON Schema")?;
                println!("{text}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fmt {
            schema,
            compact,
            tab_size,
        } => {
            let source = read_source(schema.as_deref())?;
            let schema = match source.parse::<Schema>() {
                Ok(schema) => schema,
                Err(e) => return parse_failure(e),
            };
            if compact {
                println!("{schema}");
            } else {
                println!("{}", schema.pretty(tab_size));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check(
    schema_path: Option<&Path>,
    json_path: Option<&Path>,
    tab_size: usize,
) -> Result<ExitCode> {
    let parsed: Result<(Schema, Json), ParseError> = match (schema_path, json_path) {
        (None, None) => {
            // One stream carries both: schema first, document second.
            let input = read_stdin()?;
            let mut reader = Reader::new(&input);
            Schema::parse(&mut reader).and_then(|s| Ok((s, Json::parse(&mut reader)?)))
        }
        (schema_path, json_path) => {
            let schema_source = match schema_path {
                Some(path) => read_file(path)?,
                None => read_stdin()?,
            };
            let json_source = match json_path {
                Some(path) => read_file(path)?,
                None => read_stdin()?,
            };
            schema_source
                .parse::<Schema>()
                .and_then(|s| Ok((s, json_source.parse::<Json>()?)))
        }
    };
    let (schema, json) = match parsed {
        Ok(pair) => pair,
        Err(e) => return parse_failure(e),
    };

    match schema.matches(&json) {
        Ok(()) => {
            println!("match");
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            println!("{error}");
            println!("{}", error.pretty_wordy_print(tab_size));
            Ok(ExitCode::from(EXIT_MISMATCH))
        }
    }
}

/// Parse errors are results, not failures of the tool itself; they go
/// to stdout as a one-liner.
fn parse_failure(error: ParseError) -> Result<ExitCode> {
    match error.position() {
        Some(pos) => println!("parse error: {error} (at byte {pos})"),
        None => println!("parse error: {error}"),
    }
    Ok(ExitCode::from(EXIT_ERROR))
}

fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => read_file(path),
        None => read_stdin(),
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    Ok(input)
}
