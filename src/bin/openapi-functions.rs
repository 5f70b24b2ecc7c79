//! OpenAPI Functions CLI
//!
//! Command-line interface for converting OpenAPI specifications into function
//! descriptors and dereferencing them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use openapi_functions::{
    is_url, load_spec_auto, validate_spec, DereferenceOptions, OpenApiConverter, PathDereferencer,
};

#[derive(Parser)]
#[command(name = "openapi-functions")]
#[command(about = "Convert OpenAPI specifications into function-calling descriptors")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a specification into function descriptors (JSON)
    Convert {
        /// Specification source: file path or URL (http:// or https://)
        spec: String,

        /// Output file (stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Inline every $ref under paths and components
    Dereference {
        /// Specification source: file path or URL (http:// or https://)
        spec: String,

        /// Output file (stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,

        /// Directory for relative external references (default: the directory of SPEC)
        #[arg(long)]
        base_path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            spec,
            output,
            pretty,
        } => run_convert(&spec, output, pretty),

        Commands::Dereference {
            spec,
            output,
            format,
            base_path,
        } => run_dereference(&spec, output, format, base_path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_convert(spec_source: &str, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let spec = load_spec_auto(spec_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let converter = OpenApiConverter::new(spec).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let functions = converter.convert().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let rendered = if pretty {
        serde_json::to_string_pretty(&functions)
    } else {
        serde_json::to_string(&functions)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    write_output(output.as_deref(), &rendered)?;
    if let Some(path) = output {
        log::info!("converted {} to {}", spec_source, path.display());
    }
    Ok(())
}

fn run_dereference(
    spec_source: &str,
    output: Option<PathBuf>,
    format: OutputFormat,
    base_path: Option<PathBuf>,
) -> Result<(), u8> {
    let spec = load_spec_auto(spec_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    validate_spec(&spec).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let mut options = DereferenceOptions::new();
    if let Some(base) = base_path.or_else(|| spec_directory(spec_source)) {
        options = options.base_path(base);
    }

    let dereferenced = PathDereferencer::with_options(&spec, &options)
        .dereference()
        .map_err(|e| {
            eprintln!("Error dereferencing spec: {}", e);
            e.exit_code() as u8
        })?;

    let rendered = match format {
        OutputFormat::Yaml => serde_yaml_ng::to_string(&dereferenced).map_err(|e| e.to_string()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&dereferenced).map_err(|e| e.to_string())
        }
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    write_output(output.as_deref(), &rendered)?;
    if let Some(path) = output {
        log::info!("dereferenced {} to {}", spec_source, path.display());
    }
    Ok(())
}

/// Directory containing a local spec file; `None` for URLs.
fn spec_directory(spec_source: &str) -> Option<PathBuf> {
    if is_url(spec_source) {
        return None;
    }
    let parent = Path::new(spec_source).parent()?;
    if parent.as_os_str().is_empty() {
        Some(PathBuf::from("."))
    } else {
        Some(parent.to_path_buf())
    }
}

fn write_output(output: Option<&Path>, rendered: &str) -> Result<(), u8> {
    match output {
        Some(path) => std::fs::write(path, rendered).map_err(|e| {
            eprintln!("Error writing to {}: {}", path.display(), e);
            3u8
        }),
        None => {
            println!("{}", rendered);
            Ok(())
        }
    }
}
