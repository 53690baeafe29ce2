//! Yoko CLI
//!
//! Command-line interface for rendering and checking declaration manifests.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use yoko::{load_manifest_auto, validate_arguments, yoko, Declarations, ManifestError};

#[derive(Parser)]
#[command(name = "yoko")]
#[command(about = "Derive GraphQL SDL from declaration manifests")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SDL generated from a manifest
    Sdl {
        /// Manifest source: file path or URL (http:// or https://)
        manifest: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check that a manifest converts, and summarize it
    Check {
        /// Manifest source: file path or URL (http:// or https://)
        manifest: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Validate an argument payload against a declared operation or computed field
    Validate {
        /// Manifest source: file path or URL (http:// or https://)
        manifest: String,

        /// Payload file holding the arguments object
        payload: PathBuf,

        /// Operation name (e.g. getUser) or computed field (e.g. User.hobbies)
        #[arg(long, short)]
        operation: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    yoko::logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Sdl { manifest, output } => run_sdl(&manifest, output),
        Commands::Check { manifest, json } => run_check(&manifest, json),
        Commands::Validate {
            manifest,
            payload,
            operation,
            json,
        } => run_validate(&manifest, payload, &operation, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn load(source: &str, json_output: bool) -> Result<Declarations, u8> {
    load_manifest_auto(source).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })
}

fn run_sdl(source: &str, output: Option<PathBuf>) -> Result<(), u8> {
    let declarations = load(source, false)?;
    let built = yoko(declarations).map_err(|e| {
        let e = ManifestError::from(e);
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", built.schema)).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", built.schema);
        }
    }

    Ok(())
}

fn run_check(source: &str, json_output: bool) -> Result<(), u8> {
    let declarations = load(source, json_output)?;
    let types = declarations.types.len();
    let queries = declarations.queries.len();
    let mutations = declarations.mutations.len();

    match yoko(declarations) {
        Ok(_) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": true,
                    "types": types,
                    "queries": queries,
                    "mutations": mutations,
                });
                println!("{}", output);
            } else {
                println!(
                    "OK: {} type(s), {} quer{}, {} mutation(s)",
                    types,
                    queries,
                    if queries == 1 { "y" } else { "ies" },
                    mutations
                );
            }
            Ok(())
        }
        Err(e) => {
            let e = ManifestError::from(e);
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

fn run_validate(
    source: &str,
    payload_path: PathBuf,
    operation: &str,
    json_output: bool,
) -> Result<(), u8> {
    let declarations = load(source, json_output)?;

    let payload = read_payload(&payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    match validate_arguments(&declarations, operation, &payload) {
        Ok(_) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ManifestError::InvalidArguments { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

fn read_payload(path: &std::path::Path) -> Result<Value, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ManifestError::InvalidJson { source })
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
