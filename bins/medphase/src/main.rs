//! medphase: arterial/venous phase filters over HTTP or from the command line.

use anyhow::Context;
use clap::{Parser, Subcommand};
use medphase_core::config::Config;
use medphase_core::error::{exit_codes, ErrorReport};
use medphase_core::{Error, ErrorCode};
use medphase_image::{extract_metadata, processed_filename, ImageError, Phase};
use medphase_telemetry::TelemetryConfig;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "medphase")]
#[command(about = "Arterial/venous phase filters for medical images")]
#[command(version)]
struct Cli {
    /// Print failures as a JSON error report on stderr
    #[arg(long, global = true)]
    json_errors: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Path to a TOML configuration file
        #[arg(long, short)]
        config: Option<String>,
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the bind port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Filter one image file without starting the server
    Process {
        /// Input image (JPEG, PNG, GIF or WebP)
        input: PathBuf,
        /// Phase to apply
        #[arg(long, short)]
        phase: Phase,
        /// Where to write the PNG result; defaults to `processed_<name>` beside the input
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show format, dimensions and size of an image
    Inspect {
        /// Path to image file
        input: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match run(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            let report = error_report(&err);
            if json_errors {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => eprintln!("{}", json),
                    Err(_) => eprintln!("Error: {:#}", err),
                }
            } else {
                eprintln!("Error: {:#}", err);
            }
            ExitCode::from(exit_code_for(report.code) as u8)
        }
    }
}

/// Summarise a failed command from the first classified error in its chain.
fn error_report(err: &anyhow::Error) -> ErrorReport {
    let mut code = ErrorCode::Internal;
    let mut message = err.to_string();
    let mut suggestion = None;

    for cause in err.chain() {
        if let Some(core) = cause.downcast_ref::<Error>() {
            code = core.code;
            message = core.message.clone();
            suggestion = core.suggestion.clone();
            break;
        }
        if let Some(image) = cause.downcast_ref::<ImageError>() {
            code = image.code();
            message = image.to_string();
            break;
        }
    }

    let mut error = Error::new(code, message).with_context(format!("{:#}", err));
    if let Some(suggestion) = suggestion {
        error = error.with_suggestion(suggestion);
    }
    error.to_report()
}

/// Exit status for a failed command, by error category.
fn exit_code_for(code: ErrorCode) -> i32 {
    match code.category() {
        "Configuration" => exit_codes::CONFIG_ERROR,
        "Validation" => exit_codes::VALIDATION_ERROR,
        "Image" => exit_codes::IMAGE_ERROR,
        _ => exit_codes::FAILURE,
    }
}

/// Apply `--host`/`--port` on top of the loaded configuration and validate
/// the result again.
fn with_overrides(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> medphase_core::Result<Config> {
    if let Some(host) = host {
        config.schema.server.host = host;
    }
    if let Some(port) = port {
        config.schema.server.port = port;
    }
    config.schema.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { config, host, port } => {
            let config = with_overrides(Config::load(config.as_deref())?, host, port)?;

            medphase_telemetry::init_with_config(TelemetryConfig::from(&config.schema.logging))?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime.block_on(medphase_server::serve(config))?;
        }

        Commands::Process {
            input,
            phase,
            output,
        } => {
            medphase_telemetry::init()?;

            let data = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let result = medphase_image::process(&data, phase)
                .with_context(|| format!("Failed to process {}", input.display()))?;

            let output = output.unwrap_or_else(|| default_output_path(&input));
            std::fs::write(&output, &result.png)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            println!(
                "{} phase: {}x{} {:?} -> {} ({} bytes)",
                phase,
                result.width,
                result.height,
                result.source_format,
                output.display(),
                result.png.len()
            );
        }

        Commands::Inspect { input, json } => {
            let data = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let meta = extract_metadata(&data)
                .with_context(|| format!("Could not read image header of {}", input.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&meta)?);
            } else {
                println!("Format: {:?}", meta.format);
                println!("MIME: {}", meta.format.mime_type());
                println!("Extensions: {}", meta.format.extensions().join(", "));
                println!("Dimensions: {}x{}", meta.width, meta.height);
                println!("Pixels: {}", meta.pixel_count());
                println!("Size: {} bytes", meta.size_bytes);
            }
        }
    }

    Ok(())
}

/// `processed_<name>` in the input's directory.
fn default_output_path(input: &Path) -> PathBuf {
    let name = input.file_name().and_then(|n| n.to_str());
    let file = processed_filename(name);
    match input.parent() {
        Some(dir) => dir.join(file),
        None => PathBuf::from(file),
    }
}
