//! Command-line interface for `GeoClip`, a batch clip, cleanup and export tool
//! for multi-dataset spatial databases.
//!
//! # Architecture
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for structured logging.
//! It parses arguments, configures logging, and delegates to the [`geoclip_core`] pipeline.
//! Workspaces are read from and written back to a JSON snapshot of the in-memory engine.
//!
//! # Available Commands
//!
//! - `run` - Clip every dataset by a boundary, clean up and optionally export
//! - `delete-fields` - Remove fields from every feature class of a workspace
//! - `validate-export` - Check an export format / folder / extension combination
//! - `info` - List the feature classes of a workspace
//! - `formats` - List the supported export formats

mod display;

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tabled::Table;
use tracing::{Level, debug, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use geoclip_core::cleanup::delete_fields_in_workspace;
use geoclip_core::config::{DEFAULT_AUDIT_FIELDS, PipelineConfig};
use geoclip_core::error::GeoClipError;
use geoclip_core::export::ExportRequest;
use geoclip_core::formats::get_formats;
use geoclip_core::memory::MemoryEngine;
use geoclip_core::pipeline::{self, ExportParameters, RunParameters};
use geoclip_core::types::{BoundaryPolygon, Workspace};

use crate::display::{FormatRow, display_collections, display_summary, stripped_rows};

#[derive(Parser)]
#[command(
    name = "geoclip",
    version,
    about = "Clip, clean up and export spatial databases",
    long_about = "GeoClip clips every feature class of the selected datasets by a boundary polygon,\n\
                  removes empty results and restricted fields, and exports the rest to CAD or\n\
                  MapInfo/Shapefile formats."
)]
/// Command-line arguments and options for the `GeoClip` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Export options of the `run` subcommand.
#[derive(Args, Debug, Default)]
struct ExportArgs {
    /// Export the surviving feature classes after cleanup.
    #[arg(long)]
    export: bool,

    /// Export format (e.g. "MITAB", "DWG_R2010"). See `geoclip formats`.
    #[arg(long, value_name = "FORMAT", default_value = "")]
    format: String,

    /// Output folder, required for MITAB, MIF and SHAPE.
    #[arg(long, value_name = "DIR", default_value = "")]
    output_folder: String,

    /// File extension, required for CAD formats ("dwg" or "dxf").
    #[arg(long, value_name = "EXT", default_value = "")]
    extension: String,
}

/// Available subcommands for the `GeoClip` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Clips datasets by a boundary polygon, removes empty results and
    /// restricted fields, and optionally exports the output.
    Run {
        /// Engine snapshot holding the workspaces.
        #[arg(long, value_name = "FILE")]
        snapshot: PathBuf,

        /// Where to write the updated snapshot (defaults to --snapshot).
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,

        /// Input geodatabase.
        #[arg(long, value_name = "WORKSPACE")]
        source: String,

        /// Output geodatabase.
        #[arg(long, value_name = "WORKSPACE")]
        output: String,

        /// "All" or a comma-separated list of datasets.
        #[arg(long, value_name = "DATASETS", default_value = "All")]
        datasets: String,

        /// Polygon feature class used as the clip mask.
        #[arg(long, value_name = "FEATURE_CLASS")]
        boundary: String,

        /// Pipeline configuration file (TOML).
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// XY tolerance for the clip, overriding the configuration.
        #[arg(long, value_name = "DISTANCE")]
        xy_tolerance: Option<f64>,

        /// Fields to delete from the output, overriding the configuration.
        #[arg(long, value_name = "FIELDS", value_delimiter = ',')]
        fields_to_delete: Option<Vec<String>>,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Deletes fields from every feature class of a workspace and lists the
    /// fields that remain.
    DeleteFields {
        /// Engine snapshot holding the workspace.
        #[arg(long, value_name = "FILE")]
        snapshot: PathBuf,

        /// Workspace to clean.
        #[arg(long, value_name = "WORKSPACE")]
        workspace: String,

        /// Fields to delete.
        #[arg(long, value_name = "FIELDS", value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },

    /// Checks an export format, output folder and extension combination.
    ValidateExport {
        /// Export format token.
        #[arg(long, value_name = "FORMAT")]
        format: String,

        /// Output folder.
        #[arg(long, value_name = "DIR", default_value = "")]
        output_folder: String,

        /// File extension.
        #[arg(long, value_name = "EXT", default_value = "")]
        extension: String,
    },

    /// Lists the feature classes of a workspace.
    Info {
        /// Engine snapshot holding the workspace.
        #[arg(long, value_name = "FILE")]
        snapshot: PathBuf,

        /// Workspace to describe.
        #[arg(value_name = "WORKSPACE")]
        workspace: String,
    },

    /// Lists the supported export formats.
    Formats,
}

/// Entry point for the `GeoClip` command-line interface.
///
/// # Errors
///
/// Returns an error if command execution fails or if the logging system cannot be initialized.
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity flags
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            snapshot,
            save,
            source,
            output,
            datasets,
            boundary,
            config,
            xy_tolerance,
            fields_to_delete,
            export,
        } => {
            let mut config = load_config(config.as_deref())?;
            if xy_tolerance.is_some() {
                config = config.with_xy_tolerance(xy_tolerance).map_err(report)?;
            }
            if let Some(fields) = fields_to_delete {
                config = config.with_fields_to_delete(fields);
            }
            let params = RunParameters {
                source: Workspace::new(source),
                output: Workspace::new(output),
                datasets: datasets.parse().map_err(report)?,
                boundary: BoundaryPolygon::new(boundary),
                export: export.export.then(|| ExportParameters {
                    format: export.format,
                    output_folder: export.output_folder,
                    extension: export.extension,
                }),
            };
            handle_run(&snapshot, save.as_deref(), &params, &config)?;
        },
        Commands::DeleteFields {
            snapshot,
            workspace,
            fields,
        } => {
            let fields = fields.unwrap_or_else(|| {
                DEFAULT_AUDIT_FIELDS
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            });
            handle_delete_fields(&snapshot, &workspace, &fields)?;
        },
        Commands::ValidateExport {
            format,
            output_folder,
            extension,
        } => {
            handle_validate_export(&format, &output_folder, &extension)?;
        },
        Commands::Info {
            snapshot,
            workspace,
        } => {
            handle_info(&snapshot, &workspace)?;
        },
        Commands::Formats => {
            handle_formats();
        },
    }

    Ok(())
}

/// Converts a core error into a report carrying the user message and,
/// when there is one, the recovery suggestion.
fn report(err: GeoClipError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(suggestion) => anyhow!("{}\n\n{suggestion}", err.user_message()),
        None => anyhow!(err.user_message()),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            PipelineConfig::load(path).map_err(report)
        },
        None => Ok(PipelineConfig::default()),
    }
}

fn handle_run(
    snapshot: &Path,
    save: Option<&Path>,
    params: &RunParameters,
    config: &PipelineConfig,
) -> Result<()> {
    info!("Run command:");
    info!("Source: {}", params.source);
    info!("Output: {}", params.output);
    debug!("Config: {config:?}");

    let mut engine = MemoryEngine::load(snapshot).map_err(report)?;
    engine.ensure_workspace(&params.output);

    let result = pipeline::run(&mut engine, params, config);

    // A failed run leaves the output as it was when the error occurred
    engine.save(save.unwrap_or(snapshot)).map_err(report)?;

    let summary = result.map_err(report)?;
    display_summary(&summary);
    Ok(())
}

fn handle_delete_fields(snapshot: &Path, workspace: &str, fields: &[String]) -> Result<()> {
    info!("Delete fields command:");
    info!("Workspace: {workspace}");
    info!("Fields: {}", fields.join(", "));

    let workspace = Workspace::new(workspace);
    let mut engine = MemoryEngine::load(snapshot).map_err(report)?;
    let stripped = delete_fields_in_workspace(&mut engine, &workspace, fields);
    engine.save(snapshot).map_err(report)?;
    let stripped = stripped.map_err(|e| report(e.into()))?;

    if stripped.is_empty() {
        println!("\nNo fields deleted.");
    } else {
        println!("{}", Table::new(stripped_rows(&stripped)));
    }
    display_collections(&workspace.path, &engine.describe(&workspace));
    Ok(())
}

fn handle_validate_export(format: &str, output_folder: &str, extension: &str) -> Result<()> {
    let request = ExportRequest::new(format, output_folder, extension).map_err(report)?;
    let kind = match &request {
        ExportRequest::Cad { .. } => "CAD",
        ExportRequest::Interchange { .. } => "Interchange",
    };
    println!(
        "Valid {kind} export: <feature class> -> {}",
        request.destination("<feature class>")
    );
    Ok(())
}

fn handle_info(snapshot: &Path, workspace: &str) -> Result<()> {
    info!("Info command:");
    info!("Workspace: {workspace}");

    let engine = MemoryEngine::load(snapshot).map_err(report)?;
    let workspace = Workspace::new(workspace);
    if engine.store(&workspace).is_none() {
        return Err(anyhow!("Workspace '{workspace}' not found in snapshot."));
    }
    display_collections(&workspace.path, &engine.describe(&workspace));
    Ok(())
}

/// Handles the `formats` subcommand by displaying a formatted table of the
/// export format registry.
fn handle_formats() {
    let formats = get_formats();

    println!("\nExport Formats ({} total):\n", formats.len());

    let rows: Vec<FormatRow> = formats.iter().map(FormatRow::from).collect();
    println!("{}", Table::new(rows));
}
