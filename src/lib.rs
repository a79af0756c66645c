//! Birka: consistent batches of microscopy images.
//!
//! Birka collects image metadata records, works out the batch consensus
//! (the majority value of every tracked field), flags the records that
//! disagree with it, and packs eligible batches into a compressed archive
//! with a CSV manifest.
//!
//! # Modules
//!
//! - [`record`]: The image record value type and record-list JSON IO
//! - [`consensus`]: Majority-vote consensus over a batch
//! - [`collection`]: Observable record collection that tracks its consensus
//! - [`validation`]: Field rules, identity filter, eligibility and reports
//! - [`extract`]: Building records from image files
//! - [`archive`]: Archive writer, manifest and background export task
//! - [`workspace`]: Batch state for front ends
//! - [`logging`]: Logger initialization
//! - [`error`]: Error types for birka operations

pub mod archive;
pub mod collection;
pub mod consensus;
pub mod error;
pub mod extract;
pub mod logging;
pub mod record;
pub mod validation;
pub mod workspace;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::info;

pub use error::BirkaError;

use archive::{ArchiveOptions, ExportEvent, DEFAULT_COMPRESSION_LEVEL};
use consensus::Consensus;
use validation::{Field, IdentityFilter, ValidateOptions};
use workspace::Workspace;

/// The birka CLI application.
#[derive(Parser)]
#[command(name = "birka")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show every record with its flagged fields and the batch consensus.
    Inspect(InspectArgs),
    /// Validate a batch for errors and warnings.
    Validate(ValidateArgs),
    /// Write an eligible batch to a .tar.gz archive with a CSV manifest.
    Archive(ArchiveArgs),
}

/// How input paths are read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// Image files or directories of images.
    Image,
    /// JSON files holding an array of records.
    Json,
}

/// How results are printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Input arguments shared by every subcommand.
#[derive(clap::Args)]
struct InputArgs {
    /// Image files, directories or record JSON files.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// How to read the input paths.
    #[arg(long, value_enum, default_value_t = InputFormat::Image)]
    format: InputFormat,

    /// Regular expression every record path must match in full.
    #[arg(long, env = "BIRKA_PATH_FILTER")]
    filter: Option<String>,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output format ('text' or 'json').
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Arguments for the archive subcommand.
#[derive(clap::Args)]
struct ArchiveArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Archive file to create.
    #[arg(long)]
    out: PathBuf,

    /// Re-encode every image as TIFF.
    #[arg(long)]
    convert_tiff: bool,

    /// Gzip compression level (1-9).
    #[arg(long, default_value_t = DEFAULT_COMPRESSION_LEVEL)]
    compression_level: u32,
}

/// Run the birka CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), BirkaError> {
    let cli = Cli::parse();
    logging::initialize(cli.verbose);

    match cli.command {
        Some(Commands::Inspect(args)) => run_inspect(args),
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Archive(args)) => run_archive(args),
        None => {
            println!("birka {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Curate consistent batches of microscopy images.");
            println!();
            println!("Run 'birka --help' for usage information.");
            Ok(())
        }
    }
}

/// Builds a workspace from the input arguments.
fn load_workspace(input: &InputArgs) -> Result<Workspace, BirkaError> {
    let mut workspace = Workspace::new();

    match input.format {
        InputFormat::Image => {
            let failures = workspace.add_paths(&input.paths)?;
            if !failures.is_empty() {
                info!("{} file(s) could not be loaded", failures.len());
            }
        }
        InputFormat::Json => {
            for path in &input.paths {
                let records = record::read_records_json(path)?;
                workspace.add_records(records)?;
            }
        }
    }

    if let Some(pattern) = input.filter.as_deref() {
        // On the command line a bad pattern is an error, not a disabled filter.
        IdentityFilter::new(pattern)?;
        workspace.set_filter_pattern(Some(pattern));
    }

    Ok(workspace)
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs) -> Result<(), BirkaError> {
    let workspace = load_workspace(&args.input)?;

    match args.output {
        OutputFormat::Json => {
            let mut rows = Vec::with_capacity(workspace.records().len());
            for (index, record) in workspace.records().iter().enumerate() {
                let validity = workspace.row_validity(index)?;
                rows.push(serde_json::json!({
                    "record": record,
                    "invalid_fields": validity.invalid_fields(),
                }));
            }
            let output = serde_json::json!({
                "rows": rows,
                "consensus": workspace.collection().consensus(),
                "export_eligible": workspace.is_export_eligible(),
            });
            println!("{}", to_pretty_json(&output)?);
        }
        OutputFormat::Text => {
            print_table(&workspace)?;
            println!();
            print_consensus(workspace.collection().consensus());
            println!();
            println!(
                "Export eligible: {}",
                if workspace.is_export_eligible() { "yes" } else { "no" }
            );
        }
    }

    Ok(())
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), BirkaError> {
    let workspace = load_workspace(&args.input)?;

    let opts = ValidateOptions {
        strict: args.strict,
    };
    let report = workspace.validate();

    match args.output {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "error_count": report.error_count(),
                "warning_count": report.warning_count(),
                "issues": &report.issues,
            });
            println!("{}", to_pretty_json(&output)?);
        }
        OutputFormat::Text => {
            print!("{}", report);
        }
    }

    if report.passes(opts.strict) {
        Ok(())
    } else {
        Err(BirkaError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    }
}

/// Execute the archive subcommand.
fn run_archive(args: ArchiveArgs) -> Result<(), BirkaError> {
    let mut workspace = load_workspace(&args.input)?;

    let options = ArchiveOptions {
        convert_to_tiff: args.convert_tiff,
        compression_level: args.compression_level,
        ..ArchiveOptions::default()
    };
    workspace.start_export(&args.out, options)?;

    while let Some(event) = workspace.next_export_event() {
        match event {
            ExportEvent::Progress { done, total, path } => {
                info!("[{done}/{total}] {path}");
            }
            ExportEvent::Completed {
                archived,
                destination,
            } => {
                println!(
                    "Archived {} image(s) to {}",
                    archived,
                    destination.display()
                );
                return Ok(());
            }
            ExportEvent::Failed { message } => {
                return Err(BirkaError::ExportFailed(message));
            }
            ExportEvent::Cancelled { archived } => {
                return Err(BirkaError::ExportFailed(format!(
                    "cancelled after {archived} image(s)"
                )));
            }
        }
    }

    Err(BirkaError::ExportFailed(
        "export ended without a result".to_string(),
    ))
}

fn to_pretty_json(value: &serde_json::Value) -> Result<String, BirkaError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| BirkaError::Io(std::io::Error::other(e)))
}

/// Prints the record table. Flagged cells are marked with `*`.
fn print_table(workspace: &Workspace) -> Result<(), BirkaError> {
    let headers: Vec<String> = Field::all().map(|f| f.header().to_string()).collect();
    let mut rows = Vec::with_capacity(workspace.records().len());

    for (index, record) in workspace.records().iter().enumerate() {
        let validity = workspace.row_validity(index)?;
        let row: Vec<String> = Field::all()
            .map(|field| {
                let mut cell = field.display(record);
                if !validity.is_valid(field) {
                    cell.push('*');
                }
                cell
            })
            .collect();
        rows.push(row);
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", format_row(&headers));
    for row in &rows {
        println!("{}", format_row(row));
    }

    Ok(())
}

fn print_consensus(consensus: &Consensus) {
    let yes_no = |value: bool| if value { "yes" } else { "no" };
    let pixel_size = |value: &Option<String>| value.clone().unwrap_or_else(|| "unknown".to_string());

    println!("Consensus:");
    println!("  Data type:       {}", consensus.dtype);
    println!("  Timeseries:      {}", yes_no(consensus.is_timeseries));
    println!("  Channels:        {}", consensus.n_channels);
    println!("  Z-stack:         {}", yes_no(consensus.is_zstack));
    println!("  Dimension order: {}", consensus.dimension_order);
    println!("  Pixel size (X):  {}", pixel_size(&consensus.pixel_size_x));
    println!("  Pixel size (Y):  {}", pixel_size(&consensus.pixel_size_y));
    println!("  Pixel size (Z):  {}", pixel_size(&consensus.pixel_size_z));
    println!("  Channel names:   {}", consensus.channel_names.join(", "));
}
