//! Labelvox: annotation raster/vector codec.
//!
//! Labelvox converts segmentation annotations between three forms: dense
//! run-length encoded label masks, vector polygon paths, and stacked
//! multi-frame label volumes for 3D viewers.
//!
//! # Modules
//!
//! - [`mask`]: RLE codec, polygon rasterizer, contour tracer, mask set algebra
//! - [`darwin`]: Darwin JSON and polygon JSON records
//! - [`volume`]: frame identity reconciliation, volume assembly, legend, NIfTI
//! - [`conversion`]: the item → volume pipeline and its report
//! - [`validation`]: item validation and error reporting
//! - [`config`]: conversion settings
//! - [`error`]: Error types for labelvox operations

pub mod config;
pub mod conversion;
pub mod darwin;
pub mod error;
pub mod mask;
pub mod validation;
pub mod volume;

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

pub use error::LabelvoxError;

use crate::config::ConvertConfig;
use crate::darwin::io_polygon_json;
use crate::mask::{contour, io_png, rasterize, setops, LabelMask};

/// The labelvox CLI application.
#[derive(Parser)]
#[command(name = "labelvox")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert Darwin JSON exports into NIfTI label volumes with ITK-SNAP legends.
    Convert(ConvertArgs),
    /// Validate a Darwin JSON export for errors and warnings.
    Validate(ValidateArgs),
    /// Trace the outlines of a mask image into polygon paths.
    Trace(TraceArgs),
    /// Fill polygon paths into a binary mask image.
    Rasterize(RasterizeArgs),
    /// Compute intersection over union of two masks or polygons.
    Iou(IouArgs),
    /// Render one frame of Darwin JSON exports as per-class colour PNGs.
    Mask(MaskArgs),
    /// Clip polygon paths to the bounds of an image.
    Clip(ClipArgs),
}

/// Report/output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// A Darwin JSON file, or a directory of them.
    input: PathBuf,

    /// Directory for the .nii and .nii.label outputs.
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// YAML settings file.
    #[arg(long, env = "LABELVOX_CONFIG")]
    config: Option<PathBuf>,

    /// Output file name prefix (overrides the settings file).
    #[arg(long)]
    prefix: Option<String>,

    /// Keep the exported orientation even when an original affine is present.
    #[arg(long)]
    no_reorient: bool,

    /// Output format for the conversion reports.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    report: OutputFormat,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Input file to validate.
    input: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Arguments for the trace subcommand.
#[derive(clap::Args)]
struct TraceArgs {
    /// Mask image; any non-zero pixel is foreground.
    input: PathBuf,

    /// Write the paths JSON here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Arguments for the rasterize subcommand.
#[derive(clap::Args)]
struct RasterizeArgs {
    /// Polygon JSON file.
    input: PathBuf,

    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,

    /// Output PNG.
    #[arg(short, long)]
    output: PathBuf,
}

/// Arguments for the iou subcommand.
#[derive(clap::Args)]
struct IouArgs {
    /// First mask image or polygon JSON.
    a: PathBuf,

    /// Second mask image or polygon JSON.
    b: PathBuf,

    /// Canvas width for polygon inputs (defaults to the image input's).
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height for polygon inputs (defaults to the image input's).
    #[arg(long)]
    height: Option<u32>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Arguments for the mask subcommand.
#[derive(clap::Args)]
struct MaskArgs {
    /// A Darwin JSON file, or a directory of them.
    input: PathBuf,

    /// Directory for the `<stem>_mask.png` outputs.
    #[arg(short, long, default_value = "masks")]
    output: PathBuf,

    /// Frame to render.
    #[arg(long, default_value_t = 0)]
    frame: usize,
}

/// Arguments for the clip subcommand.
#[derive(clap::Args)]
struct ClipArgs {
    /// Polygon JSON file.
    input: PathBuf,

    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,

    /// Output path (defaults to `<stem>_trimmed.json` next to the input).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Run the labelvox CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelvoxError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Trace(args)) => run_trace(args),
        Some(Commands::Rasterize(args)) => run_rasterize(args),
        Some(Commands::Iou(args)) => run_iou(args),
        Some(Commands::Mask(args)) => run_mask(args),
        Some(Commands::Clip(args)) => run_clip(args),
        None => {
            println!("labelvox {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Annotation raster/vector codec.");
            println!();
            println!("Run 'labelvox --help' for usage information.");
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays clean for JSON output. `RUST_LOG`
/// takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when run() is called twice in
    // one process; keeping the first one is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), LabelvoxError> {
    let mut config = match &args.config {
        Some(path) => ConvertConfig::load(path)?,
        None => ConvertConfig::default(),
    };
    if let Some(prefix) = args.prefix {
        config.output_prefix = prefix;
    }
    if args.no_reorient {
        config.reorient = false;
    }

    let inputs = conversion::collect_inputs(&args.input)?;
    if inputs.is_empty() {
        return Err(LabelvoxError::UnsupportedFormat(format!(
            "no .json files found in {}",
            args.input.display()
        )));
    }

    let summary = conversion::convert_batch(&inputs, &args.output, &config);

    match args.report {
        OutputFormat::Json => {
            let reports: Vec<_> = summary.converted.iter().map(|c| &c.report).collect();
            let json = serde_json::to_string_pretty(&reports)
                .map_err(|e| LabelvoxError::Io(e.into()))?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for item in &summary.converted {
                println!("Converted {} -> {}", item.input.display(), item.nifti.display());
                print!("{}", item.report);
            }
        }
    }
    for (input, err) in &summary.failed {
        eprintln!("Failed {}: {}", input.display(), err);
    }

    if summary.failed.is_empty() {
        Ok(())
    } else {
        Err(LabelvoxError::BatchFailed {
            failed: summary.failed.len(),
            total: summary.total(),
        })
    }
}

#[derive(Serialize)]
struct ValidationJson<'a> {
    error_count: usize,
    warning_count: usize,
    issues: &'a [validation::ValidationIssue],
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), LabelvoxError> {
    let item = darwin::io_darwin_json::read_darwin_json(&args.input)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_item(&item, &opts);

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&ValidationJson {
                error_count: report.error_count(),
                warning_count: report.warning_count(),
                issues: &report.issues,
            })
            .map_err(|e| LabelvoxError::Io(e.into()))?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{}", report),
    }

    if report.passes(args.strict) {
        Ok(())
    } else {
        Err(LabelvoxError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    }
}

/// Execute the trace subcommand.
fn run_trace(args: TraceArgs) -> Result<(), LabelvoxError> {
    let mask = io_png::read_mask_image(&args.input)?;
    let contours = contour::trace(&mask);
    tracing::info!(
        external = contours.external.len(),
        internal = contours.internal.len(),
        "traced contours"
    );
    let paths = contours.into_paths();

    match &args.output {
        Some(path) => io_polygon_json::write_polygon_json(path, &paths),
        None => {
            let json = io_polygon_json::to_polygon_json_string(&paths)
                .map_err(LabelvoxError::PolygonJsonWrite)?;
            println!("{json}");
            Ok(())
        }
    }
}

/// Execute the rasterize subcommand.
fn run_rasterize(args: RasterizeArgs) -> Result<(), LabelvoxError> {
    let paths = io_polygon_json::read_polygon_json(&args.input)?;
    let mask = rasterize::rasterize_paths(&paths, args.width, args.height)?;
    tracing::info!(pixels = mask.foreground_count(), "rasterized polygon");
    io_png::write_mask_image(&args.output, &mask)
}

#[derive(Serialize)]
struct IouJson {
    intersection: usize,
    union: usize,
    iou: setops::Iou,
}

/// Execute the iou subcommand.
fn run_iou(args: IouArgs) -> Result<(), LabelvoxError> {
    let a_image = load_image_input(&args.a)?;
    let b_image = load_image_input(&args.b)?;

    let canvas = match (args.width, args.height) {
        (Some(w), Some(h)) => Some((w, h)),
        _ => a_image
            .as_ref()
            .or(b_image.as_ref())
            .map(|m| (m.width(), m.height())),
    };

    let a = resolve_input(&args.a, a_image, canvas)?;
    let b = resolve_input(&args.b, b_image, canvas)?;

    let result = IouJson {
        intersection: setops::intersection_count(&a, &b)?,
        union: setops::union_count(&a, &b)?,
        iou: setops::iou(&a, &b)?,
    };

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| LabelvoxError::Io(e.into()))?;
            println!("{json}");
        }
        OutputFormat::Text => {
            println!("intersection: {}", result.intersection);
            println!("union: {}", result.union);
            println!("iou: {}", result.iou);
        }
    }
    Ok(())
}

/// Execute the mask subcommand.
fn run_mask(args: MaskArgs) -> Result<(), LabelvoxError> {
    let inputs = conversion::collect_inputs(&args.input)?;
    if inputs.is_empty() {
        return Err(LabelvoxError::UnsupportedFormat(format!(
            "no .json files found in {}",
            args.input.display()
        )));
    }

    let mut failed = 0usize;
    for input in &inputs {
        match conversion::semantic::write_semantic_mask(input, &args.output, args.frame) {
            Ok(output) => println!("Wrote {} -> {}", input.display(), output.display()),
            Err(err) => {
                eprintln!("Failed {}: {}", input.display(), err);
                failed += 1;
            }
        }
    }

    if failed == 0 {
        Ok(())
    } else {
        Err(LabelvoxError::BatchFailed {
            failed,
            total: inputs.len(),
        })
    }
}

/// Execute the clip subcommand.
fn run_clip(args: ClipArgs) -> Result<(), LabelvoxError> {
    let paths = io_polygon_json::read_polygon_json(&args.input)?;
    let clipped = mask::clip_to_image(&paths, args.width, args.height);
    tracing::info!(
        kept = clipped.len(),
        dropped = paths.len() - clipped.len(),
        "clipped paths"
    );

    let output = args.output.unwrap_or_else(|| {
        let stem = args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        args.input.with_file_name(format!("{stem}_trimmed.json"))
    });
    io_polygon_json::write_polygon_json(&output, &clipped)?;
    println!("Clipped {} path(s) -> {}", clipped.len(), output.display());
    Ok(())
}

fn is_polygon_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Reads image inputs up front so their size can define the canvas.
fn load_image_input(path: &Path) -> Result<Option<LabelMask>, LabelvoxError> {
    if is_polygon_json(path) {
        Ok(None)
    } else {
        io_png::read_mask_image(path).map(Some)
    }
}

fn resolve_input(
    path: &Path,
    image: Option<LabelMask>,
    canvas: Option<(u32, u32)>,
) -> Result<LabelMask, LabelvoxError> {
    if let Some(mask) = image {
        return Ok(mask);
    }
    let (width, height) = canvas.ok_or_else(|| {
        LabelvoxError::UnsupportedFormat(
            "--width and --height are required when both inputs are polygons".to_string(),
        )
    })?;
    let paths = io_polygon_json::read_polygon_json(path)?;
    rasterize::rasterize_paths(&paths, width, height)
}
