use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use rover_vision::io::{load_rgb, rgb_view, save_png};
use rover_vision::{Perception, PerceptionError, PerceptionParams, RoverPose, StepReport};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("image error for {}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: ::image::ImageError,
    },
    #[error(transparent)]
    Calibration(#[from] rover_vision::CalibrationError),
    #[error(transparent)]
    Perception(#[from] PerceptionError),
    #[error("no frames to process")]
    NoFrames,
}

#[derive(Parser, Debug)]
#[command(name = "rover-vision", version, about = "Rover camera perception")]
struct Cli {
    /// More log output (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Emit JSON log lines.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a single frame against an empty map.
    Step(StepArgs),
    /// Replay a manifest of frames through one persistent map.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON perception params; omitted fields use the built-in calibration.
    #[arg(long)]
    params: Option<PathBuf>,
    /// Directory for overlay.png, worldmap.png and report.json.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct StepArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long, allow_hyphen_values = true)]
    x: f64,
    #[arg(long, allow_hyphen_values = true)]
    y: f64,
    /// Heading in degrees.
    #[arg(long, allow_hyphen_values = true)]
    yaw: f64,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// JSON array of `{ "image_path", "x", "y", "yaw" }`; paths are relative to the manifest.
    #[arg(long)]
    manifest: PathBuf,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    image_path: PathBuf,
    x: f64,
    y: f64,
    yaw: f64,
}

#[derive(Debug, Serialize)]
struct FrameReport {
    image_path: PathBuf,
    pose: RoverPose,
    report: Option<StepReport>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    frames: Vec<FrameReport>,
    processed: usize,
    skipped: usize,
    mean_nav_angle: Option<f64>,
    touched_cells: TouchedCells,
}

#[derive(Debug, Serialize)]
struct TouchedCells {
    obstacle: usize,
    target: usize,
    navigable: usize,
}

fn log_level(cli: &Cli) -> LevelFilter {
    if cli.quiet {
        return LevelFilter::Error;
    }
    match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// With the `tracing` feature, `RUST_LOG` overrides `-v`/`-q` when set.
#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = LogTracer::init();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(cli).to_string().to_lowercase()));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if cli.json_logs {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) {
    let _ = env_logger::Builder::new()
        .filter_level(log_level(cli))
        .format_timestamp_millis()
        .format_target(false)
        .try_init();
}

fn read_params(path: Option<&Path>) -> Result<PerceptionParams, CliError> {
    let Some(path) = path else {
        return Ok(PerceptionParams::default());
    };
    let raw = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    PerceptionParams::from_json(&raw).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn load_frame(path: &Path) -> Result<::image::RgbImage, CliError> {
    load_rgb(path).map_err(|source| CliError::Image {
        path: path.to_path_buf(),
        source,
    })
}

fn write_png(img: &rover_vision::core::RgbImage, path: PathBuf) -> Result<(), CliError> {
    save_png(img, &path).map_err(|source| CliError::Image { path, source })
}

fn write_outputs(
    out_dir: &Path,
    perception: &Perception,
    state: &rover_vision::RoverState,
    report: &RunReport,
) -> Result<(), CliError> {
    fs::create_dir_all(out_dir).map_err(|source| CliError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;
    write_png(&state.vision_image, out_dir.join("overlay.png"))?;
    write_png(&state.worldmap.to_display_rgb(), out_dir.join("worldmap.png"))?;

    let report_path = out_dir.join("report.json");
    let json = serde_json::to_string_pretty(report).map_err(|source| CliError::Json {
        path: report_path.clone(),
        source,
    })?;
    fs::write(&report_path, json).map_err(|source| CliError::Write {
        path: report_path.clone(),
        source,
    })?;

    let (w, h) = perception.frame_size();
    log::info!(
        "wrote {} ({}x{} frames, {} processed, {} skipped)",
        out_dir.display(),
        w,
        h,
        report.processed,
        report.skipped
    );
    Ok(())
}

/// Process `(path, pose)` pairs in order. The first frame fixes the frame
/// size; later frames that fail to load or fail per-frame checks are logged
/// and skipped; the map keeps what earlier frames contributed.
fn run_frames(
    frames: &[(PathBuf, RoverPose)],
    params: PerceptionParams,
    out_dir: &Path,
) -> Result<(), CliError> {
    let Some((first_path, _)) = frames.first() else {
        return Err(CliError::NoFrames);
    };
    let first = load_frame(first_path)?;
    let perception = Perception::new(params, first.width() as usize, first.height() as usize)?;
    let mut state = perception.new_state();

    let mut reports = Vec::with_capacity(frames.len());
    let mut processed = 0;
    for (i, (path, pose)) in frames.iter().enumerate() {
        let result = if i == 0 {
            perception
                .step(&rgb_view(&first), pose, &mut state)
                .map_err(CliError::from)
        } else {
            load_frame(path)
                .and_then(|img| Ok(perception.step(&rgb_view(&img), pose, &mut state)?))
        };

        let (report, error) = match result {
            Ok(report) => {
                processed += 1;
                (Some(report), None)
            }
            Err(err) => {
                log::warn!("skipping {}: {}", path.display(), err);
                (None, Some(err.to_string()))
            }
        };
        reports.push(FrameReport {
            image_path: path.clone(),
            pose: *pose,
            report,
            error,
        });
    }

    let map = &state.worldmap;
    let run = RunReport {
        skipped: frames.len() - processed,
        processed,
        frames: reports,
        mean_nav_angle: state.mean_nav_angle(),
        touched_cells: TouchedCells {
            obstacle: map.touched_cells(rover_vision::MapChannel::Obstacle),
            target: map.touched_cells(rover_vision::MapChannel::Target),
            navigable: map.touched_cells(rover_vision::MapChannel::Navigable),
        },
    };
    write_outputs(out_dir, &perception, &state, &run)
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Step(args) => {
            let params = read_params(args.common.params.as_deref())?;
            let frames = [(args.image, RoverPose::new(args.x, args.y, args.yaw))];
            run_frames(&frames, params, &args.common.out_dir)
        }
        Command::Replay(args) => {
            let params = read_params(args.common.params.as_deref())?;
            let raw = fs::read_to_string(&args.manifest).map_err(|source| CliError::Read {
                path: args.manifest.clone(),
                source,
            })?;
            let entries: Vec<ManifestEntry> =
                serde_json::from_str(&raw).map_err(|source| CliError::Json {
                    path: args.manifest.clone(),
                    source,
                })?;
            let base = args.manifest.parent().unwrap_or_else(|| Path::new("."));
            let frames: Vec<(PathBuf, RoverPose)> = entries
                .into_iter()
                .map(|e| (base.join(e.image_path), RoverPose::new(e.x, e.y, e.yaw)))
                .collect();
            run_frames(&frames, params, &args.common.out_dir)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
