//! marker-motion CLI: calibration folder + sequence folder → motion CSV.

use clap::{Parser, ValueEnum};
use marker_motion::{run_to_file, PipelineConfig};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "marker-motion")]
#[command(about = "Track stereo markers and write their 3-D motion relative to the first frame")]
#[command(version)]
struct Cli {
    /// Folder with K1.csv, K2.csv, D1.csv, D2.csv, F.csv, T_C1_W.csv and T_C1_C2.csv.
    calibration_dir: PathBuf,

    /// Folder with both cameras' frame directories and markers1.csv / markers2.csv.
    sequence_dir: PathBuf,

    /// Result file (`frame,marker,x,y,z` per line).
    output: PathBuf,

    /// JSON run configuration; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbosity of progress messages on stderr.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Emit tracing spans as JSON instead of plain text.
    #[cfg(feature = "tracing")]
    #[arg(long)]
    trace_json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::load_json(path)
            .map_err(|err| format!("could not read config {}: {err}", path.display()))?,
        None => PipelineConfig::default(),
    };
    run_to_file(&cli.calibration_dir, &cli.sequence_dir, &cli.output, &config)?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) {
    let _ = tracing_log::LogTracer::init();
    log::set_max_level(cli.log_level.into());
    marker_motion::core::init_tracing(cli.trace_json);
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) {
    let _ = marker_motion::core::init_with_level(cli.log_level.into());
}
