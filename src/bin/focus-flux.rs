//! Focus Flux CLI - Command-line interface for Focus Flux
//!
//! Commands:
//! - timeline: Classify samples into a focus timeline
//! - replay: Run-length replay segments
//! - passport: Aggregate passport report
//! - summary: Daily summary counts, activity distribution, state blocks and app sessions
//! - learn: Update a learned focus profile from history

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use focus_flux::adapter::{parse_samples, parse_samples_ndjson, prepare_samples};
use focus_flux::config::FocusConfig;
use focus_flux::pipeline::FocusProcessor;
use focus_flux::types::IntervalSample;
use focus_flux::{ComputeError, FLUX_VERSION};

/// Environment variable holding the log filter
const LOG_ENV: &str = "FOCUS_FLUX_LOG";

/// Focus Flux - turn input-activity samples into focus timelines
#[derive(Parser)]
#[command(name = "focus-flux")]
#[command(author = "Ovelo")]
#[command(version = FLUX_VERSION)]
#[command(about = "Classify activity samples into focus timelines and reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// FocusConfig JSON file (partial files allowed)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Learned focus profile; its percentile applies when none is given
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "json-pretty")]
    format: OutputFormat,

    /// Input format
    #[arg(long, global = true, default_value = "json")]
    input_format: InputFormat,

    /// Log stage diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify samples into a focus timeline
    Timeline {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Reference history used for threshold calibration
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Externally calibrated focus percentile
        #[arg(long)]
        percentile: Option<f64>,

        /// Compress idle runs and downsample for display
        #[arg(long)]
        dashboard: bool,
    },

    /// Compute replay segments
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compute the aggregate passport report
    Passport {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compute the daily summary report
    Summary {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Update the --profile focus profile (or a fresh one) from sample history
    Learn {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Write the profile here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// JSON array of samples
    Json,
    /// Newline-delimited JSON (one sample per line)
    Ndjson,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let report = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&report).unwrap_or_else(|_| report.message.clone())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_processor(config: Option<&Path>, profile: Option<&Path>) -> Result<FocusProcessor, FocusCliError> {
    let config = match config {
        Some(path) => FocusConfig::from_json(&fs::read_to_string(path)?)?,
        None => FocusConfig::default(),
    };
    let mut processor = FocusProcessor::with_config(config)?;
    if let Some(path) = profile {
        processor.load_profile(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), "loaded profile");
    }
    Ok(processor)
}

fn run(cli: Cli) -> Result<(), FocusCliError> {
    let mut processor = load_processor(cli.config.as_deref(), cli.profile.as_deref())?;
    let format = cli.format;
    let input_format = cli.input_format;

    match cli.command {
        Commands::Timeline {
            input,
            reference,
            percentile,
            dashboard,
        } => {
            let samples = read_samples(&input, input_format)?;
            let reference = reference
                .map(|path| read_samples(&path, input_format))
                .transpose()?;
            let percentile = percentile.or(processor.profile().focus_percentile());

            let mut timeline =
                processor.timeline_with_percentile(&samples, reference.as_deref(), percentile);
            if dashboard {
                timeline = processor.for_display(timeline);
            }
            info!(points = timeline.points.len(), "timeline ready");
            let payload = processor
                .encoder()
                .encode_timeline(timeline, processor.config().max_buckets);
            print_json(&payload, format)
        }
        Commands::Replay { input } => {
            let samples = read_samples(&input, input_format)?;
            let payload = processor.encoder().encode_replay(processor.replay(&samples, None));
            print_json(&payload, format)
        }
        Commands::Passport { input } => {
            let samples = read_samples(&input, input_format)?;
            let passport = processor.passport(&samples, None)?;
            print_json(&processor.encoder().encode_passport(passport), format)
        }
        Commands::Summary { input } => {
            let samples = read_samples(&input, input_format)?;
            let report = processor.summary(&samples, None);
            if !report.activity.has_enough_data() {
                debug!(
                    samples = report.activity.total_intervals,
                    "too few samples for percentile calibration"
                );
            }
            print_json(&processor.encoder().encode_summary(report), format)
        }
        Commands::Learn { input, output } => {
            let samples = read_samples(&input, input_format)?;
            if !processor.learn(&samples) {
                return Err(FocusCliError::NoActivity);
            }
            let json = processor.save_profile()?;
            match output {
                Some(path) => fs::write(path, json)?,
                None => println!("{}", json),
            }
            Ok(())
        }
    }
}

fn read_samples(path: &Path, format: InputFormat) -> Result<Vec<IntervalSample>, FocusCliError> {
    let data = if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };

    let samples = match format {
        InputFormat::Json => parse_samples(&data)?,
        InputFormat::Ndjson => parse_samples_ndjson(&data)?,
    };
    debug!(path = %path.display(), samples = samples.len(), "read samples");
    Ok(prepare_samples(samples)?)
}

fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> Result<(), FocusCliError> {
    let json = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    println!("{}", json);
    Ok(())
}

// Error types

#[derive(Debug)]
enum FocusCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoActivity,
}

impl From<io::Error> for FocusCliError {
    fn from(e: io::Error) -> Self {
        FocusCliError::Io(e)
    }
}

impl From<ComputeError> for FocusCliError {
    fn from(e: ComputeError) -> Self {
        FocusCliError::Compute(e)
    }
}

impl From<serde_json::Error> for FocusCliError {
    fn from(e: serde_json::Error) -> Self {
        FocusCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FocusCliError> for CliError {
    fn from(e: FocusCliError) -> Self {
        match e {
            FocusCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FocusCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::InvalidConfig(_) | ComputeError::InvalidTimezone(_) => {
                        ("CONFIG_ERROR", "Check the --config file against FocusConfig")
                    }
                    ComputeError::InvalidProfile(_) => ("PROFILE_ERROR", "Check the --profile file"),
                    ComputeError::InvalidSample(_) => {
                        ("INVALID_SAMPLE", "Samples need finite timestamps and non-negative counts")
                    }
                    _ => ("PARSE_ERROR", "Ensure input is an array of interval samples, or use --input-format ndjson"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            FocusCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            FocusCliError::NoActivity => CliError {
                code: "NO_ACTIVITY".to_string(),
                message: "No samples with input activity found".to_string(),
                hint: Some("Learning needs samples with keystrokes, clicks or scrolls".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_flag_is_global() {
        let cli = Cli::try_parse_from(["focus-flux", "timeline", "-i", "day.json", "--profile", "me.json"]).unwrap();
        assert_eq!(cli.profile, Some(PathBuf::from("me.json")));

        let cli = Cli::try_parse_from(["focus-flux", "--profile", "me.json", "learn", "-i", "day.json"]).unwrap();
        assert_eq!(cli.profile, Some(PathBuf::from("me.json")));
    }

    #[test]
    fn test_loaded_profile_supplies_percentile() {
        let mut calibrated = FocusProcessor::new();
        calibrated.apply_calibration(30.0);
        let path = std::env::temp_dir().join(format!("focus-flux-profile-{}.json", std::process::id()));
        fs::write(&path, calibrated.save_profile().unwrap()).unwrap();

        let processor = load_processor(None, Some(&path)).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(processor.profile().focus_percentile(), Some(30.0));

        let fresh = load_processor(None, None).unwrap();
        assert_eq!(fresh.profile().focus_percentile(), None);
    }
}
