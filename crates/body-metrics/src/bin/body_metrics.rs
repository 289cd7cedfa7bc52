//! `body-metrics` command-line tool.
//!
//! ```bash
//! # Refine a recorded frame stream, print the profile and report as JSON
//! body-metrics refine --frames frames.json --calibration calibration.json
//!
//! # Write the result to a file instead
//! body-metrics refine --frames frames.json --user alice --out alice.json --verbose
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use body_metrics::refine::{SessionConfig, SessionOutput, SessionParams};
use body_metrics::replay::run_config;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "body-metrics")]
#[command(author, version, about = "Stable body measurements from per-frame pose landmarks")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded frame stream through one scanning session
    Refine(RefineArgs),
}

#[derive(Args, Debug)]
struct RefineArgs {
    /// JSON array of landmark frames
    #[arg(long)]
    frames: PathBuf,
    /// Calibration record; raw units are reported when missing or invalid
    #[arg(long)]
    calibration: Option<PathBuf>,
    /// Session parameter overrides (JSON)
    #[arg(long)]
    params: Option<PathBuf>,
    #[arg(long, default_value = "anonymous")]
    user: String,
    /// Write profile and report here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
    /// Log per-point rejections and evictions
    #[arg(long, short)]
    verbose: bool,
}

fn log_level(verbose: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    }
}

/// `--verbose` sets the default filter; under `tracing`, `RUST_LOG` wins when set.
fn init_logging(verbose: bool) {
    let level = log_level(verbose);
    #[cfg(feature = "tracing")]
    body_metrics::core::init_tracing(false, &level.to_string().to_ascii_lowercase());
    #[cfg(not(feature = "tracing"))]
    {
        let _ = body_metrics::core::init_with_level(level);
    }
}

fn print_summary(out: &SessionOutput) {
    let profile = &out.profile;
    for report in &out.report.types {
        let ty = report.measurement_type;
        match profile.get(ty) {
            Some(v) => eprintln!("{ty:>15}: {v:8.2} {}", profile.units),
            None => eprintln!("{ty:>15}: insufficient data ({} samples)", report.surviving),
        }
    }
    eprintln!(
        "quality {:.1}/10: {}",
        profile.calibration_quality,
        out.report.recommendation.message()
    );
}

fn refine(args: RefineArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.verbose);

    let params = match &args.params {
        Some(path) => Some(SessionParams::load_json(path)?),
        None => None,
    };
    let mut cfg = SessionConfig::new(args.frames.display().to_string());
    cfg.calibration_path = args.calibration.map(|p| p.display().to_string());
    cfg.user_id = args.user;
    cfg.params = params;
    cfg.output_path = args.out.map(|p| p.display().to_string());

    let out = run_config(&cfg)?;
    print_summary(&out);

    if cfg.output_path.is_some() {
        let path = cfg.output_path();
        out.write_json(&path)?;
        println!("wrote session output to {}", path.display());
    } else {
        println!("{}", serde_json::to_string_pretty(&out)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Refine(args) => refine(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
