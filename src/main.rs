//! Spiral Screening CLI
//!
//! Scores spiral drawings with the bundled model.
//!
//! Usage: `spiralscore [--config <file>] [--json] <image>...`

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use spiralscore::config::Config;
use spiralscore::engine::OpenVinoRuntime;
use spiralscore::service::ScreeningService;

/// Score spiral drawings with the screening model
#[derive(Parser, Debug)]
#[command(name = "spiralscore", version)]
#[command(about = "Spiral drawing screening: one score per image")]
struct Args {
    /// Configuration file (defaults to config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a JSON report instead of one line per image
    #[arg(long)]
    json: bool,

    /// Images to score
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

/// One line of output. A failed image has no score, never a zero score.
#[derive(Serialize)]
struct ImageReport {
    image: String,
    score: Option<f32>,
    inference_time_ms: Option<u64>,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Spiral Screening v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load(Config::default_path()).unwrap_or_else(|e| {
            info!("Using default config ({})", e);
            Config::default()
        }),
    };

    info!("  Model: {}", config.model.path.display());
    info!("  Device: {}", config.inference.device);
    info!("  Resize filter: {}", config.preprocess.filter.as_str());

    let runtime = OpenVinoRuntime::new(&config.inference)
        .map_err(|e| anyhow::anyhow!("OpenVINO unavailable: {e}"))?;
    let service = Arc::new(ScreeningService::new(runtime, &config));

    service.initialize().context("loading screening model")?;

    let mut failures = 0usize;
    let mut reports = Vec::with_capacity(args.images.len());

    for path in &args.images {
        let image = path.display().to_string();
        let outcome = match std::fs::read(path) {
            Ok(data) => service.analyze_async(data).await,
            Err(e) => Err(spiralscore::ScreeningError::decode(
                format!("cannot read image {image}"),
                e,
            )),
        };

        let report = match outcome {
            Ok(score) => ImageReport {
                image,
                score: Some(score.score),
                inference_time_ms: Some(score.inference_time_ms),
                error: None,
            },
            Err(e) => {
                failures += 1;
                error!("{}: no score ({})", image, e);
                ImageReport {
                    image,
                    score: None,
                    inference_time_ms: None,
                    error: Some(format!("{}: {}", e.kind(), e)),
                }
            }
        };
        reports.push(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            match report.score {
                Some(score) => println!("{}\t{:.6}", report.image, score),
                None => println!("{}\tno score", report.image),
            }
        }
    }

    service.release()?;
    info!("Status: {}", serde_json::to_string(&service.status())?);

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
