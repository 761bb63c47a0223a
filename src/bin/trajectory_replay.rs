use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use activity_track_rs::{DensityPreset, ProcessorConfig, TrajectoryPoint, TrajectoryProcessor};
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::Parser;
use flate2::read::GzDecoder;
use serde::Serialize;

/// Rebuild a trajectory from a saved activity streams payload and dump it as JSON.
#[derive(Parser, Debug)]
struct Args {
    /// Path to a streams payload (.json or .json.gz)
    #[arg(long)]
    streams: PathBuf,

    /// Activity start time (RFC 3339)
    #[arg(long)]
    start: DateTime<Utc>,

    /// Marker density: low, medium, high, ultra_high
    #[arg(long, default_value = "medium")]
    density: String,

    /// Only report points from this time on (RFC 3339, needs --window-end)
    #[arg(long, requires = "window_end")]
    window_start: Option<DateTime<Utc>>,

    /// End of the reporting window (RFC 3339, needs --window-start)
    #[arg(long, requires = "window_start")]
    window_end: Option<DateTime<Utc>>,

    /// Ingestion worker threads (overrides the config file)
    #[arg(long)]
    workers: Option<usize>,

    /// Processor config JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report {
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    duration_secs: i64,
    total_points: usize,
    synthetic_points: usize,
    density: String,
    markers: Vec<TrajectoryPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    window: Option<Vec<TrajectoryPoint>>,
}

fn read_payload(path: &Path) -> anyhow::Result<String> {
    let file = File::open(path)?;
    let mut payload = String::new();
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        BufReader::new(GzDecoder::new(file)).read_to_string(&mut payload)?;
    } else {
        BufReader::new(file).read_to_string(&mut payload)?;
    }
    Ok(payload)
}

fn load_config(args: &Args) -> anyhow::Result<ProcessorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ProcessorConfig::from_json(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ProcessorConfig::default(),
    };
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let density = DensityPreset::from_name_or_default(&args.density);

    let payload = read_payload(&args.streams)
        .with_context(|| format!("reading streams {}", args.streams.display()))?;

    let processor = TrajectoryProcessor::new(config);
    let trajectory = processor
        .process_stream_json(&payload, args.start)
        .context("building trajectory")?;

    let window = match (args.window_start, args.window_end) {
        (Some(start), Some(end)) => {
            if end < start {
                bail!("--window-end is before --window-start");
            }
            Some(processor.points_for_time_range(start, end))
        }
        _ => None,
    };

    let markers = processor.select(density);
    log::info!(
        "{} markers at {} density from {} points",
        markers.len(),
        density,
        trajectory.len()
    );

    let report = Report {
        start_time: trajectory.start_time(),
        end_time: trajectory.end_time(),
        duration_secs: trajectory.duration().num_seconds(),
        total_points: trajectory.len(),
        synthetic_points: trajectory.synthetic_count(),
        density: density.to_string(),
        markers,
        window,
    };

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            log::info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
