//! `callprobe` - run a call quality probe against a synthetic stream
//!
//! ```text
//! callprobe --video-bitrate 800000 --loss 0.02 --width 1280 --height 720
//! callprobe --config probe.toml --json
//! ```

mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use tracing::{debug, info, warn};

use callprobe_quality_core::{
    ProbeConfig, ProbeError, ProbeObserver, ProbeOutcome, QualityProbe, QualityReport,
    StatSnapshot, SyntheticStatsSource, SyntheticStreamConfig, VideoDimensions,
};

use crate::logging::{parse_log_level, setup_logging, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "callprobe", version, about = "Estimate call quality from sampled transport statistics")]
struct Cli {
    /// Probe configuration file (TOML)
    #[arg(short, long, env = "CALLPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Sampling interval in milliseconds, overrides the configuration file
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Synthetic video bitrate in bits per second
    #[arg(long, default_value_t = 500_000.0)]
    video_bitrate: f64,

    /// Synthetic audio bitrate in bits per second
    #[arg(long, default_value_t = 32_000.0)]
    audio_bitrate: f64,

    /// Synthetic packet loss ratio in [0, 1)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    loss: f64,

    /// Synthetic round-trip time in milliseconds
    #[arg(long)]
    rtt_ms: Option<f64>,

    /// Video width in pixels (0 for an audio-only session)
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Video height in pixels (0 for an audio-only session)
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Give up after this many ticks without a steady state
    #[arg(long, default_value_t = 30)]
    max_ticks: u32,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "CALLPROBE_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Include file and line information in logs
    #[arg(long)]
    log_location: bool,

    /// Log probe span open/close events
    #[arg(long)]
    log_spans: bool,
}

/// Logs every snapshot and fetch failure as it arrives
struct TickLogger;

#[async_trait]
impl ProbeObserver for TickLogger {
    async fn on_stats(&self, error: Option<&ProbeError>, snapshot: Option<&StatSnapshot>) {
        if let Some(error) = error {
            warn!("Statistics fetch failed: {}", error);
        }
        if let Some(snapshot) = snapshot {
            debug!(
                "Snapshot at {}ms: audio={:?} video={:?}",
                snapshot.timestamp_ms, snapshot.audio, snapshot.video
            );
        }
    }

    async fn on_complete(&self, report: &QualityReport) {
        info!("Probe complete: rating={}", report.rating);
    }
}

fn load_config(cli: &Cli) -> Result<ProbeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let document = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            ProbeConfig::from_toml_str(&document)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?
        }
        None => ProbeConfig::default(),
    };

    if let Some(interval_ms) = cli.interval_ms {
        config.interval_ms = interval_ms;
    }
    config.validate()?;
    Ok(config)
}

/// Time after which a probe that never stabilizes is cancelled
fn probe_deadline(interval: Duration, max_ticks: u32) -> Duration {
    interval
        .checked_mul(max_ticks.saturating_add(1))
        .unwrap_or(Duration::MAX)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::new(parse_log_level(&cli.log_level)?);
    if cli.log_json {
        logging = logging.with_json();
    }
    if cli.log_location {
        logging = logging.with_file_info();
    }
    if cli.log_spans {
        logging = logging.with_spans();
    }
    setup_logging(logging)?;
    info!("Starting callprobe v{}", callprobe_quality_core::VERSION);

    let config = load_config(&cli)?;
    let stream = SyntheticStreamConfig {
        audio_bps: cli.audio_bitrate,
        video_bps: cli.video_bitrate,
        loss_ratio: cli.loss,
        step_ms: config.interval_ms as f64,
        round_trip_time_ms: cli.rtt_ms,
        ..Default::default()
    };
    let dimensions = (cli.width > 0 && cli.height > 0).then(|| VideoDimensions::new(cli.width, cli.height));

    let source = SyntheticStatsSource::new(stream).context("Invalid synthetic stream")?;

    let handle = QualityProbe::new(config.clone(), Arc::new(source), Arc::new(dimensions))?
        .with_name("synthetic")
        .with_observer(Arc::new(TickLogger))
        .start();

    let max_ticks = cli.max_ticks;
    let deadline = probe_deadline(config.interval(), max_ticks);
    let teardown = handle.cancellation_token();
    let guard = tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        warn!("No steady state after {} ticks, cancelling", max_ticks);
        teardown.cancel();
    });

    let outcome = handle.wait().await?;
    guard.abort();

    match outcome {
        ProbeOutcome::Steady(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
        ProbeOutcome::Cancelled => {
            anyhow::bail!("probe cancelled before the bitrate stabilized");
        }
    }

    Ok(())
}
