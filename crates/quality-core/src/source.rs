//! Collaborators the probe consumes
//!
//! The engine never collects statistics itself. It pulls snapshots from a
//! [`StatsSource`] and reads the current video size from a
//! [`StreamDescriptor`]. A [`SyntheticStatsSource`] is provided for demos and
//! tests.

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use crate::error::{ProbeError, Result};
use crate::score::VideoDimensions;
use crate::stats::{MediaCounters, StatSnapshot};

/// Asynchronous provider of statistics snapshots
///
/// Each call yields at most one snapshot. `Ok(None)` means the source had no
/// data this time and the probe simply skips the tick.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch the current cumulative counters
    async fn get_stats(&self) -> Result<Option<StatSnapshot>>;
}

/// Describes the subscriber's active video stream
pub trait StreamDescriptor: Send + Sync {
    /// Pixel dimensions of the current stream, `None` when there is no stream
    fn video_dimensions(&self) -> Option<VideoDimensions>;
}

impl StreamDescriptor for VideoDimensions {
    fn video_dimensions(&self) -> Option<VideoDimensions> {
        Some(*self)
    }
}

impl StreamDescriptor for Option<VideoDimensions> {
    fn video_dimensions(&self) -> Option<VideoDimensions> {
        *self
    }
}

/// Dimensions published through a watch channel, for streams that change
/// resolution or come and go during a probe
impl StreamDescriptor for watch::Receiver<Option<VideoDimensions>> {
    fn video_dimensions(&self) -> Option<VideoDimensions> {
        *self.borrow()
    }
}

/// Parameters of a synthetic media stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticStreamConfig {
    /// Audio bitrate in bits per second
    pub audio_bps: f64,
    /// Video bitrate in bits per second
    pub video_bps: f64,
    /// Fraction of packets lost, in `[0, 1)`
    pub loss_ratio: f64,
    /// Audio payload size in bytes
    pub audio_packet_bytes: f64,
    /// Video payload size in bytes
    pub video_packet_bytes: f64,
    /// Simulated time between snapshots in milliseconds
    pub step_ms: f64,
    /// Round-trip time reported with every snapshot
    pub round_trip_time_ms: Option<f64>,
}

impl Default for SyntheticStreamConfig {
    fn default() -> Self {
        Self {
            audio_bps: 32_000.0,
            video_bps: 500_000.0,
            loss_ratio: 0.0,
            audio_packet_bytes: 80.0,
            video_packet_bytes: 1_200.0,
            step_ms: 1_000.0,
            round_trip_time_ms: None,
        }
    }
}

impl SyntheticStreamConfig {
    /// Check that the stream parameters describe a possible stream
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.loss_ratio) {
            return Err(ProbeError::invalid_config(format!(
                "loss ratio must be in [0, 1), got {}",
                self.loss_ratio
            )));
        }
        if !(self.audio_bps >= 0.0 && self.audio_bps.is_finite())
            || !(self.video_bps >= 0.0 && self.video_bps.is_finite())
        {
            return Err(ProbeError::invalid_config("bitrates must be finite and non-negative"));
        }
        if !(self.step_ms > 0.0 && self.step_ms.is_finite()) {
            return Err(ProbeError::invalid_config("step must be a positive number of milliseconds"));
        }
        if self.round_trip_time_ms.is_some_and(|rtt| !(rtt >= 0.0 && rtt.is_finite())) {
            return Err(ProbeError::invalid_config("round-trip time must be finite and non-negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SyntheticCounters {
    timestamp_ms: f64,
    audio_bytes: f64,
    video_bytes: f64,
    audio_packets: f64,
    video_packets: f64,
}

/// Statistics source producing counters of a constant-rate stream
///
/// Every call advances a simulated clock by `step_ms`, so the snapshots are
/// deterministic regardless of how fast they are requested.
#[derive(Debug)]
pub struct SyntheticStatsSource {
    config: SyntheticStreamConfig,
    counters: Mutex<SyntheticCounters>,
}

impl SyntheticStatsSource {
    /// Create a source for the given stream, rejecting impossible parameters
    pub fn new(config: SyntheticStreamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            counters: Mutex::new(SyntheticCounters::default()),
        })
    }
}

impl Default for SyntheticStatsSource {
    fn default() -> Self {
        Self {
            config: SyntheticStreamConfig::default(),
            counters: Mutex::new(SyntheticCounters::default()),
        }
    }
}

/// Counters after `packets` received packets; `loss_ratio` is in `[0, 1)`
fn counters_for(packets: f64, bytes: f64, loss_ratio: f64) -> MediaCounters {
    let received = packets.floor();
    let lost = (packets * loss_ratio / (1.0 - loss_ratio)).floor();
    MediaCounters::new(lost as u64, received as u64, bytes.floor() as u64)
}

#[async_trait]
impl StatsSource for SyntheticStatsSource {
    async fn get_stats(&self) -> Result<Option<StatSnapshot>> {
        let mut counters = self.counters.lock().await;
        let config = &self.config;

        let snapshot = StatSnapshot {
            timestamp_ms: counters.timestamp_ms,
            audio: Some(counters_for(counters.audio_packets, counters.audio_bytes, config.loss_ratio)),
            video: Some(counters_for(counters.video_packets, counters.video_bytes, config.loss_ratio)),
            round_trip_time_ms: config.round_trip_time_ms,
        };

        let step_secs = config.step_ms / 1000.0;
        let audio_bytes = config.audio_bps * step_secs / 8.0;
        let video_bytes = config.video_bps * step_secs / 8.0;
        counters.timestamp_ms += config.step_ms;
        counters.audio_bytes += audio_bytes;
        counters.video_bytes += video_bytes;
        if config.audio_packet_bytes > 0.0 {
            counters.audio_packets += audio_bytes / config.audio_packet_bytes;
        }
        if config.video_packet_bytes > 0.0 {
            counters.video_packets += video_bytes / config.video_packet_bytes;
        }

        Ok(Some(snapshot))
    }
}
