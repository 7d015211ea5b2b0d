//! Statistics snapshots and counter accessors
//!
//! A [`StatSnapshot`] is one observation of the cumulative transport counters
//! of a subscriber, taken at a monotonic timestamp. Snapshots come from an
//! external source and may be incomplete, so every accessor here treats a
//! missing block or field as zero instead of failing.

pub mod delta;

pub use delta::{bitrate_delta, packet_delta, packet_loss_ratio, packets_lost_delta};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Media kinds tracked by a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Audio media
    Audio,
    /// Video media
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Cumulative receive counters for one media kind
///
/// Fields are optional because statistics sources do not always report all
/// of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaCounters {
    /// Packets lost since the stream started
    pub packets_lost: Option<u64>,
    /// Packets received since the stream started
    pub packets_received: Option<u64>,
    /// Payload bytes received since the stream started
    pub bytes_received: Option<u64>,
}

impl MediaCounters {
    /// Create a fully populated counter block
    pub fn new(packets_lost: u64, packets_received: u64, bytes_received: u64) -> Self {
        Self {
            packets_lost: Some(packets_lost),
            packets_received: Some(packets_received),
            bytes_received: Some(bytes_received),
        }
    }
}

/// One timestamped observation of cumulative counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatSnapshot {
    /// Monotonic timestamp in milliseconds
    pub timestamp_ms: f64,
    /// Audio counters, if the source reported any
    pub audio: Option<MediaCounters>,
    /// Video counters, if the source reported any
    pub video: Option<MediaCounters>,
    /// Round-trip time in milliseconds, if the source measured one
    pub round_trip_time_ms: Option<f64>,
}

impl StatSnapshot {
    /// Create an empty snapshot at the given timestamp
    pub fn new(timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            ..Default::default()
        }
    }

    /// Set the audio counters
    pub fn with_audio(mut self, counters: MediaCounters) -> Self {
        self.audio = Some(counters);
        self
    }

    /// Set the video counters
    pub fn with_video(mut self, counters: MediaCounters) -> Self {
        self.video = Some(counters);
        self
    }

    /// Set the measured round-trip time
    pub fn with_round_trip_time_ms(mut self, rtt_ms: f64) -> Self {
        self.round_trip_time_ms = Some(rtt_ms);
        self
    }

    /// Counter block for a media kind
    pub fn counters(&self, kind: MediaKind) -> Option<&MediaCounters> {
        match kind {
            MediaKind::Audio => self.audio.as_ref(),
            MediaKind::Video => self.video.as_ref(),
        }
    }

    /// Packets lost for a media kind, zero when not reported
    pub fn packets_lost(&self, kind: MediaKind) -> u64 {
        self.counters(kind)
            .and_then(|c| c.packets_lost)
            .unwrap_or(0)
    }

    /// Packets received for a media kind, zero when not reported
    pub fn packets_received(&self, kind: MediaKind) -> u64 {
        self.counters(kind)
            .and_then(|c| c.packets_received)
            .unwrap_or(0)
    }

    /// Bytes received for a media kind, zero when not reported
    pub fn bytes_received(&self, kind: MediaKind) -> u64 {
        self.counters(kind)
            .and_then(|c| c.bytes_received)
            .unwrap_or(0)
    }

    /// Lost plus received packets for a media kind
    pub fn total_packets(&self, kind: MediaKind) -> u64 {
        self.packets_lost(kind)
            .saturating_add(self.packets_received(kind))
    }
}
