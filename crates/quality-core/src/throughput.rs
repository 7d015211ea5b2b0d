//! Bandwidth estimation from the snapshot history
//!
//! The estimate is the mean of the per-interval bitrates over every
//! consecutive snapshot pair in the history. Intervals with a non-positive
//! duration are skipped. Loss ratios are accumulated over the same intervals,
//! ignoring intervals where the counters went backwards.

use serde::{Deserialize, Serialize};

use crate::history::History;
use crate::stats::{bitrate_delta, packet_delta, packets_lost_delta, MediaKind, StatSnapshot};

/// Bandwidth estimate derived from the history
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Throughput {
    /// Combined audio and video bitrate in bits per second
    pub bits_per_second: f64,
    /// Mean audio bitrate in bits per second
    pub audio_bps: f64,
    /// Mean video bitrate in bits per second
    pub video_bps: f64,
    /// Fraction of audio packets lost across the history
    pub audio_packet_loss_ratio: f64,
    /// Fraction of video packets lost across the history
    pub video_packet_loss_ratio: f64,
    /// Number of intervals the estimate is based on
    pub intervals: usize,
}

impl Throughput {
    /// Mean bitrate for one media kind
    pub fn bps(&self, kind: MediaKind) -> f64 {
        match kind {
            MediaKind::Audio => self.audio_bps,
            MediaKind::Video => self.video_bps,
        }
    }

    /// Packet loss ratio for one media kind
    pub fn packet_loss_ratio(&self, kind: MediaKind) -> f64 {
        match kind {
            MediaKind::Audio => self.audio_packet_loss_ratio,
            MediaKind::Video => self.video_packet_loss_ratio,
        }
    }
}

#[derive(Default)]
struct KindAccumulator {
    bitrate_sum: f64,
    lost: u64,
    total: u64,
}

impl KindAccumulator {
    fn add(&mut self, kind: MediaKind, current: &StatSnapshot, previous: &StatSnapshot, bitrate: f64) {
        self.bitrate_sum += bitrate;

        let total = packet_delta(kind, current, previous);
        let lost = packets_lost_delta(kind, current, previous);
        if total > 0 && lost >= 0 {
            self.total += total as u64;
            self.lost += lost as u64;
        }
    }

    fn loss_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.lost as f64 / self.total as f64
    }
}

/// Estimate throughput from the full history
///
/// Returns `None` while fewer than two snapshots exist or when no interval in
/// the history has a usable duration.
pub fn estimate_throughput(history: &History) -> Option<Throughput> {
    if history.len() < 2 {
        return None;
    }

    let mut audio = KindAccumulator::default();
    let mut video = KindAccumulator::default();
    let mut intervals = 0usize;

    let mut snapshots = history.iter();
    let mut previous = snapshots.next()?;
    for current in snapshots {
        let rates = bitrate_delta(MediaKind::Audio, current, previous)
            .zip(bitrate_delta(MediaKind::Video, current, previous));
        if let Some((audio_bps, video_bps)) = rates {
            audio.add(MediaKind::Audio, current, previous, audio_bps);
            video.add(MediaKind::Video, current, previous, video_bps);
            intervals += 1;
        }
        previous = current;
    }

    if intervals == 0 {
        return None;
    }

    let audio_bps = audio.bitrate_sum / intervals as f64;
    let video_bps = video.bitrate_sum / intervals as f64;
    Some(Throughput {
        bits_per_second: audio_bps + video_bps,
        audio_bps,
        video_bps,
        audio_packet_loss_ratio: audio.loss_ratio(),
        video_packet_loss_ratio: video.loss_ratio(),
        intervals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::MediaCounters;

    /// Snapshot `n` of a stream sending `audio_bps` + `video_bps` once per second
    fn constant_snapshot(n: u64, audio_bps: u64, video_bps: u64) -> StatSnapshot {
        StatSnapshot::new(n as f64 * 1000.0)
            .with_audio(MediaCounters::new(0, n * 50, n * audio_bps / 8))
            .with_video(MediaCounters::new(0, n * 100, n * video_bps / 8))
    }

    #[test]
    fn test_requires_two_snapshots() {
        let history = History::from_entries(10, [constant_snapshot(0, 32_000, 500_000)]);
        assert_eq!(estimate_throughput(&history), None);
        assert_eq!(estimate_throughput(&History::new(10)), None);
    }

    #[test]
    fn test_constant_stream() {
        let history = History::from_entries(10, (0..5).map(|n| constant_snapshot(n, 32_000, 500_000)));
        let throughput = estimate_throughput(&history).unwrap();

        assert_eq!(throughput.intervals, 4);
        assert_eq!(throughput.audio_bps, 32_000.0);
        assert_eq!(throughput.video_bps, 500_000.0);
        assert_eq!(throughput.bits_per_second, 532_000.0);
        assert_eq!(throughput.audio_packet_loss_ratio, 0.0);
        assert_eq!(throughput.bps(MediaKind::Video), 500_000.0);
    }

    #[test]
    fn test_mean_of_intervals() {
        let history = History::from_entries(
            10,
            [
                StatSnapshot::new(0.0).with_video(MediaCounters::new(0, 0, 0)),
                StatSnapshot::new(1000.0).with_video(MediaCounters::new(0, 10, 12_500)),
                StatSnapshot::new(2000.0).with_video(MediaCounters::new(0, 20, 50_000)),
            ],
        );
        let throughput = estimate_throughput(&history).unwrap();
        // 100 kbps then 300 kbps
        assert_eq!(throughput.video_bps, 200_000.0);
        assert_eq!(throughput.audio_bps, 0.0);
    }

    #[test]
    fn test_skips_zero_length_intervals() {
        let history = History::from_entries(
            10,
            [
                StatSnapshot::new(0.0).with_video(MediaCounters::new(0, 0, 0)),
                StatSnapshot::new(0.0).with_video(MediaCounters::new(0, 5, 1_000)),
                StatSnapshot::new(1000.0).with_video(MediaCounters::new(0, 10, 13_500)),
            ],
        );
        let throughput = estimate_throughput(&history).unwrap();
        assert_eq!(throughput.intervals, 1);
        assert_eq!(throughput.video_bps, 100_000.0);

        let degenerate = History::from_entries(10, [StatSnapshot::new(5.0), StatSnapshot::new(5.0)]);
        assert_eq!(estimate_throughput(&degenerate), None);
    }

    #[test]
    fn test_loss_ratio_accumulates() {
        let history = History::from_entries(
            10,
            [
                StatSnapshot::new(0.0).with_audio(MediaCounters::new(0, 0, 0)),
                StatSnapshot::new(1000.0).with_audio(MediaCounters::new(2, 48, 4_000)),
                StatSnapshot::new(2000.0).with_audio(MediaCounters::new(2, 98, 8_000)),
            ],
        );
        let throughput = estimate_throughput(&history).unwrap();
        assert!((throughput.audio_packet_loss_ratio - 0.02).abs() < 1e-12);
        assert_eq!(throughput.packet_loss_ratio(MediaKind::Video), 0.0);
    }

    #[test]
    fn test_pure_function_of_history() {
        let history = History::from_entries(10, (0..4).map(|n| constant_snapshot(n, 24_000, 800_000)));
        assert_eq!(estimate_throughput(&history), estimate_throughput(&history));
    }
}
