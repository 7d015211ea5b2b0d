//! Per-interval calculations between two consecutive snapshots
//!
//! Counters are cumulative, so a reset at the source shows up as a negative
//! delta. Nothing here clamps those; callers decide how to treat them.

use super::{MediaKind, StatSnapshot};

/// Packets (lost + received) seen between two snapshots
pub fn packet_delta(kind: MediaKind, current: &StatSnapshot, previous: &StatSnapshot) -> i64 {
    current.total_packets(kind) as i64 - previous.total_packets(kind) as i64
}

/// Packets lost between two snapshots
pub fn packets_lost_delta(kind: MediaKind, current: &StatSnapshot, previous: &StatSnapshot) -> i64 {
    current.packets_lost(kind) as i64 - previous.packets_lost(kind) as i64
}

/// Received bitrate in bits per second over the interval between two snapshots
///
/// Returns `None` when the interval is not a positive, finite duration, so
/// that a degenerate pair never leaks NaN or infinity into the estimators.
pub fn bitrate_delta(kind: MediaKind, current: &StatSnapshot, previous: &StatSnapshot) -> Option<f64> {
    let interval_secs = (current.timestamp_ms - previous.timestamp_ms) / 1000.0;
    if !interval_secs.is_finite() || interval_secs <= 0.0 {
        return None;
    }

    let bytes = current.bytes_received(kind) as i64 - previous.bytes_received(kind) as i64;
    Some(8.0 * bytes as f64 / interval_secs)
}

/// Fraction of packets lost over the interval between two snapshots
///
/// The lost-packet delta is divided by the total packet delta of the same
/// interval. Returns `None` when no packets were seen.
pub fn packet_loss_ratio(kind: MediaKind, current: &StatSnapshot, previous: &StatSnapshot) -> Option<f64> {
    let total = packet_delta(kind, current, previous);
    if total <= 0 {
        return None;
    }
    Some(packets_lost_delta(kind, current, previous) as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::MediaCounters;
    use proptest::prelude::*;

    fn snapshot(ts: f64, lost: u64, received: u64, bytes: u64) -> StatSnapshot {
        StatSnapshot::new(ts)
            .with_audio(MediaCounters::new(lost, received, bytes))
            .with_video(MediaCounters::new(lost, received, bytes))
    }

    #[test]
    fn test_packet_delta() {
        let previous = snapshot(0.0, 2, 100, 0);
        let current = snapshot(1000.0, 5, 150, 0);
        assert_eq!(packet_delta(MediaKind::Audio, &current, &previous), 53);
        assert_eq!(packets_lost_delta(MediaKind::Audio, &current, &previous), 3);
    }

    #[test]
    fn test_packet_delta_after_reset_is_negative() {
        let previous = snapshot(0.0, 10, 1000, 0);
        let current = snapshot(1000.0, 0, 20, 0);
        assert_eq!(packet_delta(MediaKind::Video, &current, &previous), -990);
    }

    #[test]
    fn test_bitrate_delta() {
        let previous = snapshot(1000.0, 0, 0, 10_000);
        let current = snapshot(3000.0, 0, 0, 135_000);
        // 125 kB over two seconds
        assert_eq!(bitrate_delta(MediaKind::Video, &current, &previous), Some(500_000.0));
    }

    #[test]
    fn test_bitrate_delta_zero_interval() {
        let previous = snapshot(1000.0, 0, 0, 0);
        let current = snapshot(1000.0, 0, 0, 5000);
        assert_eq!(bitrate_delta(MediaKind::Audio, &current, &previous), None);

        // clock going backwards is just as unusable
        let current = snapshot(500.0, 0, 0, 5000);
        assert_eq!(bitrate_delta(MediaKind::Audio, &current, &previous), None);
    }

    #[test]
    fn test_packet_loss_ratio() {
        let previous = snapshot(0.0, 10, 990, 0);
        let current = snapshot(1000.0, 15, 1085, 0);
        // 5 lost out of 100 packets this interval
        let ratio = packet_loss_ratio(MediaKind::Audio, &current, &previous).unwrap();
        assert!((ratio - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_packet_loss_ratio_no_packets() {
        let previous = snapshot(0.0, 10, 990, 0);
        let current = snapshot(1000.0, 10, 990, 0);
        assert_eq!(packet_loss_ratio(MediaKind::Audio, &current, &previous), None);
    }

    proptest! {
        #[test]
        fn prop_bitrate_delta_is_finite(
            start_ms in 0.0f64..1.0e9,
            interval_ms in 1.0f64..600_000.0,
            start_bytes in 0u64..1u64 << 40,
            delta_bytes in 0u64..1u64 << 32,
        ) {
            let previous = snapshot(start_ms, 0, 0, start_bytes);
            let current = snapshot(start_ms + interval_ms, 0, 0, start_bytes + delta_bytes);
            let bitrate = bitrate_delta(MediaKind::Video, &current, &previous).unwrap();
            let interval_secs = ((start_ms + interval_ms) - start_ms) / 1000.0;
            let expected = 8.0 * delta_bytes as f64 / interval_secs;

            prop_assert!(bitrate.is_finite());
            prop_assert!((bitrate - expected).abs() <= expected.abs() * 1e-9 + 1e-9);
        }
    }
}
