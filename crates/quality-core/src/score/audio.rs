//! Audio quality estimation with a simplified ITU-T G.107 E-model
//!
//! The transmission rating is `R = 94.2 - Id - Ie`, where `Id` is the delay
//! impairment and `Ie` the equipment (loss) impairment. `R` is then mapped to
//! a MOS value in `[1, 4.5]`.

use tracing::trace;

use crate::config::EModelConfig;
use crate::history::History;
use crate::stats::{packet_delta, packets_lost_delta, MediaKind};

/// Score for an interval without audio packets
pub const NO_AUDIO_SCORE: f64 = 0.0;

/// Transmission rating with no impairments
pub const R_DEFAULT: f64 = 94.2;

/// One-way delay in milliseconds above which delay impairment applies
pub const DELAY_THRESHOLD_MS: f64 = 177.3;

/// MOS for ratings below zero
pub const MIN_MOS: f64 = 1.0;

/// MOS for ratings above 100
pub const MAX_MOS: f64 = 4.5;

/// Delay impairment `Id` for an effective delay in milliseconds
pub fn delay_impairment(delay_ms: f64) -> f64 {
    if delay_ms <= DELAY_THRESHOLD_MS {
        return 0.0;
    }
    0.024 * delay_ms + 0.11 * (delay_ms - DELAY_THRESHOLD_MS)
}

/// Equipment impairment `Ie` for a packet loss ratio in `[0, 1]`
pub fn equipment_impairment(packet_loss_ratio: f64, e_model: &EModelConfig) -> f64 {
    e_model.a + e_model.b * (1.0 + e_model.c * packet_loss_ratio).ln()
}

/// Transmission rating `R`
pub fn r_factor(rtt_ms: f64, packet_loss_ratio: f64, local_delay_ms: f64, e_model: &EModelConfig) -> f64 {
    let delay = rtt_ms + local_delay_ms;
    R_DEFAULT - delay_impairment(delay) - equipment_impairment(packet_loss_ratio, e_model)
}

/// Map a transmission rating onto the MOS scale
pub fn mos_from_r(r: f64) -> f64 {
    if r < 0.0 {
        return MIN_MOS;
    }
    if r > 100.0 {
        return MAX_MOS;
    }
    1.0 + 0.035 * r + 7.0e-6 * r * (r - 60.0) * (100.0 - r)
}

/// MOS for a given round-trip time and packet loss ratio
///
/// The loss ratio is clamped to `[0, 1]` and a non-finite or negative RTT is
/// treated as zero, so the result is always a finite MOS.
pub fn score_audio(rtt_ms: f64, packet_loss_ratio: f64, local_delay_ms: f64, e_model: &EModelConfig) -> f64 {
    let rtt_ms = if rtt_ms.is_finite() { rtt_ms.max(0.0) } else { 0.0 };
    let packet_loss_ratio = if packet_loss_ratio.is_finite() {
        packet_loss_ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };
    mos_from_r(r_factor(rtt_ms, packet_loss_ratio, local_delay_ms, e_model))
}

/// Score the most recent interval of the history
///
/// The round-trip time comes from the newest snapshot and defaults to zero
/// when the source did not measure one.
pub fn audio_score(history: &History, local_delay_ms: f64, e_model: &EModelConfig) -> f64 {
    let Some((previous, current)) = history.last_pair() else {
        return NO_AUDIO_SCORE;
    };

    let total = packet_delta(MediaKind::Audio, current, previous);
    if total <= 0 {
        return NO_AUDIO_SCORE;
    }

    let lost = packets_lost_delta(MediaKind::Audio, current, previous);
    let packet_loss_ratio = lost as f64 / total as f64;
    let rtt_ms = current.round_trip_time_ms.unwrap_or(0.0);

    let score = score_audio(rtt_ms, packet_loss_ratio, local_delay_ms, e_model);
    trace!(
        "Audio score {:.3} (rtt={}ms, loss={:.4}, packets={})",
        score, rtt_ms, packet_loss_ratio, total
    );
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LOCAL_AUDIO_DELAY_MS;
    use crate::stats::{MediaCounters, StatSnapshot};

    fn interval(lost: u64, received: u64) -> History {
        History::from_entries(
            10,
            [
                StatSnapshot::new(0.0).with_audio(MediaCounters::new(10, 1000, 0)),
                StatSnapshot::new(1000.0).with_audio(MediaCounters::new(10 + lost, 1000 + received, 8000)),
            ],
        )
    }

    #[test]
    fn test_perfect_conditions_reach_r_default() {
        let e_model = EModelConfig::default();
        assert_eq!(r_factor(0.0, 0.0, LOCAL_AUDIO_DELAY_MS, &e_model), R_DEFAULT);

        let mos = score_audio(0.0, 0.0, LOCAL_AUDIO_DELAY_MS, &e_model);
        assert_eq!(mos, mos_from_r(R_DEFAULT));
        assert!((mos - 4.4278).abs() < 1e-3, "mos = {}", mos);
    }

    #[test]
    fn test_mos_mapping_edges() {
        assert_eq!(mos_from_r(-10.0), MIN_MOS);
        assert_eq!(mos_from_r(150.0), MAX_MOS);
        assert!((mos_from_r(0.0) - 1.0).abs() < 1e-12);
        assert!(mos_from_r(50.0) < mos_from_r(80.0));
    }

    #[test]
    fn test_delay_impairment_threshold() {
        assert_eq!(delay_impairment(20.0), 0.0);
        assert_eq!(delay_impairment(DELAY_THRESHOLD_MS), 0.0);
        assert!(delay_impairment(300.0) > 0.0);

        let e_model = EModelConfig::default();
        let near = score_audio(100.0, 0.0, LOCAL_AUDIO_DELAY_MS, &e_model);
        let far = score_audio(400.0, 0.0, LOCAL_AUDIO_DELAY_MS, &e_model);
        assert_eq!(near, score_audio(0.0, 0.0, LOCAL_AUDIO_DELAY_MS, &e_model));
        assert!(far < near);
    }

    #[test]
    fn test_loss_lowers_score() {
        let e_model = EModelConfig::default();
        let clean = score_audio(0.0, 0.0, LOCAL_AUDIO_DELAY_MS, &e_model);
        let lossy = score_audio(0.0, 0.05, LOCAL_AUDIO_DELAY_MS, &e_model);
        let terrible = score_audio(0.0, 0.5, LOCAL_AUDIO_DELAY_MS, &e_model);
        assert!(clean > lossy && lossy > terrible);
        assert!(terrible >= MIN_MOS);
    }

    #[test]
    fn test_degenerate_inputs_stay_finite() {
        let e_model = EModelConfig::default();
        for (rtt, loss) in [(f64::NAN, 0.0), (0.0, f64::NAN), (-50.0, -3.0), (f64::INFINITY, 2.0)] {
            let mos = score_audio(rtt, loss, LOCAL_AUDIO_DELAY_MS, &e_model);
            assert!(mos.is_finite());
            assert!((MIN_MOS..=MAX_MOS).contains(&mos));
        }
    }

    #[test]
    fn test_audio_score_from_history() {
        let e_model = EModelConfig::default();
        let clean = audio_score(&interval(0, 50), LOCAL_AUDIO_DELAY_MS, &e_model);
        assert_eq!(clean, score_audio(0.0, 0.0, LOCAL_AUDIO_DELAY_MS, &e_model));

        // 5 of 50 packets lost this interval, regardless of the 10 lost earlier
        let lossy = audio_score(&interval(5, 45), LOCAL_AUDIO_DELAY_MS, &e_model);
        assert_eq!(lossy, score_audio(0.0, 0.1, LOCAL_AUDIO_DELAY_MS, &e_model));
    }

    #[test]
    fn test_audio_score_uses_reported_rtt() {
        let e_model = EModelConfig::default();
        let mut history = interval(0, 50);
        let latest = history.latest().cloned().unwrap();
        history.push(
            StatSnapshot::new(2000.0)
                .with_audio(MediaCounters::new(10, 1100, 16_000))
                .with_round_trip_time_ms(500.0),
        );
        assert!(latest.round_trip_time_ms.is_none());

        let score = audio_score(&history, LOCAL_AUDIO_DELAY_MS, &e_model);
        assert_eq!(score, score_audio(500.0, 0.0, LOCAL_AUDIO_DELAY_MS, &e_model));
        assert!(score < score_audio(0.0, 0.0, LOCAL_AUDIO_DELAY_MS, &e_model));
    }

    #[test]
    fn test_no_packets_scores_zero() {
        let e_model = EModelConfig::default();
        assert_eq!(audio_score(&interval(0, 0), LOCAL_AUDIO_DELAY_MS, &e_model), NO_AUDIO_SCORE);

        let single = History::from_entries(10, [StatSnapshot::new(0.0)]);
        assert_eq!(audio_score(&single, LOCAL_AUDIO_DELAY_MS, &e_model), NO_AUDIO_SCORE);

        let reset = History::from_entries(
            10,
            [
                StatSnapshot::new(0.0).with_audio(MediaCounters::new(5, 500, 0)),
                StatSnapshot::new(1000.0).with_audio(MediaCounters::new(0, 10, 0)),
            ],
        );
        assert_eq!(audio_score(&reset, LOCAL_AUDIO_DELAY_MS, &e_model), NO_AUDIO_SCORE);
    }
}
