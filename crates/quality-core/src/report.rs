//! Final probe report

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::score::QualityRating;
use crate::throughput::Throughput;

/// Outcome of a probe that reached a steady state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// `min(sum(audio scores), sum(video scores))`
    pub aggregate_score: f64,
    /// Sum of the per-interval audio scores
    pub audio_score_sum: f64,
    /// Sum of the per-interval video scores
    pub video_score_sum: f64,
    /// Mean per-interval audio score
    pub audio_mean_score: f64,
    /// Mean per-interval video score
    pub video_mean_score: f64,
    /// Number of scored intervals retained
    pub scored_intervals: usize,
    /// Latest bandwidth estimate
    pub throughput: Option<Throughput>,
    /// Quality band of the weaker media kind
    pub rating: QualityRating,
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Quality:     {}", self.rating)?;
        writeln!(f, "Aggregate:   {:.3}", self.aggregate_score)?;
        writeln!(
            f,
            "Audio:       {:.3} mean over {} intervals (sum {:.3})",
            self.audio_mean_score, self.scored_intervals, self.audio_score_sum
        )?;
        writeln!(
            f,
            "Video:       {:.3} mean over {} intervals (sum {:.3})",
            self.video_mean_score, self.scored_intervals, self.video_score_sum
        )?;
        match &self.throughput {
            Some(t) => write!(
                f,
                "Throughput:  {:.0} bps (audio {:.0} bps, {:.2}% loss / video {:.0} bps, {:.2}% loss)",
                t.bits_per_second,
                t.audio_bps,
                t.audio_packet_loss_ratio * 100.0,
                t.video_bps,
                t.video_packet_loss_ratio * 100.0
            ),
            None => write!(f, "Throughput:  unavailable"),
        }
    }
}
