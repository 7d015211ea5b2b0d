//! Quality state for one probe run
//!
//! Holds the snapshot history, one score log per media kind and the latest
//! throughput estimate. The polling loop is the only writer; everything that
//! reads the state goes through pure functions of the history.

use tracing::debug;

use crate::config::{EModelConfig, ProbeConfig};
use crate::history::{History, ScoreLog};
use crate::report::QualityReport;
use crate::score::{audio_score, video_score, QualityRating, VideoDimensions};
use crate::stats::{MediaKind, StatSnapshot};
use crate::steady_state::SteadyStateDetector;
use crate::throughput::{estimate_throughput, Throughput};

/// Lifecycle phase of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    /// Constructed, not sampling yet
    Idle,
    /// Sampling on every tick
    Sampling,
    /// Finished, either steady or cancelled; no further mutation
    Terminated,
}

/// What a single ingested snapshot produced
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutcome {
    /// Audio score appended this tick
    pub audio_score: Option<f64>,
    /// Video score appended this tick
    pub video_score: Option<f64>,
    /// Whether the steady-state detector fired
    pub steady: bool,
}

/// Mutable state of a quality probe
#[derive(Debug, Clone)]
pub struct QualityState {
    history: History,
    audio_scores: ScoreLog,
    video_scores: ScoreLog,
    throughput: Option<Throughput>,
    detector: SteadyStateDetector,
    min_video_bitrate: f64,
    local_audio_delay_ms: f64,
    e_model: EModelConfig,
    phase: ProbePhase,
}

impl QualityState {
    /// Create an idle state with empty logs
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            history: History::new(config.history_cap),
            audio_scores: ScoreLog::new(config.history_cap),
            video_scores: ScoreLog::new(config.history_cap),
            throughput: None,
            detector: SteadyStateDetector::new(config.steady_state_window, config.steady_state_tolerance),
            min_video_bitrate: config.min_video_bitrate,
            local_audio_delay_ms: config.local_audio_delay_ms,
            e_model: config.e_model,
            phase: ProbePhase::Idle,
        }
    }

    /// Enter the sampling phase; a terminated state stays terminated
    pub fn start(&mut self) {
        if self.phase == ProbePhase::Idle {
            self.phase = ProbePhase::Sampling;
        }
    }

    /// Stop accepting snapshots
    pub fn terminate(&mut self) {
        self.phase = ProbePhase::Terminated;
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ProbePhase {
        self.phase
    }

    /// Whether the state no longer accepts snapshots
    pub fn is_terminated(&self) -> bool {
        self.phase == ProbePhase::Terminated
    }

    /// Snapshot history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Score log for one media kind
    pub fn scores(&self, kind: MediaKind) -> &ScoreLog {
        match kind {
            MediaKind::Audio => &self.audio_scores,
            MediaKind::Video => &self.video_scores,
        }
    }

    /// Latest throughput estimate
    pub fn throughput(&self) -> Option<Throughput> {
        self.throughput
    }

    /// `min(sum(audio scores), sum(video scores))`
    pub fn aggregate_score(&self) -> f64 {
        self.audio_scores.sum().min(self.video_scores.sum())
    }

    /// Feed one snapshot through the calculators
    ///
    /// The snapshot is appended to the history. Once two snapshots exist the
    /// throughput is recomputed, one score per media kind is appended, and
    /// the steady-state detector is evaluated. Snapshots arriving after
    /// termination are ignored.
    pub fn ingest(&mut self, snapshot: StatSnapshot, dimensions: Option<VideoDimensions>) -> TickOutcome {
        if self.phase == ProbePhase::Terminated {
            debug!("Ignoring snapshot at {}ms, probe already terminated", snapshot.timestamp_ms);
            return TickOutcome::default();
        }
        self.phase = ProbePhase::Sampling;

        self.history.push(snapshot);
        if self.history.len() < 2 {
            return TickOutcome::default();
        }

        self.throughput = estimate_throughput(&self.history);

        let video = video_score(&self.history, dimensions, self.min_video_bitrate);
        let audio = audio_score(&self.history, self.local_audio_delay_ms, &self.e_model);
        self.video_scores.push(video);
        self.audio_scores.push(audio);

        let steady = self.detector.is_steady(&self.history);
        debug!(
            "Tick: {} snapshots, audio={:.3}, video={:.3}, throughput={:?}, steady={}",
            self.history.len(),
            audio,
            video,
            self.throughput.map(|t| t.bits_per_second),
            steady
        );

        TickOutcome {
            audio_score: Some(audio),
            video_score: Some(video),
            steady,
        }
    }

    /// Build a report from the current logs
    pub fn report(&self) -> QualityReport {
        let audio_mean_score = self.audio_scores.mean();
        let video_mean_score = self.video_scores.mean();
        QualityReport {
            aggregate_score: self.aggregate_score(),
            audio_score_sum: self.audio_scores.sum(),
            video_score_sum: self.video_scores.sum(),
            audio_mean_score,
            video_mean_score,
            scored_intervals: self.video_scores.len(),
            throughput: self.throughput,
            rating: QualityRating::from_mos_score(audio_mean_score.min(video_mean_score)),
        }
    }
}
