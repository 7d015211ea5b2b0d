//! Polling loop driving a quality probe
//!
//! A probe owns one [`QualityState`] and runs as a single tokio task. On every
//! tick of a fixed-cadence interval it fetches one snapshot, feeds it through
//! the estimators and checks for a steady state. The fetch is awaited inside
//! the tick, so ticks and fetches never overlap and the state needs no lock.
//!
//! The probe ends in one of two ways:
//!
//! - the steady-state detector fires, producing a [`QualityReport`]
//! - the cancellation token is cancelled (for example on subscriber teardown)
//!
//! ```text
//!   Idle ──start()──▶ Sampling ──steady──▶ Terminated (report)
//!                        │  ▲
//!                        └──┘ tick
//!                        │
//!                        └────cancel────▶ Terminated (no report)
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use callprobe_quality_core::{
//!     ProbeConfig, ProbeOutcome, QualityProbe, SyntheticStatsSource, VideoDimensions,
//! };
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() -> callprobe_quality_core::Result<()> {
//! let probe = QualityProbe::new(
//!     ProbeConfig::default(),
//!     Arc::new(SyntheticStatsSource::default()),
//!     Arc::new(VideoDimensions::new(640, 480)),
//! )?;
//!
//! let handle = probe.start();
//! match handle.wait().await? {
//!     ProbeOutcome::Steady(report) => println!("{}", report),
//!     ProbeOutcome::Cancelled => println!("probe cancelled"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod observer;

pub use observer::ProbeObserver;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::report::QualityReport;
use crate::source::{StatsSource, StreamDescriptor};
use crate::state::QualityState;

/// How a probe run ended
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// The bitrate stabilized; carries the final report
    Steady(QualityReport),
    /// The probe was cancelled before reaching a steady state
    Cancelled,
}

impl ProbeOutcome {
    /// The report, if the probe reached a steady state
    pub fn report(&self) -> Option<&QualityReport> {
        match self {
            ProbeOutcome::Steady(report) => Some(report),
            ProbeOutcome::Cancelled => None,
        }
    }

    /// Whether the probe was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProbeOutcome::Cancelled)
    }
}

/// A configured, not yet started quality probe
pub struct QualityProbe {
    name: String,
    config: ProbeConfig,
    source: Arc<dyn StatsSource>,
    stream: Arc<dyn StreamDescriptor>,
    observer: Option<Arc<dyn ProbeObserver>>,
    cancel_token: CancellationToken,
}

impl QualityProbe {
    /// Create a probe, validating the configuration
    pub fn new(
        config: ProbeConfig,
        source: Arc<dyn StatsSource>,
        stream: Arc<dyn StreamDescriptor>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: "quality-probe".to_string(),
            config,
            source,
            stream,
            observer: None,
            cancel_token: CancellationToken::new(),
        })
    }

    /// Name used in log spans
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Attach an observer for per-tick stats and completion
    pub fn with_observer(mut self, observer: Arc<dyn ProbeObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Stop the probe when `token` is cancelled
    ///
    /// Pass the token the owning session cancels on subscriber teardown.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Spawn the polling task on the current tokio runtime
    ///
    /// The first tick fires one interval after the call.
    pub fn start(self) -> ProbeHandle {
        let cancel_token = self.cancel_token.clone();
        let span = info_span!("quality_probe", probe = %self.name);
        let task = tokio::spawn(self.run().instrument(span));
        ProbeHandle { cancel_token, task }
    }

    async fn run(self) -> ProbeOutcome {
        let QualityProbe {
            config,
            source,
            stream,
            observer,
            cancel_token,
            ..
        } = self;

        let mut state = QualityState::new(&config);
        state.start();

        let period = config.interval();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Quality probe started, sampling every {:?}", period);

        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                fetched = source.get_stats() => fetched,
            };

            let snapshot = match fetched {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => {
                    debug!("No statistics this tick, skipping");
                    continue;
                }
                Err(e) => {
                    warn!("Failed to fetch statistics: {}", e);
                    if let Some(observer) = &observer {
                        observer.on_stats(Some(&e), None).await;
                    }
                    continue;
                }
            };

            if let Some(observer) = &observer {
                observer.on_stats(None, Some(&snapshot)).await;
            }

            // teardown may have fired while the observer ran
            if cancel_token.is_cancelled() {
                break;
            }

            let tick = state.ingest(snapshot, stream.video_dimensions());
            if let Some(observer) = &observer {
                observer.on_tick(&tick).await;
            }
            if tick.steady {
                state.terminate();
                let report = state.report();
                info!(
                    "Steady state reached after {} snapshots: aggregate={:.3}, rating={}",
                    state.history().len(),
                    report.aggregate_score,
                    report.rating
                );
                if let Some(observer) = &observer {
                    observer.on_complete(&report).await;
                }
                return ProbeOutcome::Steady(report);
            }
        }

        state.terminate();
        info!("Quality probe cancelled after {} snapshots", state.history().len());
        ProbeOutcome::Cancelled
    }
}

/// Handle to a running probe
#[derive(Debug)]
pub struct ProbeHandle {
    cancel_token: CancellationToken,
    task: JoinHandle<ProbeOutcome>,
}

impl ProbeHandle {
    /// Stop the probe; no report is produced unless it already finished
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Token that stops the probe when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Whether the polling task has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the probe to end
    pub async fn wait(self) -> Result<ProbeOutcome> {
        self.task
            .await
            .map_err(|e| ProbeError::task_failed(e.to_string()))
    }
}
