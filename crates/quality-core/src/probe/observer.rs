//! Observer hooks for probe progress

use async_trait::async_trait;

use crate::error::ProbeError;
use crate::report::QualityReport;
use crate::state::TickOutcome;
use crate::stats::StatSnapshot;

/// Receives probe progress for logging or telemetry
///
/// Observers only watch; nothing they do feeds back into the probe state.
/// All methods default to no-ops.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use callprobe_quality_core::{ProbeError, ProbeObserver, QualityReport, StatSnapshot};
///
/// struct PrintObserver;
///
/// #[async_trait]
/// impl ProbeObserver for PrintObserver {
///     async fn on_stats(&self, error: Option<&ProbeError>, snapshot: Option<&StatSnapshot>) {
///         if let Some(error) = error {
///             println!("stats error: {}", error);
///         } else if let Some(snapshot) = snapshot {
///             println!("snapshot at {}ms", snapshot.timestamp_ms);
///         }
///     }
///
///     async fn on_complete(&self, report: &QualityReport) {
///         println!("probe finished: {}", report.rating);
///     }
/// }
/// ```
#[async_trait]
pub trait ProbeObserver: Send + Sync {
    /// Called for every tick that produced a snapshot (with `error == None`)
    /// and for every tick whose fetch failed (with `snapshot == None`)
    async fn on_stats(&self, _error: Option<&ProbeError>, _snapshot: Option<&StatSnapshot>) {}

    /// Called after every ingested snapshot with the scores it produced
    async fn on_tick(&self, _outcome: &TickOutcome) {}

    /// Called once when the probe reaches a steady state
    async fn on_complete(&self, _report: &QualityReport) {}
}
