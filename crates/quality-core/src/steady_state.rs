//! Steady-state detection
//!
//! A probe can stop early once the received bitrate stops moving. The
//! detector looks at the newest `window` snapshots, computes the combined
//! audio + video bitrate of every interval between them, and reports a steady
//! state when each interval is within `tolerance` (relative) of the one
//! before it.
//!
//! A window that contains a zero-length interval, a counter reset, or no
//! traffic at all is never steady.

use tracing::trace;

use crate::config::{STEADY_STATE_TOLERANCE, STEADY_STATE_WINDOW};
use crate::history::History;
use crate::stats::{bitrate_delta, MediaKind, StatSnapshot};

/// Trailing-window bitrate stability check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteadyStateDetector {
    window: usize,
    tolerance: f64,
}

impl Default for SteadyStateDetector {
    fn default() -> Self {
        Self::new(STEADY_STATE_WINDOW, STEADY_STATE_TOLERANCE)
    }
}

impl SteadyStateDetector {
    /// Create a detector over `window` snapshots with a relative `tolerance`
    ///
    /// The window is raised to two snapshots if smaller, since a single
    /// snapshot has no interval to inspect.
    pub fn new(window: usize, tolerance: f64) -> Self {
        Self {
            window: window.max(2),
            tolerance,
        }
    }

    /// Number of snapshots inspected
    pub fn window(&self) -> usize {
        self.window
    }

    /// Maximum relative change between successive intervals
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Whether the trailing bitrate has stabilized
    pub fn is_steady(&self, history: &History) -> bool {
        if history.len() < self.window {
            return false;
        }

        let snapshots: Vec<&StatSnapshot> = history.tail(self.window).collect();
        let mut rates = Vec::with_capacity(self.window - 1);
        for pair in snapshots.windows(2) {
            match interval_bitrate(pair[1], pair[0]) {
                Some(rate) if rate >= 0.0 => rates.push(rate),
                _ => return false,
            }
        }

        if rates.iter().all(|rate| *rate == 0.0) {
            return false;
        }

        let steady = rates.windows(2).all(|pair| {
            let (previous, current) = (pair[0], pair[1]);
            (current - previous).abs() <= self.tolerance * previous.max(current)
        });
        trace!("Steady-state check over {} intervals: {:?} -> {}", rates.len(), rates, steady);
        steady
    }
}

fn interval_bitrate(current: &StatSnapshot, previous: &StatSnapshot) -> Option<f64> {
    let audio = bitrate_delta(MediaKind::Audio, current, previous)?;
    let video = bitrate_delta(MediaKind::Video, current, previous)?;
    Some(audio + video)
}

/// Check the history with the default window and tolerance
pub fn is_steady(history: &History) -> bool {
    SteadyStateDetector::default().is_steady(history)
}
