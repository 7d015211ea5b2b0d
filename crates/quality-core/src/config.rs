//! Probe configuration
//!
//! Every constant that shapes a probe run lives here so that callers can
//! tune sampling cadence, memory bounds and the scoring models without
//! touching the estimators.
//!
//! # Usage
//!
//! ```rust
//! use callprobe_quality_core::config::ProbeConfig;
//! use std::time::Duration;
//!
//! let config = ProbeConfig::new()
//!     .with_interval(Duration::from_millis(500))
//!     .with_history_cap(120);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.interval(), Duration::from_millis(500));
//! ```
//!
//! Partial TOML documents fall back to defaults for missing keys:
//!
//! ```rust
//! use callprobe_quality_core::config::ProbeConfig;
//!
//! let config = ProbeConfig::from_toml_str("interval_ms = 250").unwrap();
//! assert_eq!(config.interval_ms, 250);
//! assert_eq!(config.history_cap, 1000);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

/// Default sampling interval in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Default cap on the snapshot history and on each score log
pub const DEFAULT_HISTORY_CAP: usize = 1000;

/// Bitrate below which video is considered unusable (bits per second)
pub const MIN_VIDEO_BITRATE: f64 = 30_000.0;

/// Local audio path delay added to the round-trip time (milliseconds)
pub const LOCAL_AUDIO_DELAY_MS: f64 = 20.0;

/// Number of trailing snapshots the steady-state detector inspects
pub const STEADY_STATE_WINDOW: usize = 5;

/// Maximum relative change between successive interval bitrates that still
/// counts as steady
pub const STEADY_STATE_TOLERANCE: f64 = 0.05;

/// Codec impairment coefficients of the simplified E-model
///
/// `Ie = a + b * ln(1 + c * packet_loss_ratio)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EModelConfig {
    /// Base equipment impairment
    pub a: f64,
    /// Loss sensitivity scale
    pub b: f64,
    /// Loss robustness factor
    pub c: f64,
}

impl Default for EModelConfig {
    fn default() -> Self {
        Self {
            a: 0.0,
            b: 19.8,
            c: 29.7,
        }
    }
}

/// Configuration for a quality probe run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Sampling interval in milliseconds
    pub interval_ms: u64,
    /// Maximum number of entries kept in the history and in each score log
    pub history_cap: usize,
    /// Minimum usable video bitrate in bits per second
    pub min_video_bitrate: f64,
    /// Local audio delay in milliseconds
    pub local_audio_delay_ms: f64,
    /// E-model codec coefficients
    pub e_model: EModelConfig,
    /// Trailing snapshot window used for steady-state detection
    pub steady_state_window: usize,
    /// Relative tolerance used for steady-state detection
    pub steady_state_tolerance: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            history_cap: DEFAULT_HISTORY_CAP,
            min_video_bitrate: MIN_VIDEO_BITRATE,
            local_audio_delay_ms: LOCAL_AUDIO_DELAY_MS,
            e_model: EModelConfig::default(),
            steady_state_window: STEADY_STATE_WINDOW,
            steady_state_tolerance: STEADY_STATE_TOLERANCE,
        }
    }
}

impl ProbeConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a TOML document
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the sampling interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the history and score log cap
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    /// Set the minimum usable video bitrate
    pub fn with_min_video_bitrate(mut self, bps: f64) -> Self {
        self.min_video_bitrate = bps;
        self
    }

    /// Set the local audio delay
    pub fn with_local_audio_delay_ms(mut self, delay_ms: f64) -> Self {
        self.local_audio_delay_ms = delay_ms;
        self
    }

    /// Set the E-model coefficients
    pub fn with_e_model(mut self, e_model: EModelConfig) -> Self {
        self.e_model = e_model;
        self
    }

    /// Set the steady-state window and tolerance
    pub fn with_steady_state(mut self, window: usize, tolerance: f64) -> Self {
        self.steady_state_window = window;
        self.steady_state_tolerance = tolerance;
        self
    }

    /// Sampling interval as a `Duration`
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Check the configuration for values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(ProbeError::invalid_config("interval_ms must be greater than zero"));
        }
        if self.history_cap < 2 {
            return Err(ProbeError::invalid_config(format!(
                "history_cap must be at least 2, got {}",
                self.history_cap
            )));
        }
        if self.steady_state_window < 2 || self.steady_state_window > self.history_cap {
            return Err(ProbeError::invalid_config(format!(
                "steady_state_window must be within 2..={}, got {}",
                self.history_cap, self.steady_state_window
            )));
        }
        if !self.min_video_bitrate.is_finite() || self.min_video_bitrate <= 0.0 {
            return Err(ProbeError::invalid_config(format!(
                "min_video_bitrate must be positive, got {}",
                self.min_video_bitrate
            )));
        }
        if !self.local_audio_delay_ms.is_finite() || self.local_audio_delay_ms < 0.0 {
            return Err(ProbeError::invalid_config(format!(
                "local_audio_delay_ms must not be negative, got {}",
                self.local_audio_delay_ms
            )));
        }
        if !(self.steady_state_tolerance > 0.0 && self.steady_state_tolerance < 1.0) {
            return Err(ProbeError::invalid_config(format!(
                "steady_state_tolerance must be within (0, 1), got {}",
                self.steady_state_tolerance
            )));
        }
        Ok(())
    }
}
