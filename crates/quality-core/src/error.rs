//! Error handling for the quality engine
//!
//! Missing data is never an error here: absent snapshots, absent streams and
//! degenerate intervals are resolved by the calculators themselves. The types
//! below cover what is left over, namely bad configuration and failures
//! reported by the statistics source.

use thiserror::Error;

/// Result type alias for quality engine operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Error type for quality engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// Invalid probe configuration
    #[error("Invalid probe configuration: {details}")]
    InvalidConfig { details: String },

    /// Configuration document could not be parsed
    #[error("Failed to parse probe configuration: {reason}")]
    ConfigParse { reason: String },

    /// The statistics source failed to produce a report
    #[error("Statistics unavailable: {reason}")]
    StatsUnavailable { reason: String },

    /// The probe task ended without producing an outcome
    #[error("Probe task failed: {reason}")]
    TaskFailed { reason: String },
}

impl ProbeError {
    /// Create a new invalid configuration error
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig {
            details: details.into(),
        }
    }

    /// Create a new configuration parse error
    pub fn config_parse(reason: impl Into<String>) -> Self {
        Self::ConfigParse {
            reason: reason.into(),
        }
    }

    /// Create a new statistics fetch error
    pub fn stats_unavailable(reason: impl Into<String>) -> Self {
        Self::StatsUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a new task failure error
    pub fn task_failed(reason: impl Into<String>) -> Self {
        Self::TaskFailed {
            reason: reason.into(),
        }
    }

    /// Whether the probe can keep running after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StatsUnavailable { .. })
    }
}

impl From<toml::de::Error> for ProbeError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_parse(err.to_string())
    }
}
