//! # Quality-Core: Call Quality Scoring Engine
//!
//! Estimates perceived call quality for a real-time audio/video session from
//! periodically sampled transport statistics, and decides when a running
//! probe has gathered enough signal to stop early.
//!
//! ## Components
//!
//! - **stats**: snapshot types, counter accessors and per-interval deltas
//! - **throughput**: bandwidth estimate over the snapshot history
//! - **steady_state**: trailing-window bitrate stability check
//! - **score**: video (bitrate vs. resolution target) and audio (E-model MOS) scores
//! - **state**: bounded history and score logs for one probe
//! - **probe**: the fixed-cadence polling loop with cancellation
//!
//! ```text
//! StatsSource ──snapshot──▶ QualityState ──▶ throughput / scores / steady?
//!      ▲                         │
//!      └────── tick ◀── probe ◀──┘──▶ QualityReport
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use callprobe_quality_core::{
//!     MediaCounters, ProbeConfig, QualityState, StatSnapshot, VideoDimensions,
//! };
//!
//! let mut state = QualityState::new(&ProbeConfig::default());
//! for n in 0..5u64 {
//!     let snapshot = StatSnapshot::new(n as f64 * 1000.0)
//!         .with_audio(MediaCounters::new(0, n * 50, n * 4_000))
//!         .with_video(MediaCounters::new(0, n * 100, n * 62_500));
//!     let tick = state.ingest(snapshot, Some(VideoDimensions::new(640, 480)));
//!     if tick.steady {
//!         println!("{}", state.report());
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod probe;
pub mod report;
pub mod score;
pub mod source;
pub mod state;
pub mod stats;
pub mod steady_state;
pub mod throughput;

pub use config::{EModelConfig, ProbeConfig};
pub use error::{ProbeError, Result};
pub use history::{BoundedLog, History, ScoreLog};
pub use probe::{ProbeHandle, ProbeObserver, ProbeOutcome, QualityProbe};
pub use report::QualityReport;
pub use score::{QualityRating, VideoDimensions};
pub use source::{StatsSource, StreamDescriptor, SyntheticStatsSource, SyntheticStreamConfig};
pub use state::{ProbePhase, QualityState, TickOutcome};
pub use stats::{MediaCounters, MediaKind, StatSnapshot};
pub use steady_state::{is_steady, SteadyStateDetector};
pub use throughput::{estimate_throughput, Throughput};

/// Version information for the quality engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
