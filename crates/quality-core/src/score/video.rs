//! Video quality estimation from received bitrate
//!
//! The achieved bitrate is mapped log-linearly from `[min_bitrate, target]`
//! onto `[1, 5]`, where the target comes from an empirical curve of the
//! bitrate a stream of a given resolution needs at 30 fps.

use tracing::trace;

use super::VideoDimensions;
use crate::history::History;
use crate::stats::{bitrate_delta, MediaKind};

/// Score for a stream below the usable threshold or without data
pub const NO_VIDEO_SCORE: f64 = 0.0;

/// Best achievable video score
pub const MAX_VIDEO_SCORE: f64 = 5.0;

/// Bitrate (bits per second) a stream of `pixel_count` pixels needs at 30 fps
pub fn target_bitrate(pixel_count: f64) -> f64 {
    10f64.powf(2.069924867 * pixel_count.log10().powf(0.6250223771))
}

/// Score an achieved bitrate for a stream of `pixel_count` pixels
///
/// Returns 0 for bitrates under `min_bitrate`, for non-positive pixel counts,
/// and for streams so small that their target does not exceed `min_bitrate`.
pub fn score_bitrate(bitrate: f64, pixel_count: f64, min_bitrate: f64) -> f64 {
    if !bitrate.is_finite() || !(pixel_count > 0.0) || bitrate < min_bitrate {
        return NO_VIDEO_SCORE;
    }

    let target = target_bitrate(pixel_count);
    if !target.is_finite() || target <= min_bitrate {
        return NO_VIDEO_SCORE;
    }

    let bitrate = bitrate.min(target);
    4.0 * (bitrate / min_bitrate).ln() / (target / min_bitrate).ln() + 1.0
}

/// Score the most recent interval of the history
///
/// `dimensions` is the size of the active video stream, `None` when the
/// subscriber has no stream.
pub fn video_score(history: &History, dimensions: Option<VideoDimensions>, min_bitrate: f64) -> f64 {
    let Some(dimensions) = dimensions else {
        return NO_VIDEO_SCORE;
    };
    let Some((previous, current)) = history.last_pair() else {
        return NO_VIDEO_SCORE;
    };
    let Some(bitrate) = bitrate_delta(MediaKind::Video, current, previous) else {
        return NO_VIDEO_SCORE;
    };

    let score = score_bitrate(bitrate, dimensions.pixel_count(), min_bitrate);
    trace!(
        "Video score {:.3} for {} bps at {}x{}",
        score, bitrate, dimensions.width, dimensions.height
    );
    score
}
