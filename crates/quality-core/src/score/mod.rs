//! Per-interval quality scores
//!
//! - [`video`] maps the received video bitrate against a resolution-derived
//!   target onto a 1 to 5 scale.
//! - [`audio`] maps round-trip delay and packet loss onto a MOS value through
//!   a simplified E-model.
//!
//! Both return 0 when an interval carries nothing to score.

pub mod audio;
pub mod video;

pub use audio::{audio_score, mos_from_r, r_factor, score_audio};
pub use video::{score_bitrate, target_bitrate, video_score};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoDimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl VideoDimensions {
    /// Create new dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels per frame
    pub fn pixel_count(&self) -> f64 {
        self.width as f64 * self.height as f64
    }
}

impl fmt::Display for VideoDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Coarse quality band for a MOS value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityRating {
    /// Nothing usable was received
    Bad,
    /// Many users dissatisfied
    Poor,
    /// Some users dissatisfied
    Fair,
    /// Users satisfied
    Good,
    /// Very satisfied
    Excellent,
}

impl QualityRating {
    /// Classify a MOS value
    pub fn from_mos_score(mos: f64) -> Self {
        match mos {
            mos if mos >= 4.3 => Self::Excellent,
            mos if mos >= 4.0 => Self::Good,
            mos if mos >= 3.6 => Self::Fair,
            mos if mos >= 3.1 => Self::Poor,
            _ => Self::Bad,
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Bad => "bad",
        }
    }
}

impl fmt::Display for QualityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_count() {
        assert_eq!(VideoDimensions::new(640, 480).pixel_count(), 307_200.0);
        assert_eq!(VideoDimensions::new(0, 720).pixel_count(), 0.0);
        assert_eq!(VideoDimensions::new(1280, 720).to_string(), "1280x720");
    }

    #[test]
    fn test_rating_from_mos() {
        assert_eq!(QualityRating::from_mos_score(4.43), QualityRating::Excellent);
        assert_eq!(QualityRating::from_mos_score(4.1), QualityRating::Good);
        assert_eq!(QualityRating::from_mos_score(3.8), QualityRating::Fair);
        assert_eq!(QualityRating::from_mos_score(3.2), QualityRating::Poor);
        assert_eq!(QualityRating::from_mos_score(0.0), QualityRating::Bad);
        assert_eq!(QualityRating::from_mos_score(f64::NAN), QualityRating::Bad);
        assert!(QualityRating::Excellent > QualityRating::Poor);
    }
}
