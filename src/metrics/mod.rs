//! Image quality domain — independent signals derived from raw pixels.
//!
//! External code should use `compute_metrics`; the individual signals in
//! `pixel` are public for callers that want one measurement on its own.

pub mod pixel;

use crate::input::PixelBuffer;
use serde::{Deserialize, Serialize};

pub use pixel::{compute_contrast, compute_line_consistency, compute_text_density};

/// Value substituted for every signal when the image has nothing to measure.
pub const NEUTRAL_METRIC: f64 = 0.5;

/// Normalized image-quality scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageQualityMetrics {
    pub contrast_score: f64,
    pub text_density: f64,
    pub line_consistency: f64,
    /// Set when the neutral fallback replaced real measurements.
    pub degraded: bool,
}

impl ImageQualityMetrics {
    pub fn neutral() -> Self {
        Self {
            contrast_score: NEUTRAL_METRIC,
            text_density: NEUTRAL_METRIC,
            line_consistency: NEUTRAL_METRIC,
            degraded: true,
        }
    }
}

/// Compute all three signals.
///
/// A zero-size buffer falls back to `ImageQualityMetrics::neutral()` rather
/// than failing: a less informative score beats no score.
pub fn compute_metrics(buffer: &PixelBuffer) -> ImageQualityMetrics {
    if buffer.is_empty() {
        log::warn!(
            "[METRICS] Empty {}x{} buffer, using neutral defaults",
            buffer.width(),
            buffer.height()
        );
        return ImageQualityMetrics::neutral();
    }

    let start = std::time::Instant::now();
    let metrics = ImageQualityMetrics {
        contrast_score: compute_contrast(buffer),
        text_density: compute_text_density(buffer),
        line_consistency: compute_line_consistency(buffer),
        degraded: false,
    };
    log::debug!(
        "[METRICS] contrast={:.3} density={:.3} lines={:.3} in {}ms",
        metrics.contrast_score,
        metrics.text_density,
        metrics.line_consistency,
        start.elapsed().as_millis()
    );
    metrics
}
