//! Readability scoring — blends recognition confidence with image quality.
//!
//! Recognition confidence dominates as the most direct legibility proxy.
//! Line consistency outweighs contrast and density because uneven
//! baselines say more about motor control than raw image quality does.

use crate::metrics::ImageQualityMetrics;
use serde::{Deserialize, Serialize};

pub const WEIGHT_CONFIDENCE: f64 = 0.40;
pub const WEIGHT_DENSITY: f64 = 0.15;
pub const WEIGHT_CONTRAST: f64 = 0.20;
pub const WEIGHT_LINES: f64 = 0.25;

/// Added when any text at all was recognized.
pub const DETECTED_TEXT_BONUS: f64 = 0.05;

/// Applied when recognition found almost nothing, or nothing reliable.
pub const UNRELIABLE_PENALTY: f64 = 0.7;

/// The recognition figures the scorer needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognitionSummary {
    pub confidence: f64,
    pub word_count: usize,
    pub line_count: usize,
}

impl From<&crate::ocr::RecognitionResult> for RecognitionSummary {
    fn from(result: &crate::ocr::RecognitionResult) -> Self {
        Self {
            confidence: result.confidence,
            word_count: result.word_count(),
            line_count: result.line_count(),
        }
    }
}

/// Weighted sum of the four signals, before adjustments.
pub fn weighted_sum(confidence: f64, metrics: &ImageQualityMetrics) -> f64 {
    confidence * WEIGHT_CONFIDENCE
        + metrics.text_density * WEIGHT_DENSITY
        + metrics.contrast_score * WEIGHT_CONTRAST
        + metrics.line_consistency * WEIGHT_LINES
}

/// Readability in [0, 1], unrounded.
///
/// The bonus and the penalty are applied in that order and can both fire
/// (1–2 words with confidence under 0.5).
pub fn score(recognition: &RecognitionSummary, metrics: &ImageQualityMetrics) -> f64 {
    let mut score = weighted_sum(recognition.confidence, metrics);

    if recognition.word_count > 0 {
        score = (score + DETECTED_TEXT_BONUS).min(1.0);
    }
    if recognition.word_count < 3 && recognition.confidence < 0.5 {
        score *= UNRELIABLE_PENALTY;
    }

    score.clamp(0.0, 1.0)
}

/// Round to two decimal places, as reported to callers.
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

/// Readability band, shared by the result label and the headline finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadabilityLevel {
    Excellent,
    Good,
    Moderate,
    Low,
}

impl ReadabilityLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ReadabilityLevel::Excellent
        } else if score >= 0.6 {
            ReadabilityLevel::Good
        } else if score >= 0.4 {
            ReadabilityLevel::Moderate
        } else {
            ReadabilityLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadabilityLevel::Excellent => "Excellent",
            ReadabilityLevel::Good => "Good",
            ReadabilityLevel::Moderate => "Moderate",
            ReadabilityLevel::Low => "Low",
        }
    }
}
