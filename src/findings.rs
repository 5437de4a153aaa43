//! Human-readable observations about a scored sample.
//!
//! Every rule is evaluated independently and fires in a fixed order:
//! score band, line spacing, ink density, character recognition, counts.
//! The result holds between one and five findings.

use crate::metrics::ImageQualityMetrics;
use crate::scoring::{ReadabilityLevel, RecognitionSummary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Positive,
    Warning,
    Concern,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub message: String,
}

impl Finding {
    fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub fn generate_findings(
    score: f64,
    recognition: &RecognitionSummary,
    metrics: &ImageQualityMetrics,
) -> Vec<Finding> {
    let mut findings = vec![band_finding(score)];

    if metrics.line_consistency >= 0.7 {
        findings.push(Finding::new(
            FindingKind::Positive,
            "Consistent line spacing and alignment",
        ));
    } else if metrics.line_consistency < 0.4 {
        findings.push(Finding::new(
            FindingKind::Warning,
            "Irregular line spacing detected; baselines vary noticeably",
        ));
    }

    if metrics.text_density >= 0.7 {
        findings.push(Finding::new(
            FindingKind::Positive,
            "Good letter spacing and formation",
        ));
    } else if metrics.text_density < 0.3 {
        findings.push(Finding::new(
            FindingKind::Info,
            "Sparse text detected; check that the image is framed around the writing",
        ));
    }

    if recognition.confidence >= 0.7 {
        findings.push(Finding::new(
            FindingKind::Positive,
            "Characters are well-formed and recognizable",
        ));
    } else if recognition.confidence < 0.4 {
        findings.push(Finding::new(
            FindingKind::Warning,
            "Some characters are difficult to recognize",
        ));
    }

    if recognition.word_count > 0 {
        findings.push(Finding::new(
            FindingKind::Info,
            format!(
                "Detected {} {} across {} {}",
                recognition.word_count,
                plural(recognition.word_count, "word", "words"),
                recognition.line_count,
                plural(recognition.line_count, "line", "lines"),
            ),
        ));
    }

    findings
}

fn band_finding(score: f64) -> Finding {
    match ReadabilityLevel::from_score(score) {
        ReadabilityLevel::Excellent => Finding::new(
            FindingKind::Positive,
            "Excellent handwriting clarity; text is highly readable",
        ),
        ReadabilityLevel::Good => Finding::new(
            FindingKind::Positive,
            "Good handwriting clarity; most text is easily readable",
        ),
        ReadabilityLevel::Moderate => Finding::new(
            FindingKind::Warning,
            "Moderate readability; some characters or words are unclear",
        ),
        ReadabilityLevel::Low => Finding::new(
            FindingKind::Concern,
            "Low readability; handwriting may be difficult to read",
        ),
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}
