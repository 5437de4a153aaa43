//! Handwriting analysis pipeline.
//!
//! decode → (recognition ‖ pixel metrics) → score → findings → result.
//!
//! Progress checkpoints: 10 after decoding, 10–70 while the engine runs,
//! 75 once metrics are in, 90 after scoring, 100 with the final result.
//! A failed run reports nothing further and returns no partial result.

use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, RecognitionError};
use crate::findings::{generate_findings, Finding};
use crate::input::{ImageSource, PixelBuffer};
use crate::metrics::{compute_metrics, ImageQualityMetrics};
use crate::ocr::{RecognitionAdapter, RecognitionSession, TesseractAdapter};
use crate::scoring::{self, ReadabilityLevel, RecognitionSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Receives overall completion percentages in [0, 100].
pub trait ProgressObserver: Send {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8) + Send> ProgressObserver for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// Discards progress.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// Forwards only values above the last one reported, capped at 100.
struct ProgressTracker<'a, P: ProgressObserver> {
    observer: &'a mut P,
    last: Option<u8>,
}

impl<'a, P: ProgressObserver> ProgressTracker<'a, P> {
    fn new(observer: &'a mut P) -> Self {
        Self {
            observer,
            last: None,
        }
    }

    fn report(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last.map_or(true, |last| percent > last) {
            self.last = Some(percent);
            self.observer.report(percent);
        }
    }
}

const DECODED: u8 = 10;
const RECOGNIZED: u8 = 70;
const MEASURED: u8 = 75;
const SCORED: u8 = 90;
const DONE: u8 = 100;

/// Map the engine's own [0, 1] progress into the 10–70 band.
fn recognition_percent(fraction: f64) -> u8 {
    let span = f64::from(RECOGNIZED - DECODED);
    DECODED + (fraction.clamp(0.0, 1.0) * span).round() as u8
}

/// Pixel pass on the blocking pool so a full-resolution scan does not stall
/// the engine future it is joined with.
async fn measure(buffer: Arc<PixelBuffer>) -> ImageQualityMetrics {
    match tokio::task::spawn_blocking(move || compute_metrics(&buffer)).await {
        Ok(metrics) => metrics,
        Err(e) => {
            log::warn!("[METRICS] Metrics task failed, using neutral values: {}", e);
            ImageQualityMetrics::neutral()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMetrics {
    pub ocr_confidence: f64,
    pub text_density: f64,
    pub contrast_score: f64,
    pub line_consistency: f64,
}

/// Everything known about one analysed sample. Plain data, safe to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// In [0, 1], two decimal places.
    pub readability_score: f64,
    pub level: ReadabilityLevel,
    pub confidence: f64,
    pub extracted_text: String,
    pub word_count: usize,
    pub line_count: usize,
    pub metrics: ScoreMetrics,
    pub findings: Vec<Finding>,
    /// Image metrics are neutral placeholders, not measurements.
    pub degraded: bool,
    pub image_digest: String,
    pub image_width: u32,
    pub image_height: u32,
    pub processing_ms: u64,
}

pub struct HandwritingAnalyzer<A> {
    adapter: A,
}

impl HandwritingAnalyzer<TesseractAdapter> {
    /// Analyzer backed by the Tesseract CLI.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, RecognitionError> {
        Ok(Self::new(TesseractAdapter::new(config.tesseract.clone())?))
    }
}

impl<A: RecognitionAdapter> HandwritingAnalyzer<A> {
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    /// Analyse one image.
    ///
    /// Recognition runs against a session acquired for this call only; the
    /// session is released before returning, on success or failure.
    pub async fn analyze<P: ProgressObserver>(
        &self,
        source: ImageSource,
        mut progress: P,
    ) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(&mut progress);

        let buffer = Arc::new(source.decode().map_err(|e| {
            log::warn!("[DECODE] {}", e);
            e
        })?);
        log::info!(
            "[DECODE] {}x{} image in {}ms",
            buffer.width(),
            buffer.height(),
            start.elapsed().as_millis()
        );
        tracker.report(DECODED);

        let mut session = self.adapter.acquire().await?;
        let (recognition, metrics) = {
            let mut forward = |fraction: f64| tracker.report(recognition_percent(fraction));
            tokio::join!(
                session.recognize(&buffer, &mut forward),
                measure(Arc::clone(&buffer))
            )
        };
        session.release().await;
        let recognition = recognition.map_err(|e| {
            log::warn!("[OCR] {}", e);
            e
        })?;
        let (image_width, image_height) = (buffer.width(), buffer.height());
        let image_digest = buffer.digest();
        drop(buffer);
        tracker.report(MEASURED);

        let summary = RecognitionSummary::from(&recognition);
        let readability_score = scoring::round_score(scoring::score(&summary, &metrics));
        let level = ReadabilityLevel::from_score(readability_score);
        log::info!(
            "[SCORE] {:.2} ({}) from confidence={:.2} words={} lines={}",
            readability_score,
            level.label(),
            summary.confidence,
            summary.word_count,
            summary.line_count
        );
        tracker.report(SCORED);

        let findings = generate_findings(readability_score, &summary, &metrics);

        let result = AnalysisResult {
            readability_score,
            level,
            confidence: recognition.confidence,
            extracted_text: recognition.text,
            word_count: summary.word_count,
            line_count: summary.line_count,
            metrics: ScoreMetrics {
                ocr_confidence: summary.confidence,
                text_density: metrics.text_density,
                contrast_score: metrics.contrast_score,
                line_consistency: metrics.line_consistency,
            },
            findings,
            degraded: metrics.degraded,
            image_digest,
            image_width,
            image_height,
            processing_ms: start.elapsed().as_millis() as u64,
        };
        tracker.report(DONE);
        log::info!("[ANALYZE] Complete in {}ms", result.processing_ms);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognition_progress_maps_into_band() {
        assert_eq!(recognition_percent(0.0), 10);
        assert_eq!(recognition_percent(0.5), 40);
        assert_eq!(recognition_percent(1.0), 70);
        assert_eq!(recognition_percent(7.0), 70);
        assert_eq!(recognition_percent(-1.0), 10);
    }

    #[test]
    fn tracker_never_goes_backwards() {
        let mut seen = Vec::new();
        let mut observer = |p: u8| seen.push(p);
        {
            let mut tracker = ProgressTracker::new(&mut observer);
            for p in [10, 10, 40, 30, 75, 250] {
                tracker.report(p);
            }
        }
        assert_eq!(seen, vec![10, 40, 75, 100]);
    }

    #[tokio::test]
    async fn measure_matches_direct_computation() {
        use image::{ImageBuffer, Rgba};

        let buffer = PixelBuffer::from_image(ImageBuffer::from_fn(40, 30, |x, y| {
            if y % 10 < 3 && x % 3 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        }));
        let expected = compute_metrics(&buffer);
        assert_eq!(measure(Arc::new(buffer)).await, expected);
    }

    #[tokio::test]
    async fn measure_empty_buffer_is_degraded() {
        let buffer = PixelBuffer::from_raw(0, 0, Vec::new()).unwrap();
        let metrics = measure(Arc::new(buffer)).await;
        assert!(metrics.degraded);
    }

    #[test]
    fn no_progress_accepts_anything() {
        let mut observer = NoProgress;
        observer.report(0);
        observer.report(100);
    }
}
