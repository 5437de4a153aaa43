//! Integration tests for the full analysis pipeline.
//!
//! Uses a scripted recognition adapter so the pipeline can be exercised
//! without an OCR engine installed: decode → recognize ‖ metrics → score →
//! findings → result.

use image::{ImageBuffer, Rgba, RgbaImage};
use legible::{
    AnalysisError, BoundingBox, FindingKind, HandwritingAnalyzer, ImageSource, NoProgress,
    PixelBuffer, ReadabilityLevel, RecognitionAdapter, RecognitionError, RecognitionResult,
    RecognitionSession, RecognizedLine, RecognizedWord,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Adapter that hands back a fixed result (or failure) and counts sessions.
#[derive(Clone)]
struct ScriptedAdapter {
    outcome: Result<RecognitionResult, String>,
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl ScriptedAdapter {
    fn new(outcome: Result<RecognitionResult, String>) -> Self {
        Self {
            outcome,
            acquired: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }
}

struct ScriptedSession {
    outcome: Result<RecognitionResult, String>,
    released: Arc<AtomicUsize>,
}

impl RecognitionAdapter for ScriptedAdapter {
    type Session = ScriptedSession;

    async fn acquire(&self) -> Result<ScriptedSession, RecognitionError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSession {
            outcome: self.outcome.clone(),
            released: Arc::clone(&self.released),
        })
    }
}

impl RecognitionSession for ScriptedSession {
    async fn recognize(
        &mut self,
        _image: &PixelBuffer,
        progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<RecognitionResult, RecognitionError> {
        progress(0.0);
        tokio::task::yield_now().await;
        progress(0.5);
        match &self.outcome {
            Ok(result) => {
                progress(1.0);
                Ok(result.clone())
            }
            Err(msg) => Err(RecognitionError::EngineUnavailable(msg.clone())),
        }
    }

    async fn release(self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// 100x160 white page with four evenly spaced 12-row lines of striped ink.
/// Ink covers half of each line row, 15% of the page overall.
fn clean_sample() -> PixelBuffer {
    let line_starts = [10u32, 50, 90, 130];
    let img: RgbaImage = ImageBuffer::from_fn(100, 160, |x, y| {
        let in_line = line_starts.iter().any(|s| y >= *s && y < s + 12);
        if in_line && (x / 2) % 2 == 0 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    PixelBuffer::from_image(img)
}

/// 20 words at confidence 0.9, five per line.
fn confident_recognition() -> RecognitionResult {
    let mut words = Vec::new();
    let mut lines = Vec::new();
    for line in 0..4u32 {
        let y = 10 + line * 40;
        let mut line_words = Vec::new();
        for i in 0..5u32 {
            let word = RecognizedWord {
                text: format!("word{}", line * 5 + i),
                confidence: 0.9,
                bounding_box: BoundingBox { x: i * 20, y, width: 16, height: 12 },
            };
            line_words.push(word.text.clone());
            words.push(word);
        }
        lines.push(RecognizedLine {
            text: line_words.join(" "),
            confidence: 0.9,
            bounding_box: BoundingBox { x: 0, y, width: 96, height: 12 },
        });
    }
    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    RecognitionResult::new(&text, words, lines)
}

#[tokio::test]
async fn clean_sample_scores_excellent() {
    init_logging();
    let analyzer = HandwritingAnalyzer::new(ScriptedAdapter::new(Ok(confident_recognition())));

    let result = analyzer
        .analyze(ImageSource::Pixels(clean_sample()), NoProgress)
        .await
        .expect("analysis failed");

    assert!(result.readability_score >= 0.8, "score {}", result.readability_score);
    // 0.4*0.9 + 0.15*0.8 + 0.2*1.0 + 0.25*1.0 + 0.05
    assert_eq!(result.readability_score, 0.98);
    assert_eq!(result.level, ReadabilityLevel::Excellent);
    assert_eq!(result.findings[0].kind, FindingKind::Positive);
    assert!(result.findings[0].message.starts_with("Excellent"));
    assert_eq!(result.findings.len(), 5);

    assert_eq!(result.word_count, 20);
    assert_eq!(result.line_count, 4);
    assert!((result.confidence - 0.9).abs() < 1e-9);
    assert!((result.metrics.contrast_score - 1.0).abs() < 1e-9);
    assert!((result.metrics.text_density - 0.8).abs() < 1e-9);
    assert!((result.metrics.line_consistency - 1.0).abs() < 1e-9);
    assert!(!result.degraded);
    assert_eq!((result.image_width, result.image_height), (100, 160));
    assert_eq!(result.image_digest, clean_sample().digest());
    assert!(result.extracted_text.starts_with("word0 word1"));
}

#[tokio::test]
async fn progress_is_monotonic_and_ends_at_100() {
    let analyzer = HandwritingAnalyzer::new(ScriptedAdapter::new(Ok(confident_recognition())));
    let mut seen: Vec<u8> = Vec::new();

    analyzer
        .analyze(ImageSource::Pixels(clean_sample()), |p: u8| seen.push(p))
        .await
        .expect("analysis failed");

    assert_eq!(seen.first(), Some(&10));
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", seen);
    for checkpoint in [40, 70, 75, 90] {
        assert!(seen.contains(&checkpoint), "missing {} in {:?}", checkpoint, seen);
    }
}

#[tokio::test]
async fn recognition_failure_aborts_and_releases_session() {
    init_logging();
    let adapter = ScriptedAdapter::new(Err("engine crashed".to_string()));
    let released = Arc::clone(&adapter.released);
    let analyzer = HandwritingAnalyzer::new(adapter);
    let mut seen: Vec<u8> = Vec::new();

    let err = analyzer
        .analyze(ImageSource::Pixels(clean_sample()), |p: u8| seen.push(p))
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Recognition(_)));
    assert!(err.to_string().contains("engine crashed"));
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert!(!seen.contains(&100), "{:?}", seen);
    assert!(seen.iter().all(|p| *p <= 70), "{:?}", seen);
}

#[tokio::test]
async fn undecodable_input_fails_before_recognition() {
    let adapter = ScriptedAdapter::new(Ok(confident_recognition()));
    let acquired = Arc::clone(&adapter.acquired);
    let analyzer = HandwritingAnalyzer::new(adapter);
    let mut seen: Vec<u8> = Vec::new();

    let err = analyzer
        .analyze(ImageSource::Bytes(b"not an image".to_vec()), |p: u8| seen.push(p))
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Decode(_)));
    assert!(seen.is_empty());
    assert_eq!(acquired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_image_falls_back_to_neutral_metrics() {
    let analyzer = HandwritingAnalyzer::new(ScriptedAdapter::new(Ok(RecognitionResult::empty())));
    let buffer = PixelBuffer::from_raw(0, 0, Vec::new()).unwrap();

    let result = analyzer
        .analyze(ImageSource::Pixels(buffer), NoProgress)
        .await
        .expect("degenerate image should still produce a result");

    assert!(result.degraded);
    assert_eq!(result.metrics.contrast_score, 0.5);
    // (0.15 + 0.2 + 0.25) * 0.5 = 0.3, no words, low confidence → * 0.7
    assert_eq!(result.readability_score, 0.21);
    assert_eq!(result.level, ReadabilityLevel::Low);
    assert_eq!(result.word_count, 0);
    assert_eq!(result.findings[0].kind, FindingKind::Concern);
}

#[tokio::test]
async fn encoded_upload_matches_pixel_input() {
    use base64::Engine as _;

    let png = clean_sample().encode_png().unwrap();
    let url = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&png)
    );
    let analyzer = HandwritingAnalyzer::new(ScriptedAdapter::new(Ok(confident_recognition())));

    let from_url = analyzer
        .analyze(ImageSource::DataUrl(url), NoProgress)
        .await
        .unwrap();
    let from_bytes = analyzer
        .analyze(ImageSource::Bytes(png), NoProgress)
        .await
        .unwrap();

    assert_eq!(from_url.readability_score, 0.98);
    assert_eq!(from_url.image_digest, from_bytes.image_digest);
    assert_eq!(from_url.metrics, from_bytes.metrics);
}

#[tokio::test]
async fn independent_runs_do_not_share_state() {
    let adapter = ScriptedAdapter::new(Ok(confident_recognition()));
    let released = Arc::clone(&adapter.released);
    let analyzer = HandwritingAnalyzer::new(adapter);

    let blank = PixelBuffer::from_image(ImageBuffer::from_pixel(50, 50, Rgba([255, 255, 255, 255])));
    let (clean, plain) = tokio::join!(
        analyzer.analyze(ImageSource::Pixels(clean_sample()), NoProgress),
        analyzer.analyze(ImageSource::Pixels(blank), NoProgress),
    );
    let (clean, plain) = (clean.unwrap(), plain.unwrap());

    assert_eq!(released.load(Ordering::SeqCst), 2);
    assert_eq!(clean.metrics.contrast_score, 1.0);
    assert_eq!(plain.metrics.contrast_score, 0.0);
    assert_ne!(clean.image_digest, plain.image_digest);
    assert!(plain.readability_score < clean.readability_score);
}

#[tokio::test]
async fn result_serializes_for_persistence() {
    let analyzer = HandwritingAnalyzer::new(ScriptedAdapter::new(Ok(confident_recognition())));
    let result = analyzer
        .analyze(ImageSource::Pixels(clean_sample()), NoProgress)
        .await
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["readabilityScore"], 0.98);
    assert_eq!(json["level"], "excellent");
    assert_eq!(json["wordCount"], 20);
    let ocr_confidence = json["metrics"]["ocrConfidence"].as_f64().unwrap();
    assert!((ocr_confidence - 0.9).abs() < 1e-9);
    assert_eq!(json["findings"][0]["type"], "positive");
    assert_eq!(json["degraded"], false);

    let back: legible::AnalysisResult = serde_json::from_value(json).unwrap();
    assert_eq!(back.level, result.level);
    assert_eq!(back.findings, result.findings);
    assert_eq!(back.extracted_text, result.extracted_text);
}
