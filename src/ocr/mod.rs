//! OCR domain — the recognition engine seen from the analyzer.
//!
//! The analyzer only depends on the shape of a recognition result: text,
//! per-word confidence, and line groupings. Engines plug in through
//! `RecognitionAdapter`, which hands out one session per analysis run.

pub mod tesseract;

pub use tesseract::TesseractAdapter;

use crate::error::RecognitionError;
use crate::input::PixelBuffer;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Axis-aligned box in pixel coordinates, origin top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest box covering both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        BoundingBox {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedWord {
    pub text: String,
    /// Engine certainty in [0, 1].
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedLine {
    pub text: String,
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

/// Output of one recognition pass over one image.
///
/// Built through `RecognitionResult::new` so the aggregate confidence and
/// word count always agree with `words`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    pub text: String,
    pub words: Vec<RecognizedWord>,
    pub lines: Vec<RecognizedLine>,
    /// Mean confidence of words with confidence > 0; 0 when there are none.
    pub confidence: f64,
}

impl RecognitionResult {
    pub fn new(text: &str, words: Vec<RecognizedWord>, lines: Vec<RecognizedLine>) -> Self {
        let valid: Vec<f64> = words
            .iter()
            .map(|w| w.confidence)
            .filter(|c| *c > 0.0)
            .collect();
        let confidence = if valid.is_empty() {
            0.0
        } else {
            (valid.iter().sum::<f64>() / valid.len() as f64).clamp(0.0, 1.0)
        };
        Self {
            text: text.trim().to_string(),
            words,
            lines,
            confidence,
        }
    }

    /// Nothing detected.
    pub fn empty() -> Self {
        Self::new("", Vec::new(), Vec::new())
    }

    /// Words that count toward the aggregate confidence.
    pub fn word_count(&self) -> usize {
        self.words.iter().filter(|w| w.confidence > 0.0).count()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// A recognition engine that can be checked out for one analysis run.
///
/// Sessions are never shared between runs. The pipeline releases the
/// session before it returns, whether recognition succeeded or not.
pub trait RecognitionAdapter: Send + Sync {
    type Session: RecognitionSession;

    fn acquire(&self) -> impl Future<Output = Result<Self::Session, RecognitionError>> + Send;
}

pub trait RecognitionSession: Send {
    /// Recognize text in `image`.
    ///
    /// `progress` receives the engine's own completion fraction in [0, 1].
    /// An image with no text yields an empty result, not an error.
    fn recognize(
        &mut self,
        image: &PixelBuffer,
        progress: &mut (dyn FnMut(f64) + Send),
    ) -> impl Future<Output = Result<RecognitionResult, RecognitionError>> + Send;

    /// Tear down whatever `acquire` set up.
    fn release(self) -> impl Future<Output = ()> + Send;
}
