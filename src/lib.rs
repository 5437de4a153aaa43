//! Legible — handwriting readability analysis.
//!
//! Scores how legible a handwriting sample is by blending text-recognition
//! confidence with pixel-level image quality signals, and explains the
//! score with a short list of categorized findings.
//!
//! Domains:
//!   - input.rs     — image sources and RGBA pixel buffers
//!   - metrics/     — contrast, ink density, line spacing consistency
//!   - ocr/         — recognition result model + engine adapters (Tesseract)
//!   - scoring.rs   — weighted readability score and level bands
//!   - findings.rs  — rule cascade producing human-readable observations
//!   - pipeline.rs  — orchestration, progress reporting, final result
//!
//! The library logs through the `log` facade and never installs a logger.

pub mod config;
pub mod error;
pub mod findings;
pub mod input;
pub mod metrics;
pub mod ocr;
pub mod pipeline;
pub mod scoring;

pub use config::{load_config, AnalyzerConfig, TesseractConfig};
pub use error::{AnalysisError, DecodeError, RecognitionError};
pub use findings::{generate_findings, Finding, FindingKind};
pub use input::{ImageSource, PixelBuffer};
pub use metrics::{compute_metrics, ImageQualityMetrics};
pub use ocr::{
    BoundingBox, RecognitionAdapter, RecognitionResult, RecognitionSession, RecognizedLine,
    RecognizedWord, TesseractAdapter,
};
pub use pipeline::{
    AnalysisResult, HandwritingAnalyzer, NoProgress, ProgressObserver, ScoreMetrics,
};
pub use scoring::{ReadabilityLevel, RecognitionSummary};
