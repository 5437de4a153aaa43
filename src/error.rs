//! Error types at the analysis boundary.
//!
//! Two kinds surface to callers: the input could not be decoded, or the
//! recognition engine failed. Either one aborts the whole run.

use thiserror::Error;

/// The input could not be turned into a pixel buffer.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a base64 image data URL")]
    InvalidDataUrl,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to read image file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),

    #[error("pixel buffer size mismatch: {width}x{height} needs {expected} bytes, got {actual}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// The recognition engine could not produce a result.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("failed to prepare recognition input: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode recognition input: {0}")]
    Encode(#[from] image::ImageError),

    #[error("recognition engine exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },

    #[error("recognition timed out after {0}s")]
    Timeout(u64),

    #[error("malformed recognition output: {0}")]
    MalformedOutput(String),
}

/// Failure of a full analysis run. No partial result accompanies it.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("recognition failed: {0}")]
    Recognition(#[from] RecognitionError),
}
