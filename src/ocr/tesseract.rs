//! Tesseract CLI recognition adapter.
//!
//! Runs `tesseract <png> stdout ... tsv` as a child process and parses the
//! word-level TSV it prints. Each session owns a private temp directory for
//! the input PNG; releasing the session removes it.

use super::{
    BoundingBox, RecognitionAdapter, RecognitionResult, RecognitionSession, RecognizedLine,
    RecognizedWord,
};
use crate::config::TesseractConfig;
use crate::error::RecognitionError;
use crate::input::PixelBuffer;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// TSV `level` value for a single word.
const WORD_LEVEL: i32 = 5;

pub struct TesseractAdapter {
    binary: PathBuf,
    config: TesseractConfig,
}

impl TesseractAdapter {
    /// Resolve the engine binary up front so a missing install fails fast.
    pub fn new(config: TesseractConfig) -> Result<Self, RecognitionError> {
        let binary = resolve_binary(&config)?;
        log::info!("[OCR] Using tesseract at {}", binary.display());
        Ok(Self { binary, config })
    }
}

fn resolve_binary(config: &TesseractConfig) -> Result<PathBuf, RecognitionError> {
    match &config.binary {
        Some(path) if path.is_file() => Ok(path.clone()),
        Some(path) => Err(RecognitionError::EngineUnavailable(format!(
            "configured binary {} does not exist",
            path.display()
        ))),
        None => which::which("tesseract").map_err(|e| {
            RecognitionError::EngineUnavailable(format!("tesseract not found on PATH: {}", e))
        }),
    }
}

impl RecognitionAdapter for TesseractAdapter {
    type Session = TesseractSession;

    async fn acquire(&self) -> Result<TesseractSession, RecognitionError> {
        let workdir = tempfile::Builder::new().prefix("legible-ocr-").tempdir()?;
        log::debug!("[OCR] Session workspace {}", workdir.path().display());
        Ok(TesseractSession {
            binary: self.binary.clone(),
            config: self.config.clone(),
            workdir,
        })
    }
}

/// One checked-out engine run.
pub struct TesseractSession {
    binary: PathBuf,
    config: TesseractConfig,
    workdir: TempDir,
}

impl TesseractSession {
    /// Private scratch directory, removed on release.
    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }
}

impl RecognitionSession for TesseractSession {
    async fn recognize(
        &mut self,
        image: &PixelBuffer,
        progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<RecognitionResult, RecognitionError> {
        progress(0.0);
        if image.is_empty() {
            log::warn!("[OCR] Empty image, nothing to recognize");
            progress(1.0);
            return Ok(RecognitionResult::empty());
        }

        let input = self.workdir.path().join("input.png");
        tokio::fs::write(&input, image.encode_png()?).await?;
        progress(0.2);

        let start = Instant::now();
        let timeout_secs = self.config.timeout_secs;
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.arg(&input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.language)
            .arg("--psm")
            .arg(self.config.page_segmentation_mode.to_string())
            .arg("tsv")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output())
            .await
            .map_err(|_| RecognitionError::Timeout(timeout_secs))?
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => RecognitionError::EngineUnavailable(format!(
                    "failed to spawn {}: {}",
                    self.binary.display(),
                    e
                )),
                _ => RecognitionError::Io(e),
            })?;

        if !output.status.success() {
            return Err(RecognitionError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        progress(0.9);

        let result = parse_tsv(&String::from_utf8_lossy(&output.stdout))?;
        log::info!(
            "[OCR] {} words, {} lines, confidence={:.2} in {}ms",
            result.word_count(),
            result.line_count(),
            result.confidence,
            start.elapsed().as_millis()
        );
        progress(1.0);
        Ok(result)
    }

    async fn release(self) {
        let path = self.workdir.path().to_path_buf();
        match self.workdir.close() {
            Ok(()) => log::debug!("[OCR] Released session workspace {}", path.display()),
            Err(e) => log::warn!("[OCR] Failed to remove {}: {}", path.display(), e),
        }
    }
}

/// Words of one TSV line, before conversion into a `RecognizedLine`.
struct LineAccumulator {
    key: (i32, i32, i32, i32),
    words: Vec<RecognizedWord>,
}

impl LineAccumulator {
    fn finish(self) -> RecognizedLine {
        let text = self
            .words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let confidence =
            self.words.iter().map(|w| w.confidence).sum::<f64>() / self.words.len() as f64;
        let bounding_box = self
            .words
            .iter()
            .skip(1)
            .fold(self.words[0].bounding_box, |acc, w| acc.union(&w.bounding_box));
        RecognizedLine {
            text,
            confidence,
            bounding_box,
        }
    }
}

/// Parse Tesseract TSV output into a recognition result.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Only word rows are used; words
/// are grouped into lines by (page, block, paragraph, line).
pub fn parse_tsv(tsv: &str) -> Result<RecognitionResult, RecognitionError> {
    let mut rows = tsv.lines();
    match rows.next() {
        None => return Ok(RecognitionResult::empty()),
        Some(header) if header.starts_with("level\t") => {}
        Some(header) => {
            return Err(RecognitionError::MalformedOutput(format!(
                "unexpected TSV header: {:?}",
                header
            )))
        }
    }

    let mut finished: Vec<LineAccumulator> = Vec::new();
    for row in rows {
        let fields: Vec<&str> = row.splitn(12, '\t').collect();
        if fields.len() < 11 {
            continue;
        }
        let num = |i: usize| -> Result<i32, RecognitionError> {
            fields[i].trim().parse::<i32>().map_err(|_| {
                RecognitionError::MalformedOutput(format!("bad column {} in row {:?}", i, row))
            })
        };

        if num(0)? != WORD_LEVEL {
            continue;
        }
        let text = fields.get(11).map(|t| t.trim()).unwrap_or("");
        let conf: f64 = fields[10].trim().parse().map_err(|_| {
            RecognitionError::MalformedOutput(format!("bad confidence in row {:?}", row))
        })?;
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (num(1)?, num(2)?, num(3)?, num(4)?);
        let word = RecognizedWord {
            text: text.to_string(),
            confidence: (conf / 100.0).clamp(0.0, 1.0),
            bounding_box: BoundingBox {
                x: num(6)?.max(0) as u32,
                y: num(7)?.max(0) as u32,
                width: num(8)?.max(0) as u32,
                height: num(9)?.max(0) as u32,
            },
        };

        match finished.last_mut() {
            Some(line) if line.key == key => line.words.push(word),
            _ => finished.push(LineAccumulator {
                key,
                words: vec![word],
            }),
        }
    }

    let words: Vec<RecognizedWord> = finished
        .iter()
        .flat_map(|line| line.words.iter().cloned())
        .collect();
    let lines: Vec<RecognizedLine> = finished.into_iter().map(LineAccumulator::finish).collect();
    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(RecognitionResult::new(&text, words, lines))
}
