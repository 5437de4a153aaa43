//! Pixel-level quality signals over a decoded RGBA buffer.
//!
//! Each function is a single pass (or one pass per row) over the samples
//! and returns a dimensionless score in [0, 1].

use crate::input::PixelBuffer;

/// Luminance below this is treated as ink.
pub const INK_THRESHOLD: f64 = 200.0;

/// A row whose ink fraction exceeds this is part of a text line.
pub const LINE_ROW_DENSITY: f64 = 0.05;

/// Handwriting rarely spans the full black-to-white range.
const CONTRAST_BOOST: f64 = 1.2;

/// Mean of R, G and B. Alpha is ignored.
pub fn luminance(pixel: &[u8]) -> f64 {
    (f64::from(pixel[0]) + f64::from(pixel[1]) + f64::from(pixel[2])) / 3.0
}

fn is_ink(pixel: &[u8]) -> bool {
    luminance(pixel) < INK_THRESHOLD
}

/// Spread between the darkest and brightest pixel, boosted and capped at 1.
///
/// A uniform image scores 0.
pub fn compute_contrast(buffer: &PixelBuffer) -> f64 {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for pixel in buffer.samples().chunks_exact(4) {
        let lum = luminance(pixel);
        min = min.min(lum);
        max = max.max(lum);
    }
    if max < min {
        return 0.0;
    }
    ((max - min) / 255.0 * CONTRAST_BOOST).clamp(0.0, 1.0)
}

/// Fraction of ink pixels in the whole image.
pub fn ink_ratio(buffer: &PixelBuffer) -> f64 {
    let total = buffer.pixel_count();
    if total == 0 {
        return 0.0;
    }
    let ink = buffer
        .samples()
        .chunks_exact(4)
        .filter(|pixel| is_ink(pixel))
        .count();
    ink as f64 / total as f64
}

/// Map a raw ink ratio onto a score that peaks around 20% coverage.
///
/// Too little ink is mostly empty page; too much is smudged or overlapping
/// strokes. Both read poorly.
pub fn density_score(raw: f64) -> f64 {
    let score = if raw < 0.05 {
        raw * 4.0
    } else if raw <= 0.2 {
        0.2 + raw * 4.0
    } else if raw > 0.5 {
        (1.0 - (raw - 0.5)).max(0.0)
    } else {
        1.0 - ((raw - 0.2) / 0.3) * 0.2
    };
    score.clamp(0.0, 1.0)
}

pub fn compute_text_density(buffer: &PixelBuffer) -> f64 {
    density_score(ink_ratio(buffer))
}

/// Row indices where a text line begins (non-line row followed by a line row).
pub fn line_starts(buffer: &PixelBuffer) -> Vec<usize> {
    let width = buffer.width() as usize;
    if width == 0 {
        return Vec::new();
    }

    let mut starts = Vec::new();
    let mut in_line = false;
    for (y, row) in buffer.rows().enumerate() {
        let ink = row.chunks_exact(4).filter(|pixel| is_ink(pixel)).count();
        let row_density = ink as f64 / width as f64;
        if row_density > LINE_ROW_DENSITY {
            if !in_line {
                starts.push(y);
                in_line = true;
            }
        } else {
            in_line = false;
        }
    }
    starts
}

/// How evenly spaced successive text lines are.
///
/// `1 - stddev(gaps) / mean(gaps)` over the distances between line starts.
/// Too few lines to measure spacing yields a neutral value: 0.5 with fewer
/// than two lines, 0.6 with exactly two (a single gap).
pub fn compute_line_consistency(buffer: &PixelBuffer) -> f64 {
    let starts = line_starts(buffer);
    if starts.len() < 2 {
        return 0.5;
    }

    let gaps: Vec<f64> = starts.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    if gaps.len() < 2 {
        return 0.6;
    }

    let n = gaps.len() as f64;
    let mean = gaps.iter().sum::<f64>() / n;
    let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    (1.0 - std_dev / mean).clamp(0.0, 1.0)
}
