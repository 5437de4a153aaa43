//! Readability benchmark CLI for legible.
//!
//! Runs handwriting samples through the full analysis pipeline (Tesseract
//! recognition + pixel metrics) and reports scores and latency.
//!
//! Usage:
//!   cargo run -p legible-bench -- <image.png>             Single image, summary
//!   cargo run -p legible-bench -- <image.png> --json      Single image, full JSON result
//!   cargo run -p legible-bench -- --batch <directory>     All images in directory → CSV
//!
//! Engine settings come from ~/.config/legible/config.json and LEGIBLE_*
//! environment variables (a .env/.env.local in the working directory is loaded).

use legible::{AnalysisResult, HandwritingAnalyzer, ImageSource, NoProgress, TesseractAdapter};
use std::io::Write;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() {
    legible::config::load_env_files(Path::new("."));
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage:");
        eprintln!("  legible-bench <image> [--json]");
        eprintln!("  legible-bench --batch <directory>");
        std::process::exit(1);
    }

    let config = legible::load_config();
    let analyzer = match HandwritingAnalyzer::from_config(&config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("Cannot start recognition engine: {}", e);
            std::process::exit(1);
        }
    };

    if args[1] == "--batch" {
        let Some(dir) = args.get(2) else {
            eprintln!("--batch requires a directory path");
            std::process::exit(1);
        };
        run_batch(&analyzer, Path::new(dir)).await;
    } else {
        let as_json = args.contains(&"--json".to_string());
        run_single(&analyzer, Path::new(&args[1]), as_json).await;
    }
}

async fn run_single(analyzer: &HandwritingAnalyzer<TesseractAdapter>, path: &Path, as_json: bool) {
    if !path.is_file() {
        eprintln!("File not found: {}", path.display());
        std::process::exit(1);
    }

    let progress = |percent: u8| {
        eprint!("\r[PROGRESS] {:>3}%", percent);
        if percent == 100 {
            eprintln!();
        }
    };
    let result = match analyzer
        .analyze(ImageSource::Path(path.to_path_buf()), progress)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            eprintln!("\nAnalysis failed: {}", e);
            std::process::exit(1);
        }
    };

    if as_json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize result: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    print_summary(path, &result);
}

fn print_summary(path: &Path, result: &AnalysisResult) {
    println!("=== {} ===", path.display());
    println!();
    println!(
        "  Readability: {:.2} ({:?}){}",
        result.readability_score,
        result.level,
        if result.degraded { " [degraded]" } else { "" }
    );
    println!("  OCR confidence: {:.3}", result.metrics.ocr_confidence);
    println!("  Contrast: {:.3}", result.metrics.contrast_score);
    println!("  Text density: {:.3}", result.metrics.text_density);
    println!("  Line consistency: {:.3}", result.metrics.line_consistency);
    println!("  Words / lines: {} / {}", result.word_count, result.line_count);
    println!("  Processing: {}ms", result.processing_ms);
    println!();
    for finding in &result.findings {
        println!("  [{:?}] {}", finding.kind, finding.message);
    }

    let preview: String = result.extracted_text.chars().take(200).collect();
    if !preview.is_empty() {
        println!();
        println!("  Text preview: {:?}", preview);
    }
}

async fn run_batch(analyzer: &HandwritingAnalyzer<TesseractAdapter>, dir: &Path) {
    if !dir.is_dir() {
        eprintln!("Not a directory: {}", dir.display());
        std::process::exit(1);
    }

    let mut entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(read) => read
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map(|ext| {
                        let ext = ext.to_string_lossy().to_lowercase();
                        ext == "png" || ext == "jpg" || ext == "jpeg"
                    })
                    .unwrap_or(false)
            })
            .collect(),
        Err(e) => {
            eprintln!("Failed to read {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    };
    entries.sort();

    if entries.is_empty() {
        eprintln!("No image files found in {}", dir.display());
        std::process::exit(1);
    }

    println!(
        "filename,score,level,confidence,words,lines,contrast,density,line_consistency,degraded,ms"
    );

    let mut latencies: Vec<f64> = Vec::new();
    let mut failures = 0usize;

    for image_path in &entries {
        let filename = image_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match analyzer
            .analyze(ImageSource::Path(image_path.clone()), NoProgress)
            .await
        {
            Ok(result) => {
                println!(
                    "{},{:.2},{},{:.3},{},{},{:.3},{:.3},{:.3},{},{}",
                    filename,
                    result.readability_score,
                    result.level.label().to_lowercase(),
                    result.confidence,
                    result.word_count,
                    result.line_count,
                    result.metrics.contrast_score,
                    result.metrics.text_density,
                    result.metrics.line_consistency,
                    result.degraded,
                    result.processing_ms
                );
                latencies.push(result.processing_ms as f64);
            }
            Err(e) => {
                failures += 1;
                log::warn!("[BENCH] {} failed: {}", filename, e);
                eprintln!("{}: {}", filename, e);
            }
        }

        std::io::stdout().flush().ok();
    }

    eprintln!("\n--- Benchmark Summary ---");
    eprintln!("  Images processed: {}", entries.len());
    eprintln!("  Failures: {}", failures);
    if !latencies.is_empty() {
        print_latency_summary(&mut latencies);
    }
}

fn print_latency_summary(latencies: &mut [f64]) {
    latencies.sort_by(|a, b| a.total_cmp(b));
    let median = latencies[latencies.len() / 2];
    let p99_idx = ((latencies.len() as f64 * 0.99).ceil() as usize).min(latencies.len() - 1);
    let p99 = latencies[p99_idx];
    let avg: f64 = latencies.iter().sum::<f64>() / latencies.len() as f64;

    eprintln!("    Median: {:.1}ms", median);
    eprintln!("    Average: {:.1}ms", avg);
    eprintln!("    P99: {:.1}ms", p99);
}
