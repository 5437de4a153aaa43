//! Analyzer configuration.
//!
//! Sources, lowest precedence first: built-in defaults, the JSON file at
//! `~/.config/legible/config.json` (platform config dir), then `LEGIBLE_*`
//! environment variables. `load_env_files` can seed the environment from
//! `.env.local` / `.env` first.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_TESSERACT: &str = "LEGIBLE_TESSERACT";
pub const ENV_OCR_LANG: &str = "LEGIBLE_OCR_LANG";
pub const ENV_OCR_PSM: &str = "LEGIBLE_OCR_PSM";
pub const ENV_OCR_TIMEOUT: &str = "LEGIBLE_OCR_TIMEOUT_SECS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    pub tesseract: TesseractConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TesseractConfig {
    /// Explicit engine binary. Looked up on PATH when unset.
    pub binary: Option<PathBuf>,
    /// Tesseract language codes, e.g. "eng" or "eng+spa".
    pub language: String,
    /// Page segmentation mode; 3 is fully automatic.
    pub page_segmentation_mode: u8,
    pub timeout_secs: u64,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: None,
            language: "eng".to_string(),
            page_segmentation_mode: 3,
            timeout_secs: 60,
        }
    }
}

/// Default config file location.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("legible")
        .join("config.json")
}

/// Load `.env.local`, falling back to `.env`, from `dir`. First match wins.
pub fn load_env_files(dir: &Path) {
    for env_file in [".env.local", ".env"] {
        let path = dir.join(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => log::info!("[CONFIG] Loaded {}", path.display()),
                Err(e) => log::warn!("[CONFIG] Failed to load {}: {}", path.display(), e),
            }
            return;
        }
    }
}

/// Defaults, overlaid with the config file and then the environment.
pub fn load_config() -> AnalyzerConfig {
    let mut config = load_config_file(&config_path());
    config.apply_overrides(|key| std::env::var(key).ok());
    config
}

/// Read a config file. Missing or invalid files yield defaults.
pub fn load_config_file(path: &Path) -> AnalyzerConfig {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("[CONFIG] Ignoring invalid {}: {}", path.display(), e);
            AnalyzerConfig::default()
        }),
        Err(_) => AnalyzerConfig::default(),
    }
}

impl AnalyzerConfig {
    /// Apply `LEGIBLE_*` overrides read through `lookup`.
    ///
    /// Empty values are ignored; unparseable numbers are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let tesseract = &mut self.tesseract;

        if let Some(binary) = get(ENV_TESSERACT) {
            tesseract.binary = Some(PathBuf::from(binary));
        }
        if let Some(language) = get(ENV_OCR_LANG) {
            tesseract.language = language.trim().to_string();
        }
        if let Some(raw) = get(ENV_OCR_PSM) {
            match raw.trim().parse() {
                Ok(psm) => tesseract.page_segmentation_mode = psm,
                Err(_) => log::warn!("[CONFIG] {}={:?} is not a valid mode", ENV_OCR_PSM, raw),
            }
        }
        if let Some(raw) = get(ENV_OCR_TIMEOUT) {
            match raw.trim().parse() {
                Ok(secs) => tesseract.timeout_secs = secs,
                Err(_) => log::warn!("[CONFIG] {}={:?} is not a number", ENV_OCR_TIMEOUT, raw),
            }
        }
    }
}
