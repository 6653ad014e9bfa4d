use serde::{Deserialize, Serialize};

/// German alphabet plus umlauts and sharp s.
pub const DEFAULT_WHITELIST: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyzÄÖÜäöüß";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub directories: DirectoriesConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub primary: PrimaryOcrConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub correction: CorrectionConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            directories: DirectoriesConfig::default(),
            ocr: OcrConfig::default(),
            primary: PrimaryOcrConfig::default(),
            preprocess: PreprocessConfig::default(),
            correction: CorrectionConfig::default(),
            watcher: WatcherConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoriesConfig {
    #[serde(default = "default_input")]
    pub input: String,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_processed")]
    pub processed: String,
}

fn default_input() -> String {
    "input".to_string()
}

fn default_output() -> String {
    "output".to_string()
}

fn default_processed() -> String {
    "processed".to_string()
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            processed: default_processed(),
        }
    }
}

/// Settings shared by every recognition call, in both the fallback OCR
/// strategy and the text extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_whitelist")]
    pub whitelist: String,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// A native text layer must have strictly more trimmed characters than
    /// this to be trusted.
    #[serde(default = "default_min_native_chars")]
    pub min_native_chars: usize,
    #[serde(default = "default_true")]
    pub correct_native_text: bool,
    /// Tesseract data directory. `None` uses the engine's default lookup.
    #[serde(default)]
    pub tessdata: Option<String>,
    #[serde(default = "default_page_seg_mode")]
    pub page_seg_mode: u32,
}

fn default_language() -> String {
    "deu".to_string()
}

fn default_whitelist() -> String {
    DEFAULT_WHITELIST.to_string()
}

fn default_dpi() -> u32 {
    600
}

fn default_min_native_chars() -> usize {
    50
}

fn default_true() -> bool {
    true
}

fn default_page_seg_mode() -> u32 {
    6
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            whitelist: default_whitelist(),
            dpi: default_dpi(),
            min_native_chars: default_min_native_chars(),
            correct_native_text: true,
            tessdata: None,
            page_seg_mode: default_page_seg_mode(),
        }
    }
}

/// The external whole-document OCR tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryOcrConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    #[serde(default = "default_optimize")]
    pub optimize: u8,
    /// Language passed to the tool. Falls back to `ocr.language` when unset.
    #[serde(default)]
    pub language: Option<String>,
}

fn default_program() -> String {
    "ocrmypdf".to_string()
}

fn default_jobs() -> usize {
    4
}

fn default_optimize() -> u8 {
    1
}

impl Default for PrimaryOcrConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            jobs: default_jobs(),
            optimize: default_optimize(),
            language: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    #[serde(default = "default_median_radius")]
    pub median_radius: u32,
}

fn default_threshold() -> u8 {
    128
}

fn default_median_radius() -> u32 {
    1
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            median_radius: default_median_radius(),
        }
    }
}

/// LanguageTool-compatible correction server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_correction_url")]
    pub url: String,
    #[serde(default = "default_correction_language")]
    pub language: String,
    #[serde(default = "default_correction_timeout")]
    pub timeout_ms: u64,
}

fn default_correction_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_correction_language() -> String {
    "de-DE".to_string()
}

fn default_correction_timeout() -> u64 {
    10_000
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_correction_url(),
            language: default_correction_language(),
            timeout_ms: default_correction_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_stability_checks")]
    pub stability_checks: u32,
    #[serde(default = "default_stability_interval")]
    pub stability_interval_ms: u64,
    #[serde(default = "default_true")]
    pub process_existing: bool,
    /// Poll instead of using native events (Docker bind mounts, NFS).
    #[serde(default)]
    pub use_polling: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_debounce() -> u64 {
    500
}

fn default_settle_delay() -> u64 {
    100
}

fn default_stability_checks() -> u32 {
    3
}

fn default_stability_interval() -> u64 {
    200
}

fn default_poll_interval() -> u64 {
    2_000
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce(),
            settle_delay_ms: default_settle_delay(),
            stability_checks: default_stability_checks(),
            stability_interval_ms: default_stability_interval(),
            process_existing: true,
            use_polling: false,
            poll_interval_ms: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: default_filter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_layout() {
        let config = Config::default();
        assert_eq!(config.directories.input, "input");
        assert_eq!(config.directories.output, "output");
        assert_eq!(config.directories.processed, "processed");
        assert_eq!(config.ocr.min_native_chars, 50);
        assert_eq!(config.primary.jobs, 4);
        assert_eq!(config.preprocess.threshold, 128);
    }

    #[test]
    fn test_empty_object_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.ocr.dpi, 600);
        assert!(config.correction.enabled);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_whitelist_contains_umlauts() {
        for c in ['Ä', 'Ö', 'Ü', 'ä', 'ö', 'ü', 'ß'] {
            assert!(DEFAULT_WHITELIST.contains(c), "missing {}", c);
        }
        assert!(!DEFAULT_WHITELIST.contains('0'));
    }

    #[test]
    fn test_log_format_lowercase() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
