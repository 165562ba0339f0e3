use std::path::PathBuf;

/// Language every extraction uses unless a provider is configured otherwise
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Provider configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// OCR language code (e.g., "eng")
    pub language: String,
    /// Directory where downloaded models and tessdata are cached
    pub cache_dir: PathBuf,
    /// Existing tessdata directory; skips the tessdata download when set
    pub tessdata_path: Option<PathBuf>,
}

impl Config {
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn with_tessdata_path(mut self, tessdata_path: impl Into<PathBuf>) -> Self {
        self.tessdata_path = Some(tessdata_path.into());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            cache_dir: default_cache_dir(),
            tessdata_path: None,
        }
    }
}

/// Platform cache directory, falling back to the temp dir
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("image-text-reader")
}
