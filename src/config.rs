//! Configuration management for docsift.
//!
//! Defaults live in `Settings::default()`; an optional TOML file overrides
//! them and the `DATABASE_URL` environment variable overrides the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default cache entry lifetime in hours.
pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

/// Default minimum text length (chars) before analyzers run.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 10;

/// Default per-analyzer timeout in seconds.
pub const DEFAULT_ANALYZER_TIMEOUT_SECS: u64 = 30;

/// Default interval between background cache sweeps, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

const DEFAULT_DATABASE_FILENAME: &str = "docsift.db";
const DOCUMENTS_SUBDIR: &str = "documents";

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename inside the data directory.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Supports sqlite: URLs. Set via DATABASE_URL env var or config.
    pub database_url: Option<String>,
    /// Directory for storing uploaded document content.
    pub documents_dir: PathBuf,
    /// Cache entry lifetime in hours.
    pub cache_ttl_hours: i64,
    /// Minimum extracted-text length before analyzers run.
    pub min_text_chars: usize,
    /// Per-analyzer timeout in seconds.
    pub analyzer_timeout_secs: u64,
    /// Interval between background cache sweeps, in seconds.
    pub sweep_interval_secs: u64,
    /// Tesseract OCR language.
    pub tesseract_lang: String,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/Documents/docsift/ for user data
        // Falls back gracefully: Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docsift");

        Self {
            documents_dir: data_dir.join(DOCUMENTS_SUBDIR),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            analyzer_timeout_secs: DEFAULT_ANALYZER_TIMEOUT_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            tesseract_lang: "eng".to_string(),
        }
    }
}

/// On-disk configuration file shape. Every field is optional; present
/// fields override defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    data_dir: Option<String>,
    database_url: Option<String>,
    documents_dir: Option<String>,
    cache_ttl_hours: Option<i64>,
    min_text_chars: Option<usize>,
    analyzer_timeout_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
    tesseract_lang: Option<String>,
}

impl Settings {
    /// Load settings: defaults, then the config file (explicit path or
    /// `docsift.toml` in the data directory), then environment overrides.
    pub fn load(config_path: Option<&Path>, data_dir: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = Settings::default();

        if let Some(dir) = data_dir {
            settings.set_data_dir(dir.to_path_buf());
        }

        let file_path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = settings.data_dir.join("docsift.toml");
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = file_path {
            let raw = std::fs::read_to_string(&path)?;
            let config: ConfigFile = toml::from_str(&raw)?;
            settings.apply(config);
        }

        // --data beats the config file for directory layout
        if let Some(dir) = data_dir {
            settings.set_data_dir(dir.to_path_buf());
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                settings.database_url = Some(url);
            }
        }

        Ok(settings)
    }

    fn apply(&mut self, config: ConfigFile) {
        if let Some(dir) = config.data_dir {
            self.set_data_dir(expand_path(&dir));
        }
        if let Some(dir) = config.documents_dir {
            self.documents_dir = expand_path(&dir);
        }
        if let Some(url) = config.database_url {
            self.database_url = Some(url);
        }
        if let Some(hours) = config.cache_ttl_hours {
            self.cache_ttl_hours = hours;
        }
        if let Some(chars) = config.min_text_chars {
            self.min_text_chars = chars;
        }
        if let Some(secs) = config.analyzer_timeout_secs {
            self.analyzer_timeout_secs = secs;
        }
        if let Some(secs) = config.sweep_interval_secs {
            self.sweep_interval_secs = secs;
        }
        if let Some(lang) = config.tesseract_lang {
            self.tesseract_lang = lang;
        }
    }

    fn set_data_dir(&mut self, dir: PathBuf) {
        self.documents_dir = dir.join(DOCUMENTS_SUBDIR);
        self.data_dir = dir;
    }

    /// Resolved database URL: explicit URL, or the file inside data_dir.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => self
                .data_dir
                .join(&self.database_filename)
                .display()
                .to_string(),
        }
    }

    /// Create the data and documents directories if missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.documents_dir)?;
        Ok(())
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.cache_ttl_hours, 24);
        assert_eq!(settings.min_text_chars, 10);
        assert_eq!(settings.documents_dir, settings.data_dir.join("documents"));
    }

    #[test]
    fn test_config_file_overrides() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("docsift.toml");
        std::fs::write(
            &config_path,
            "cache_ttl_hours = 48\nmin_text_chars = 25\ntesseract_lang = \"deu\"\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&config_path), None).unwrap();
        assert_eq!(settings.cache_ttl_hours, 48);
        assert_eq!(settings.min_text_chars, 25);
        assert_eq!(settings.tesseract_lang, "deu");
        // Untouched fields keep their defaults.
        assert_eq!(settings.analyzer_timeout_secs, 30);
    }

    #[test]
    fn test_data_dir_override_wins() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(None, Some(dir.path())).unwrap();
        assert_eq!(settings.data_dir, dir.path());
        assert_eq!(settings.documents_dir, dir.path().join("documents"));
        assert!(settings.database_url().ends_with("docsift.db"));
    }
}
