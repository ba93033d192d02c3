use std::path::PathBuf;

use autorace_scraper::layout::{DEFAULT_CSV_DIR, DEFAULT_JSON_DIR};

pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_SCRAPER: &str = "scrape_autorace_oddspark.py";
pub const DEFAULT_CONVERTER: &str = "convert_autorace_csv_to_json.py";
pub const DEFAULT_REPO_SUBDIR: &str = "autorace";

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Interpreter for programs ending in `.py`
    pub python: String,
    pub scraper: PathBuf,
    pub converter: PathBuf,
    pub csv_dir: PathBuf,
    pub json_dir: PathBuf,
    /// Local clone the JSON is published into
    pub repo_dir: PathBuf,
    /// Destination directory, relative to `repo_dir`
    pub repo_subdir: PathBuf,
    pub webhook_url: Option<String>,
}

impl PipelineConfig {
    pub fn new<P: Into<PathBuf>>(repo_dir: P) -> PipelineConfig {
        PipelineConfig {
            python: DEFAULT_PYTHON.to_string(),
            scraper: PathBuf::from(DEFAULT_SCRAPER),
            converter: PathBuf::from(DEFAULT_CONVERTER),
            csv_dir: PathBuf::from(DEFAULT_CSV_DIR),
            json_dir: PathBuf::from(DEFAULT_JSON_DIR),
            repo_dir: repo_dir.into(),
            repo_subdir: PathBuf::from(DEFAULT_REPO_SUBDIR),
            webhook_url: None,
        }
    }

    /// Set the interpreter, keeping the default for a blank value.
    pub fn with_python(mut self, python: Option<String>) -> PipelineConfig {
        if let Some(python) = non_empty(python) {
            self.python = python;
        }
        self
    }

    /// Set the webhook. A blank URL disables notification.
    pub fn with_webhook_url(mut self, url: Option<String>) -> PipelineConfig {
        self.webhook_url = non_empty(url);
        self
    }
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
