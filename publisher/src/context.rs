use std::path::PathBuf;

use autorace_scraper::layout;
use chrono::{DateTime, Utc};

use crate::config::PipelineConfig;

/// The explicit date when one is given, otherwise the current day in
/// Asia/Tokyo as `YYYYMMDD`. Explicit dates are used verbatim.
pub fn resolve_date(explicit: Option<&str>, now: DateTime<Utc>) -> String {
    match explicit {
        Some(date) if !date.is_empty() => date.to_string(),
        _ => layout::jst_day(&now),
    }
}

/// The resolved date of one run and every path derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub date: String,
    pub csv_dir: PathBuf,
    pub json_dir: PathBuf,
    pub repo_dir: PathBuf,
    pub repo_subdir: PathBuf,
}

impl RunContext {
    pub fn new(config: &PipelineConfig, date: String) -> RunContext {
        RunContext {
            date,
            csv_dir: config.csv_dir.clone(),
            json_dir: config.json_dir.clone(),
            repo_dir: config.repo_dir.clone(),
            repo_subdir: config.repo_subdir.clone(),
        }
    }

    pub fn json_file_name(&self) -> String {
        layout::json_file_name(&self.date)
    }

    /// Where the converter is expected to leave its output
    pub fn json_path(&self) -> PathBuf {
        layout::json_path(&self.json_dir, &self.date)
    }

    pub fn dest_dir(&self) -> PathBuf {
        self.repo_dir.join(&self.repo_subdir)
    }

    pub fn dest_path(&self) -> PathBuf {
        self.dest_dir().join(self.json_file_name())
    }

    /// Path of the published file relative to the repository root, as git sees it
    pub fn repo_relative_path(&self) -> PathBuf {
        self.repo_subdir.join(self.json_file_name())
    }

    pub fn commit_message(&self) -> String {
        format!("autorace {}", self.date)
    }
}
