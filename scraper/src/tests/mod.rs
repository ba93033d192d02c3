use std::path::PathBuf;

use crate::row::RaceRow;

pub mod fixtures;
pub mod oddspark_tests;

/// Build a CSV row with the fields the converter cares about
pub fn race_row(venue: &str, grade: &str, race_number: u32, players: &[&str]) -> RaceRow {
    RaceRow {
        date: "20240101".to_string(),
        venue: venue.to_string(),
        grade: grade.to_string(),
        race_number,
        start_time: "15:00".to_string(),
        closed_at: "14:58".to_string(),
        players: players.join(","),
        class_category: "一般".to_string(),
    }
}

pub fn scratch_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}
