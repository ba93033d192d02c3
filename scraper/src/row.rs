use serde::{Deserialize, Serialize};

/// One line of the intermediate `autorace_<date>.csv` file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RaceRow {
    pub date: String,
    pub venue: String,
    #[serde(default)]
    pub grade: String,
    pub race_number: u32,
    pub start_time: String,
    pub closed_at: String,
    /// Comma-joined `"<car><name>"` entries
    pub players: String,
    #[serde(default)]
    pub class_category: String,
}
