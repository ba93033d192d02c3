use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::oddspark::{MAX_PLAYERS, MIN_PLAYERS};
use crate::row::RaceRow;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RaceEntry {
    pub race_number: u32,
    pub start_time: String,
    pub closed_at: String,
    pub players: Vec<String>,
    pub class_category: String,
}

/// All races of one venue and grade on the day.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VenueRaces {
    pub venue: String,
    pub grade: String,
    pub races: Vec<RaceEntry>,
}

pub fn split_players(field: &str) -> Vec<String> {
    field
        .split(',')
        .filter(|player| !player.is_empty())
        .map(str::to_string)
        .collect()
}

/// Group rows by venue and grade, in the order each pair first appears.
/// Rows without a full field of 6 to 8 players are dropped.
pub fn group_rows<I>(rows: I) -> Vec<VenueRaces>
where
    I: IntoIterator<Item = RaceRow>,
{
    let mut groups: Vec<VenueRaces> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for row in rows {
        let players = split_players(&row.players);
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
            continue;
        }

        let key = (row.venue.clone(), row.grade.clone());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(VenueRaces {
                venue: row.venue.clone(),
                grade: row.grade.clone(),
                races: Vec::new(),
            });
            groups.len() - 1
        });

        groups[slot].races.push(RaceEntry {
            race_number: row.race_number,
            start_time: row.start_time,
            closed_at: row.closed_at,
            players,
            class_category: row.class_category,
        });
    }

    for group in &mut groups {
        group.races.sort_by_key(|race| race.race_number);
    }

    groups
}

/// Read the rows of a day's CSV that carry a full field of riders.
///
/// Rows outside 6 to 8 players are skipped before any other column is
/// decoded, so a malformed race number only matters on a row that is kept.
pub fn read_rows<P: AsRef<Path>>(csv_path: P) -> Result<Vec<RaceRow>> {
    let csv_path = csv_path.as_ref();
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header of {}", csv_path.display()))?
        .clone();
    let players_column = headers.iter().position(|name| name == "players");

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| {
            format!("Failed to read row {} of {}", line + 1, csv_path.display())
        })?;
        let column = players_column
            .with_context(|| format!("No players column in {}", csv_path.display()))?;
        let players = split_players(record.get(column).unwrap_or_default());
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
            continue;
        }

        let row: RaceRow = record.deserialize(Some(&headers)).with_context(|| {
            format!("Failed to parse row {} of {}", line + 1, csv_path.display())
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Convert a day's CSV into the published JSON list. Returns the number of
/// venue groups written.
pub fn convert_day<P: AsRef<Path>, Q: AsRef<Path>>(csv_path: P, json_path: Q) -> Result<usize> {
    let json_path = json_path.as_ref();
    let groups = group_rows(read_rows(csv_path)?);

    let json =
        serde_json::to_string_pretty(&groups).context("Failed to serialize race list")?;
    fs::write(json_path, json)
        .with_context(|| format!("Failed to write JSON file: {}", json_path.display()))?;

    Ok(groups.len())
}
