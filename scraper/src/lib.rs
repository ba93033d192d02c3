// Shared file layout, the OddsPark scraper and the CSV to JSON converter
pub mod convert;
pub mod layout;
pub mod oddspark;
pub mod row;

#[cfg(test)]
pub mod tests;

// Re-export key types and functions for easier access
pub use crate::convert::{convert_day, group_rows, read_rows, RaceEntry, VenueRaces};
pub use crate::oddspark::{
    build_client, closed_at, collect_oneday_links, extract_races, fetch_html,
    filter_links_by_day, scrape_day, scrape_day_from, write_csv, OneDayCard, OneDayLink, Race,
};
pub use crate::row::RaceRow;
