use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

pub const DEFAULT_CSV_DIR: &str = "/mnt/next/autorace_day_date/csv";
pub const DEFAULT_JSON_DIR: &str = "/mnt/next/autorace_day_date/date";

/// Asia/Tokyo has no daylight saving, so a fixed +09:00 offset is exact.
const JST_OFFSET_SECS: i32 = 9 * 3600;

pub fn jst() -> FixedOffset {
    // 9h is always within the valid offset range
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap()
}

/// Format an instant as the `YYYYMMDD` day it falls on in Japan.
pub fn jst_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant.with_timezone(&jst()).format("%Y%m%d").to_string()
}

pub fn jst_today() -> String {
    jst_day(&Utc::now())
}

pub fn csv_file_name(day: &str) -> String {
    format!("autorace_{}.csv", day)
}

/// The published file name. Downstream consumers look files up by this name.
pub fn json_file_name(day: &str) -> String {
    format!("autorace_race_list_{}.json", day)
}

pub fn csv_path<P: AsRef<Path>>(csv_dir: P, day: &str) -> PathBuf {
    csv_dir.as_ref().join(csv_file_name(day))
}

pub fn json_path<P: AsRef<Path>>(json_dir: P, day: &str) -> PathBuf {
    json_dir.as_ref().join(json_file_name(day))
}
