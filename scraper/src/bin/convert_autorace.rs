use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use autorace_scraper::convert_day;
use autorace_scraper::layout::{self, DEFAULT_CSV_DIR, DEFAULT_JSON_DIR};
use clap::Parser;
use log::{error, info};

/// Exit code for a missing input CSV
const EXIT_CSV_NOT_FOUND: i32 = 2;

/// Convert a day's intermediate CSV into the published race list JSON
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Race day as YYYYMMDD
    date: String,

    /// Directory holding autorace_<date>.csv
    #[arg(long, env = "AUTORACE_CSV_DIR", default_value = DEFAULT_CSV_DIR)]
    csv_dir: PathBuf,

    /// Directory autorace_race_list_<date>.json is written to
    #[arg(long, env = "AUTORACE_JSON_DIR", default_value = DEFAULT_JSON_DIR)]
    json_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let in_csv = layout::csv_path(&cli.csv_dir, &cli.date);
    let out_json = layout::json_path(&cli.json_dir, &cli.date);
    fs::create_dir_all(&cli.json_dir)
        .with_context(|| format!("Failed to create directory: {}", cli.json_dir.display()))?;

    if !in_csv.exists() {
        error!("not found: {}", in_csv.display());
        std::process::exit(EXIT_CSV_NOT_FOUND);
    }

    let groups = convert_day(&in_csv, &out_json)?;
    info!("Saved {} (groups={})", out_json.display(), groups);

    Ok(())
}
