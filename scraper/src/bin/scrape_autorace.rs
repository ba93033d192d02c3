use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use autorace_scraper::layout::{self, DEFAULT_CSV_DIR};
use autorace_scraper::{build_client, scrape_day, write_csv};
use clap::Parser;
use log::{info, warn};

/// Scrape one day of OddsPark autorace start lists into the intermediate CSV
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Race day as YYYYMMDD (defaults to today in Japan)
    date: Option<String>,

    /// Directory the CSV is written to
    #[arg(long, env = "AUTORACE_CSV_DIR", default_value = DEFAULT_CSV_DIR)]
    csv_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let race_day = cli.date.unwrap_or_else(layout::jst_today);
    fs::create_dir_all(&cli.csv_dir)
        .with_context(|| format!("Failed to create directory: {}", cli.csv_dir.display()))?;

    let client = build_client()?;
    let rows = scrape_day(&client, &race_day)?;

    if rows.is_empty() {
        warn!("No rows extracted for {}", race_day);
        return Ok(());
    }

    let out_csv = layout::csv_path(&cli.csv_dir, &race_day);
    write_csv(&out_csv, &rows)?;
    info!("Saved {} ({} rows)", out_csv.display(), rows.len());

    Ok(())
}
