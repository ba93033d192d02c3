use std::path::PathBuf;

use autorace_publisher::config::{
    DEFAULT_CONVERTER, DEFAULT_PYTHON, DEFAULT_REPO_SUBDIR, DEFAULT_SCRAPER,
};
use autorace_publisher::{CommitOutcome, Pipeline, PipelineConfig, SystemRunner, WebhookNotifier};
use autorace_scraper::layout::{DEFAULT_CSV_DIR, DEFAULT_JSON_DIR};
use clap::Parser;
use log::{error, info, warn};

/// Scrape a day of autorace start lists, convert them to JSON and publish the
/// result to a git repository
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Race day as YYYYMMDD (defaults to today in Asia/Tokyo)
    date: Option<String>,

    /// Interpreter used for .py programs
    #[arg(long, env = "PYTHON", default_value = DEFAULT_PYTHON)]
    python: String,

    /// Scraper program, called with the date
    #[arg(long, env = "AUTORACE_SCRAPER", default_value = DEFAULT_SCRAPER)]
    scraper: PathBuf,

    /// Converter program, called with the date
    #[arg(long, env = "AUTORACE_CONVERTER", default_value = DEFAULT_CONVERTER)]
    converter: PathBuf,

    /// Directory the scraper writes its CSV to
    #[arg(long, env = "AUTORACE_CSV_DIR", default_value = DEFAULT_CSV_DIR)]
    csv_dir: PathBuf,

    /// Directory the converter writes its JSON to
    #[arg(long, env = "AUTORACE_JSON_DIR", default_value = DEFAULT_JSON_DIR)]
    json_dir: PathBuf,

    /// Local clone of the repository to publish into
    #[arg(long, env = "AUTORACE_REPO_DIR")]
    repo: PathBuf,

    /// Destination directory inside the repository
    #[arg(long, env = "AUTORACE_REPO_SUBDIR", default_value = DEFAULT_REPO_SUBDIR)]
    repo_subdir: PathBuf,

    /// Webhook notified after a successful push (empty disables)
    #[arg(long, env = "DISCORD_WEBHOOK_URL")]
    webhook_url: Option<String>,
}

impl Cli {
    fn into_config(self) -> PipelineConfig {
        let mut config = PipelineConfig::new(self.repo)
            .with_python(Some(self.python))
            .with_webhook_url(self.webhook_url);
        config.scraper = self.scraper;
        config.converter = self.converter;
        config.csv_dir = self.csv_dir;
        config.json_dir = self.json_dir;
        config.repo_subdir = self.repo_subdir;
        config
    }
}

fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut cli = Cli::parse();
    let date = cli.date.take();

    let mut pipeline = Pipeline::new(cli.into_config(), SystemRunner, WebhookNotifier::new());
    match pipeline.run(date.as_deref()) {
        Ok(report) => {
            if let CommitOutcome::Failed { .. } = &report.publish.commit {
                warn!("{} was pushed without a new commit", report.date);
            }
            info!("Published {}", report.publish.destination.display());
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}
