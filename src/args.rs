use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::article::Granularity;
use crate::config::SourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "govnews",
    about = "Explore government news articles by agency and period",
    version,
    long_about = None
)]
pub struct Args {
    /// Agencies to include (repeatable or comma-separated; default: all)
    #[arg(short, long = "agency", value_name = "AGENCY", value_delimiter = ',')]
    pub agencies: Vec<String>,

    /// Time resolution for aggregation
    #[arg(short, long, value_enum, default_value_t = Granularity::Year)]
    pub granularity: Granularity,

    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub to: Option<NaiveDate>,

    /// Best rank to show, 1 being the most prolific agency
    #[arg(long, value_name = "RANK")]
    pub rank_low: Option<usize>,

    /// Worst rank to show
    #[arg(long, value_name = "RANK")]
    pub rank_high: Option<usize>,

    /// Maximum number of article rows to print
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// List agencies with their article counts and exit
    #[arg(long)]
    pub list_agencies: bool,

    /// Read commands from stdin and re-render after each one
    #[arg(short, long)]
    pub interactive: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where to load the dataset from
    #[arg(long, value_enum, env = "GOVNEWS_SOURCE")]
    pub source: Option<SourceKind>,

    /// Dataset identifier on the hub
    #[arg(long, env = "GOVNEWS_DATASET")]
    pub dataset: Option<String>,

    /// Hub rows endpoint base URL
    #[arg(long, env = "GOVNEWS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// SQLite database holding the articles
    #[arg(long, value_name = "FILE", env = "GOVNEWS_DB")]
    pub db: Option<PathBuf>,

    /// Dataset snapshot lifetime in seconds
    #[arg(long, value_name = "SECS")]
    pub cache_ttl: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of worker threads for dataset preparation
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Initialize govnews.toml with default settings
    #[arg(long)]
    pub init: bool,
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", value, e))
}
