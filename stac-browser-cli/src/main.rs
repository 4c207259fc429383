//! STAC Browser - browse STAC catalogs, search items and hand them off for download
//!
//! Main entry point

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use stac_browser_core::catalog::{Rectangle, TimePeriod};
use stac_browser_core::config::ConfigStore;

mod api_cli;
mod browse;
mod catalog_cli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Bounding box given as `minx,miny,maxx,maxy`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BboxArg(pub Rectangle);

impl FromStr for BboxArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format!("Invalid bounding box: {s}"))?;

        match values.as_slice() {
            [x_min, y_min, x_max, y_max] => {
                if x_min > x_max || y_min > y_max {
                    return Err(format!(
                        "Invalid bounding box: {s}. Minimum must not exceed maximum"
                    ));
                }
                Ok(BboxArg(Rectangle::new(*x_min, *y_min, *x_max, *y_max)))
            }
            _ => Err(format!(
                "Invalid bounding box: {s}. Expected minx,miny,maxx,maxy"
            )),
        }
    }
}

/// Clap value parser for `--start` / `--end`
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    TimePeriod::parse_instant(s).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[clap(
    name = "stac-browser",
    about = "Browse STAC catalogs, search items and select them for download",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Override the settings file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
enum Command {
    /// List the collections of the configured APIs
    Collections {
        /// Query these APIs instead of the configured ones (repeatable)
        #[clap(long)]
        api: Vec<String>,

        /// Ignore cached catalogs and load them again
        #[clap(long)]
        refresh: bool,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Search items in one API
    Search {
        /// API URL
        #[clap(long)]
        api: String,

        #[clap(flatten)]
        query: QueryArgs,

        /// Page size
        #[clap(long)]
        limit: Option<u32>,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Run the whole browse workflow and hand the chosen items off for download
    Browse {
        #[clap(flatten)]
        query: QueryArgs,

        /// Directory the downloads are meant for
        #[clap(long)]
        download_dir: PathBuf,

        /// Keep at most this many items (0 cancels the download)
        #[clap(long, default_value = "10")]
        max_downloads: usize,
    },

    /// Manage configured APIs
    Api {
        #[clap(subcommand)]
        command: api_cli::ApiCommand,
    },

    /// Drop cached catalogs so the next run loads them again
    ClearCache,
}

/// Collections, extent and time range of a query
#[derive(clap::Args, Debug, Clone)]
pub struct QueryArgs {
    /// Collection id (repeatable); none searches every collection
    #[clap(long = "collection")]
    pub collections: Vec<String>,

    /// Bounding box: minx,miny,maxx,maxy
    #[clap(long, allow_hyphen_values = true)]
    pub bbox: Option<BboxArg>,

    /// Start of the time range (RFC 3339 or YYYY-MM-DD)
    #[clap(long, value_parser = parse_time)]
    pub start: DateTime<Utc>,

    /// End of the time range
    #[clap(long, value_parser = parse_time)]
    pub end: Option<DateTime<Utc>>,
}

impl QueryArgs {
    pub fn time_period(&self) -> TimePeriod {
        TimePeriod::new(self.start, self.end)
    }

    pub fn extent(&self) -> Option<Rectangle> {
        self.bbox.map(|b| b.0)
    }
}

fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_store(config: Option<PathBuf>) -> Result<ConfigStore> {
    match config {
        Some(path) => ConfigStore::load_from_path(path),
        None => ConfigStore::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    let store = load_store(cli.config)?;

    match cli.command {
        Command::Collections { api, refresh, json } => {
            catalog_cli::execute_collections(store, api, refresh, json).await
        }
        Command::Search {
            api,
            query,
            limit,
            json,
        } => catalog_cli::execute_search(&store, &api, &query, limit, json).await,
        Command::Browse {
            query,
            download_dir,
            max_downloads,
        } => browse::execute_browse(store, &query, download_dir, max_downloads).await,
        Command::Api { command } => api_cli::execute(store, command),
        Command::ClearCache => {
            let mut store = store;
            store.config_mut().clear_cache();
            store.save()?;
            println!("Cleared cached catalogs in {}", store.path().display());
            Ok(())
        }
    }
}
