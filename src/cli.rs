use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_LOGGING_HOST, DownloadConfig};
use crate::pull::RetryPolicy;

/// Date layout accepted on the command line.
pub const CLI_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Parser, Debug)]
#[command(name = "bunny-logpull")]
#[command(version)]
#[command(about = "Download BunnyCDN pull zone logs for one day into a local file", long_about = None)]
#[command(after_help = "Examples:\n  \
  bunny-logpull download --pull-zone-id 12345 --date 2024-03-07\n  \
  BUNNY_API_TOKEN=... bunny-logpull download --pull-zone-id 12345 --start-offset 40")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download every log batch of a day into {zone}/{date}.log
    Download(DownloadArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// API access key
    #[arg(long, env = "BUNNY_API_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Pull zone to download logs for
    #[arg(long, env = "BUNNY_PULL_ZONE_ID")]
    pub pull_zone_id: u64,

    /// Batch index to start from
    #[arg(long, env = "BUNNY_START_OFFSET", default_value_t = 0)]
    pub start_offset: u64,

    /// Log entries requested per batch
    #[arg(long, env = "BUNNY_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    /// Day to download, as YYYY-MM-DD [default: today]
    #[arg(long, env = "BUNNY_DOWNLOAD_DATE", value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Base URL of the logging API
    #[arg(long, env = "BUNNY_LOGGING_HOST", default_value = DEFAULT_LOGGING_HOST)]
    pub logging_host: String,

    /// Directory the {zone}/{date}.log tree is written under
    #[arg(long, env = "BUNNY_OUTPUT_DIR", value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Retries per batch on connection errors, timeouts, 429 and 5xx
    #[arg(long, env = "BUNNY_MAX_RETRIES", default_value_t = 0)]
    pub max_retries: u32,
}

impl DownloadArgs {
    pub fn day(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn into_config(self) -> DownloadConfig {
        let day = self.day();
        DownloadConfig {
            token: self.token,
            zone_id: self.pull_zone_id,
            day,
            start_offset: self.start_offset,
            batch_size: self.batch_size,
            logging_host: self.logging_host,
            output_root: self.output_dir,
            retry: RetryPolicy::with_max_retries(self.max_retries),
        }
    }
}

/// Parse a `YYYY-MM-DD` date. chrono accepts short years and unpadded
/// fields for this layout, so the value must format back to the input.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let date = NaiveDate::parse_from_str(s, CLI_DATE_FORMAT)
        .map_err(|e| format!("expected YYYY-MM-DD, got {:?}: {}", s, e))?;
    if date.format(CLI_DATE_FORMAT).to_string() != s {
        return Err(format!("expected YYYY-MM-DD, got {:?}", s));
    }
    Ok(date)
}
